// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generic create-or-replace synchronisation of a single dependent.
//!
//! [`sync_dependent`] converges one live object onto its desired form:
//!
//! - **Missing** from the cache: create it. A create that collides with an object the
//!   cache has not seen yet (`AlreadyExists`) falls back to an uncached read and the
//!   update path.
//! - **Present but controlled by someone else**: report an ownership conflict and
//!   leave it untouched.
//! - **Present and drifted**: replace it, starting from the live object so fields the
//!   controller does not own survive, and carrying the observed `resourceVersion`.
//! - **Present and matching**: nothing is written.
//!
//! Labels are a subset check: desired labels must be present with the desired values,
//! extra labels on the live object are preserved.

use super::dependents::Dependent;
use crate::cache::Stores;
use crate::cluster::ClusterClient;
use crate::errors::{is_already_exists, SyncError};
use crate::metrics;
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// What [`sync_dependent`] did to the live object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncAction {
    Created,
    Updated,
    Unchanged,
}

/// Converge the live object named by `desired` onto `desired`.
///
/// # Errors
///
/// - [`SyncError::OwnershipConflict`] when the live object's controller is not the
///   Space with `space_uid`.
/// - [`SyncError::Api`] when an API call fails.
pub async fn sync_dependent<D: Dependent>(
    client: &dyn ClusterClient,
    stores: &Stores,
    space_name: &str,
    space_uid: &str,
    desired: &D,
) -> Result<SyncAction, SyncError> {
    let name = desired.name_any();
    let namespace = desired.namespace();

    let live = match D::cached(stores, namespace.as_deref(), &name) {
        Some(live) => (*live).clone(),
        None => match D::create(client, desired).await {
            Ok(_) => {
                info!(kind = D::KIND, name = %name, space = %space_name, "Created dependent");
                metrics::record_dependent_created(D::KIND);
                return Ok(SyncAction::Created);
            }
            Err(e) if is_already_exists(&e) => {
                debug!(
                    kind = D::KIND,
                    name = %name,
                    "Dependent already exists but is not cached yet, reading it"
                );
                D::get(client, namespace.as_deref(), &name)
                    .await
                    .map_err(|source| api_error::<D>(&name, "get", source))?
            }
            Err(source) => return Err(api_error::<D>(&name, "create", source)),
        },
    };

    if !is_controlled_by(&live, space_uid) {
        metrics::record_dependent_error(D::KIND, "OwnershipConflict");
        return Err(SyncError::OwnershipConflict {
            kind: D::KIND,
            name,
            space: space_name.to_string(),
        });
    }

    if !needs_update(desired, &live) {
        debug!(kind = D::KIND, name = %name, "Dependent up to date");
        return Ok(SyncAction::Unchanged);
    }

    let updated = merge_for_update(desired, live);
    D::replace(client, &updated)
        .await
        .map_err(|source| api_error::<D>(&name, "update", source))?;

    info!(kind = D::KIND, name = %name, space = %space_name, "Updated dependent");
    metrics::record_dependent_updated(D::KIND);
    Ok(SyncAction::Updated)
}

fn api_error<D: Dependent>(name: &str, operation: &'static str, source: kube::Error) -> SyncError {
    metrics::record_dependent_error(D::KIND, "ApiError");
    SyncError::Api {
        kind: D::KIND,
        name: name.to_string(),
        operation,
        source,
    }
}

/// Whether the object's controller owner reference points at the Space with `uid`.
#[must_use]
pub fn is_controlled_by<K: ResourceExt>(obj: &K, uid: &str) -> bool {
    obj.owner_references()
        .iter()
        .any(|o| o.controller == Some(true) && o.uid == uid)
}

/// Whether `live` has drifted from `desired` in any field the controller owns.
#[must_use]
pub fn needs_update<D: Dependent>(desired: &D, live: &D) -> bool {
    !labels_subset(desired.labels(), live.labels()) || D::fields_differ(desired, live)
}

fn labels_subset(desired: &BTreeMap<String, String>, live: &BTreeMap<String, String>) -> bool {
    desired.iter().all(|(k, v)| live.get(k) == Some(v))
}

/// Build the object to send on replace: the live object, including its
/// `resourceVersion`, with the desired labels overlaid and the owned fields copied.
#[must_use]
pub fn merge_for_update<D: Dependent>(desired: &D, mut live: D) -> D {
    let labels = live.labels_mut();
    for (k, v) in desired.labels() {
        labels.insert(k.clone(), v.clone());
    }
    D::copy_fields(desired, &mut live);
    live
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod resources_tests;
