// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Space reconciliation logic.
//!
//! A reconcile reads the Space from the cache, computes the desired dependents, and
//! converges each kind in order: Namespace, Roles, `ResourceQuota`, `LimitRange`.
//! Every kind gets a status condition; `Ready` is derived from them. Status is written
//! once at the end, and only when it changed.
//!
//! Nothing is deleted here. Dependents carry a controller owner reference to the
//! Space, so the garbage collector removes them when the Space goes away.

use super::dependents::{Dependent, DependentKind};
use super::resources::sync_dependent;
use super::status::SpaceStatusUpdater;
use crate::context::Context;
use crate::crd::{ConditionStatus, Space};
use crate::errors::{ReconcileError, SyncError};
use crate::space_resources::{compute_desired, DesiredState};
use crate::status_reasons::{REASON_NAMESPACE_NOT_READY, REASON_RECONCILED};
use k8s_openapi::api::core::v1::{LimitRange, Namespace, ResourceQuota};
use k8s_openapi::api::rbac::v1::Role;
use kube::ResourceExt;
use tracing::{debug, info, warn};

/// Outcome of a reconcile that did not need a backoff retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileResult {
    /// Every dependent converged, or the Space no longer exists.
    Synced,
    /// A failure that retrying will not fix was reported on the status.
    Stalled,
}

/// Reconcile the Space named `name`.
///
/// A Space that is missing from the cache or being deleted is a no-op.
///
/// # Errors
///
/// Returns an error when a dependent failed with a transient API error, or when the
/// status write failed. The caller requeues the Space with backoff.
pub async fn reconcile_space(ctx: &Context, name: &str) -> Result<ReconcileResult, ReconcileError> {
    let Some(space) = ctx.stores.get_space(name) else {
        debug!(space = %name, "Space not found in cache, nothing to reconcile");
        return Ok(ReconcileResult::Synced);
    };
    if space.metadata.deletion_timestamp.is_some() {
        debug!(space = %name, "Space is being deleted, leaving cleanup to garbage collection");
        return Ok(ReconcileResult::Synced);
    }

    info!("Reconciling Space: {}", name);
    debug!(
        space = %name,
        generation = ?space.metadata.generation,
        resource_version = ?space.resource_version(),
        "Starting Space reconciliation"
    );

    let mut updater = SpaceStatusUpdater::new(&space);
    updater.set_observed_generation(space.metadata.generation);

    let mut failures = match compute_desired(&space) {
        Ok(desired) => {
            updater.set_domains(desired.domains.clone());
            sync_dependents(ctx, &space, &desired, &mut updater).await
        }
        Err(err) => {
            warn!(space = %name, error = %err, "Space cannot be projected into dependents");
            let message = err.to_string();
            for kind in DependentKind::ALL {
                updater.set_condition(
                    kind.condition_type(),
                    ConditionStatus::False,
                    err.reason(),
                    &message,
                );
            }
            vec![err]
        }
    };

    updater.aggregate_ready();
    updater
        .apply(ctx.client.as_ref())
        .await
        .map_err(|source| ReconcileError::Status {
            name: name.to_string(),
            source,
        })?;

    if let Some(pos) = failures.iter().position(SyncError::is_retryable) {
        return Err(failures.swap_remove(pos).into());
    }
    if failures.is_empty() {
        info!("Space {} reconciled", name);
        Ok(ReconcileResult::Synced)
    } else {
        warn!(
            space = %name,
            failures = failures.len(),
            "Space has failures that need a spec or cluster change"
        );
        Ok(ReconcileResult::Stalled)
    }
}

/// Converge every dependent kind in order and record a condition for each.
///
/// Returns the failures. Kinds after a failed Namespace are skipped and reported as
/// `Unknown`, since they would be created inside it.
async fn sync_dependents(
    ctx: &Context,
    space: &Space,
    desired: &DesiredState,
    updater: &mut SpaceStatusUpdater,
) -> Vec<SyncError> {
    let space_name = space.name_any();
    let space_uid = space.uid().unwrap_or_default();
    let mut failures = Vec::new();
    let mut namespace_ready = true;

    for kind in DependentKind::ALL {
        if !namespace_ready {
            updater.set_condition(
                kind.condition_type(),
                ConditionStatus::Unknown,
                REASON_NAMESPACE_NOT_READY,
                &format!("waiting for Namespace {space_name}"),
            );
            continue;
        }

        let result = match kind {
            DependentKind::Namespace => {
                sync_kind::<Namespace>(ctx, &space_name, &space_uid, desired).await
            }
            DependentKind::Role => sync_kind::<Role>(ctx, &space_name, &space_uid, desired).await,
            DependentKind::ResourceQuota => {
                sync_kind::<ResourceQuota>(ctx, &space_name, &space_uid, desired).await
            }
            DependentKind::LimitRange => {
                sync_kind::<LimitRange>(ctx, &space_name, &space_uid, desired).await
            }
        };

        match result {
            Ok(()) => updater.set_condition(
                kind.condition_type(),
                ConditionStatus::True,
                REASON_RECONCILED,
                "",
            ),
            Err(err) => {
                warn!(
                    space = %space_name,
                    kind = kind.kind(),
                    retryable = err.is_retryable(),
                    error = %err,
                    "Failed to reconcile dependent"
                );
                updater.set_condition(
                    kind.condition_type(),
                    ConditionStatus::False,
                    err.reason(),
                    &err.to_string(),
                );
                if kind == DependentKind::Namespace {
                    namespace_ready = false;
                }
                failures.push(err);
            }
        }
    }

    failures
}

/// Sync every desired object of one kind. All objects are attempted; the first
/// failure is returned.
async fn sync_kind<D: Dependent>(
    ctx: &Context,
    space_name: &str,
    space_uid: &str,
    desired: &DesiredState,
) -> Result<(), SyncError> {
    let mut first_error = None;
    for obj in D::desired(desired) {
        if let Err(err) =
            sync_dependent(ctx.client.as_ref(), &ctx.stores, space_name, space_uid, &obj).await
        {
            if first_error.is_none() {
                first_error = Some(err);
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}

#[cfg(test)]
#[path = "space_tests.rs"]
mod space_tests;
