// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Watch-fed, read-only cache of Spaces and their dependents.
//!
//! The Space store belongs to the [`kube::runtime::Controller`] and is filled by its
//! main watch. Each dependent kind has its own reflector [`Store`] filled by a watch
//! task in [`crate::controller`]. Stores are cheap to clone and safe to read from
//! every reconcile at once. Writes never go through the cache; reconciles write
//! through [`crate::cluster::ClusterClient`] and pick up the result from the next
//! watch event.

use crate::crd::Space;
use k8s_openapi::api::core::v1::{LimitRange, Namespace, ResourceQuota};
use k8s_openapi::api::rbac::v1::Role;
use kube::runtime::reflector::{self, ObjectRef, Store};
use kube::ResourceExt;
use std::sync::Arc;

/// Read handles for every cached kind.
#[derive(Clone)]
pub struct Stores {
    // Cluster-scoped resources
    pub spaces: Store<Space>,
    pub namespaces: Store<Namespace>,

    // Namespace-scoped resources
    pub roles: Store<Role>,
    pub resource_quotas: Store<ResourceQuota>,
    pub limit_ranges: Store<LimitRange>,
}

/// Write handles feeding the dependent stores. Consumed by the watch tasks.
pub struct DependentWriters {
    pub namespaces: reflector::store::Writer<Namespace>,
    pub roles: reflector::store::Writer<Role>,
    pub resource_quotas: reflector::store::Writer<ResourceQuota>,
    pub limit_ranges: reflector::store::Writer<LimitRange>,
}

/// Create empty dependent stores next to an existing Space store, and the writers
/// that fill them.
#[must_use]
pub fn new_cache(spaces: Store<Space>) -> (Stores, DependentWriters) {
    let (namespaces, namespaces_writer) = reflector::store();
    let (roles, roles_writer) = reflector::store();
    let (resource_quotas, resource_quotas_writer) = reflector::store();
    let (limit_ranges, limit_ranges_writer) = reflector::store();

    (
        Stores {
            spaces,
            namespaces,
            roles,
            resource_quotas,
            limit_ranges,
        },
        DependentWriters {
            namespaces: namespaces_writer,
            roles: roles_writer,
            resource_quotas: resource_quotas_writer,
            limit_ranges: limit_ranges_writer,
        },
    )
}

impl Stores {
    #[must_use]
    pub fn get_space(&self, name: &str) -> Option<Arc<Space>> {
        self.spaces.get(&ObjectRef::new(name))
    }

    #[must_use]
    pub fn get_namespace(&self, name: &str) -> Option<Arc<Namespace>> {
        self.namespaces.get(&ObjectRef::new(name))
    }

    #[must_use]
    pub fn get_role(&self, namespace: &str, name: &str) -> Option<Arc<Role>> {
        self.roles.get(&ObjectRef::new(name).within(namespace))
    }

    #[must_use]
    pub fn get_resource_quota(&self, namespace: &str, name: &str) -> Option<Arc<ResourceQuota>> {
        self.resource_quotas
            .get(&ObjectRef::new(name).within(namespace))
    }

    #[must_use]
    pub fn get_limit_range(&self, namespace: &str, name: &str) -> Option<Arc<LimitRange>> {
        self.limit_ranges
            .get(&ObjectRef::new(name).within(namespace))
    }

    /// Names of every cached Space.
    #[must_use]
    pub fn space_names(&self) -> Vec<String> {
        self.spaces.state().iter().map(|s| s.name_any()).collect()
    }

    /// Wait until every dependent store has completed its initial list.
    ///
    /// # Errors
    ///
    /// Returns an error if a writer was dropped before its store became ready.
    pub async fn wait_for_dependents(&self) -> anyhow::Result<()> {
        futures::try_join!(
            self.namespaces.wait_until_ready(),
            self.roles.wait_until_ready(),
            self.resource_quotas.wait_until_ready(),
            self.limit_ranges.wait_until_ready(),
        )
        .map_err(|e| anyhow::anyhow!("cache writer dropped before initial sync: {e}"))?;
        Ok(())
    }

    /// Wait until every store, Spaces included, has completed its initial list.
    ///
    /// # Errors
    ///
    /// Returns an error if a writer was dropped before its store became ready.
    pub async fn wait_until_ready(&self) -> anyhow::Result<()> {
        self.wait_for_dependents().await?;
        self.spaces
            .wait_until_ready()
            .await
            .map_err(|e| anyhow::anyhow!("Space cache dropped before initial sync: {e}"))?;
        Ok(())
    }
}
