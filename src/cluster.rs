// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Outbound Kubernetes operations used by the reconcile loop.
//!
//! [`ClusterClient`] is the only path through which the controller mutates the
//! cluster. Dependents are written with plain create and full replace; a replace
//! carries the `resourceVersion` that was observed, so the API server rejects it with
//! 409 if the object changed underneath. Space status is written through the status
//! subresource only.
//!
//! [`KubeClusterClient`] is the production implementation backed by [`kube::Client`].
//! Tests substitute the `mockall`-generated `MockClusterClient` or the in-memory fake
//! cluster in `test_utils`.

use crate::constants::FIELD_MANAGER;
use crate::crd::{Space, SpaceStatus};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{LimitRange, Namespace, ResourceQuota};
use k8s_openapi::api::rbac::v1::Role;
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Trait abstracting the cluster writes (and uncached reads) the controller performs.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn get_namespace(&self, name: &str) -> Result<Namespace, kube::Error>;
    async fn create_namespace(&self, namespace: &Namespace) -> Result<Namespace, kube::Error>;
    async fn replace_namespace(&self, namespace: &Namespace) -> Result<Namespace, kube::Error>;

    async fn get_role(&self, namespace: &str, name: &str) -> Result<Role, kube::Error>;
    async fn create_role(&self, role: &Role) -> Result<Role, kube::Error>;
    async fn replace_role(&self, role: &Role) -> Result<Role, kube::Error>;

    async fn get_resource_quota(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ResourceQuota, kube::Error>;
    async fn create_resource_quota(
        &self,
        quota: &ResourceQuota,
    ) -> Result<ResourceQuota, kube::Error>;
    async fn replace_resource_quota(
        &self,
        quota: &ResourceQuota,
    ) -> Result<ResourceQuota, kube::Error>;

    async fn get_limit_range(&self, namespace: &str, name: &str)
        -> Result<LimitRange, kube::Error>;
    async fn create_limit_range(&self, limits: &LimitRange) -> Result<LimitRange, kube::Error>;
    async fn replace_limit_range(&self, limits: &LimitRange) -> Result<LimitRange, kube::Error>;

    /// Write `status` to the Space status subresource.
    ///
    /// When `resource_version` is set the patch is rejected with 409 if the Space has
    /// moved on since it was read.
    async fn patch_space_status(
        &self,
        name: &str,
        resource_version: Option<String>,
        status: &SpaceStatus,
    ) -> Result<Space, kube::Error>;
}

/// [`ClusterClient`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespaced<K>(&self, namespace: &str) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Namespace of a namespaced dependent. Desired objects always carry one.
fn namespace_of<K: ResourceExt>(obj: &K) -> String {
    obj.namespace().unwrap_or_default()
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get_namespace(&self, name: &str) -> Result<Namespace, kube::Error> {
        Api::<Namespace>::all(self.client.clone()).get(name).await
    }

    async fn create_namespace(&self, namespace: &Namespace) -> Result<Namespace, kube::Error> {
        Api::<Namespace>::all(self.client.clone())
            .create(&PostParams::default(), namespace)
            .await
    }

    async fn replace_namespace(&self, namespace: &Namespace) -> Result<Namespace, kube::Error> {
        Api::<Namespace>::all(self.client.clone())
            .replace(&namespace.name_any(), &PostParams::default(), namespace)
            .await
    }

    async fn get_role(&self, namespace: &str, name: &str) -> Result<Role, kube::Error> {
        self.namespaced::<Role>(namespace).get(name).await
    }

    async fn create_role(&self, role: &Role) -> Result<Role, kube::Error> {
        self.namespaced::<Role>(&namespace_of(role))
            .create(&PostParams::default(), role)
            .await
    }

    async fn replace_role(&self, role: &Role) -> Result<Role, kube::Error> {
        self.namespaced::<Role>(&namespace_of(role))
            .replace(&role.name_any(), &PostParams::default(), role)
            .await
    }

    async fn get_resource_quota(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ResourceQuota, kube::Error> {
        self.namespaced::<ResourceQuota>(namespace).get(name).await
    }

    async fn create_resource_quota(
        &self,
        quota: &ResourceQuota,
    ) -> Result<ResourceQuota, kube::Error> {
        self.namespaced::<ResourceQuota>(&namespace_of(quota))
            .create(&PostParams::default(), quota)
            .await
    }

    async fn replace_resource_quota(
        &self,
        quota: &ResourceQuota,
    ) -> Result<ResourceQuota, kube::Error> {
        self.namespaced::<ResourceQuota>(&namespace_of(quota))
            .replace(&quota.name_any(), &PostParams::default(), quota)
            .await
    }

    async fn get_limit_range(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<LimitRange, kube::Error> {
        self.namespaced::<LimitRange>(namespace).get(name).await
    }

    async fn create_limit_range(&self, limits: &LimitRange) -> Result<LimitRange, kube::Error> {
        self.namespaced::<LimitRange>(&namespace_of(limits))
            .create(&PostParams::default(), limits)
            .await
    }

    async fn replace_limit_range(&self, limits: &LimitRange) -> Result<LimitRange, kube::Error> {
        self.namespaced::<LimitRange>(&namespace_of(limits))
            .replace(&limits.name_any(), &PostParams::default(), limits)
            .await
    }

    async fn patch_space_status(
        &self,
        name: &str,
        resource_version: Option<String>,
        status: &SpaceStatus,
    ) -> Result<Space, kube::Error> {
        let api: Api<Space> = Api::all(self.client.clone());

        let mut patch = json!({
            "status": status
        });
        if let Some(resource_version) = resource_version {
            patch["metadata"] = json!({ "resourceVersion": resource_version });
        }

        let updated = api
            .patch_status(
                name,
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(&patch),
            )
            .await?;

        debug!(
            space = %name,
            conditions = status.conditions.len(),
            "Updated Space status"
        );
        Ok(updated)
    }
}
