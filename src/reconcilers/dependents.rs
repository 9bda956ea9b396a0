// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-kind behaviour of the resources a Space owns.
//!
//! Every dependent kind implements [`Dependent`], which tells the generic synchroniser
//! in [`super::resources`] where to find the desired objects, how to read the live
//! object from the cache, how to write it, and which fields the controller owns.
//!
//! Only owned fields are compared. Fields the API server or other controllers fill in
//! (namespace finalizers, quota status, extra labels and annotations) are left alone.

use crate::cache::Stores;
use crate::cluster::ClusterClient;
use crate::constants::{KIND_LIMIT_RANGE, KIND_NAMESPACE, KIND_RESOURCE_QUOTA, KIND_ROLE};
use crate::quantity::optional_resource_lists_equal;
use crate::space_resources::DesiredState;
use crate::status_reasons::{
    CONDITION_LIMIT_RANGE_READY, CONDITION_NAMESPACE_READY, CONDITION_RESOURCE_QUOTA_READY,
    CONDITION_ROLE_READY,
};
use k8s_openapi::api::core::v1::{LimitRange, LimitRangeItem, Namespace, ResourceQuota};
use k8s_openapi::api::rbac::v1::Role;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::Resource;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

/// A resource kind the controller creates on behalf of a Space.
pub trait Dependent: Resource<DynamicType = ()> + Clone + Debug + Send + Sync + 'static {
    /// Kind name used in logs, metrics and status messages
    const KIND: &'static str;

    /// The desired objects of this kind.
    fn desired(state: &DesiredState) -> Vec<Self>;

    /// The cached live object, if the watch has seen one.
    fn cached(stores: &Stores, namespace: Option<&str>, name: &str) -> Option<Arc<Self>>;

    /// Uncached read, used after a create collides with an object the cache has not
    /// caught up with yet.
    fn get<'a>(
        client: &'a dyn ClusterClient,
        namespace: Option<&'a str>,
        name: &'a str,
    ) -> impl Future<Output = Result<Self, kube::Error>> + Send + 'a;

    fn create<'a>(
        client: &'a dyn ClusterClient,
        obj: &'a Self,
    ) -> impl Future<Output = Result<Self, kube::Error>> + Send + 'a;

    fn replace<'a>(
        client: &'a dyn ClusterClient,
        obj: &'a Self,
    ) -> impl Future<Output = Result<Self, kube::Error>> + Send + 'a;

    /// Whether the owned non-metadata fields of `live` differ from `desired`.
    fn fields_differ(desired: &Self, live: &Self) -> bool;

    /// Copy the owned non-metadata fields of `desired` onto `live`.
    fn copy_fields(desired: &Self, live: &mut Self);
}

/// Dependent kinds in the order they are reconciled and reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DependentKind {
    Namespace,
    Role,
    ResourceQuota,
    LimitRange,
}

impl DependentKind {
    pub const ALL: [Self; 4] = [
        Self::Namespace,
        Self::Role,
        Self::ResourceQuota,
        Self::LimitRange,
    ];

    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            Self::Namespace => KIND_NAMESPACE,
            Self::Role => KIND_ROLE,
            Self::ResourceQuota => KIND_RESOURCE_QUOTA,
            Self::LimitRange => KIND_LIMIT_RANGE,
        }
    }

    /// Status condition reporting this kind.
    #[must_use]
    pub fn condition_type(self) -> &'static str {
        match self {
            Self::Namespace => CONDITION_NAMESPACE_READY,
            Self::Role => CONDITION_ROLE_READY,
            Self::ResourceQuota => CONDITION_RESOURCE_QUOTA_READY,
            Self::LimitRange => CONDITION_LIMIT_RANGE_READY,
        }
    }
}

impl Dependent for Namespace {
    const KIND: &'static str = KIND_NAMESPACE;

    fn desired(state: &DesiredState) -> Vec<Self> {
        vec![state.namespace.clone()]
    }

    fn cached(stores: &Stores, _namespace: Option<&str>, name: &str) -> Option<Arc<Self>> {
        stores.get_namespace(name)
    }

    fn get<'a>(
        client: &'a dyn ClusterClient,
        _namespace: Option<&'a str>,
        name: &'a str,
    ) -> impl Future<Output = Result<Self, kube::Error>> + Send + 'a {
        client.get_namespace(name)
    }

    fn create<'a>(
        client: &'a dyn ClusterClient,
        obj: &'a Self,
    ) -> impl Future<Output = Result<Self, kube::Error>> + Send + 'a {
        client.create_namespace(obj)
    }

    fn replace<'a>(
        client: &'a dyn ClusterClient,
        obj: &'a Self,
    ) -> impl Future<Output = Result<Self, kube::Error>> + Send + 'a {
        client.replace_namespace(obj)
    }

    // Only labels and owner references are owned on a Namespace
    fn fields_differ(_desired: &Self, _live: &Self) -> bool {
        false
    }

    fn copy_fields(_desired: &Self, _live: &mut Self) {}
}

impl Dependent for Role {
    const KIND: &'static str = KIND_ROLE;

    fn desired(state: &DesiredState) -> Vec<Self> {
        state.roles.clone()
    }

    fn cached(stores: &Stores, namespace: Option<&str>, name: &str) -> Option<Arc<Self>> {
        stores.get_role(namespace.unwrap_or_default(), name)
    }

    fn get<'a>(
        client: &'a dyn ClusterClient,
        namespace: Option<&'a str>,
        name: &'a str,
    ) -> impl Future<Output = Result<Self, kube::Error>> + Send + 'a {
        client.get_role(namespace.unwrap_or_default(), name)
    }

    fn create<'a>(
        client: &'a dyn ClusterClient,
        obj: &'a Self,
    ) -> impl Future<Output = Result<Self, kube::Error>> + Send + 'a {
        client.create_role(obj)
    }

    fn replace<'a>(
        client: &'a dyn ClusterClient,
        obj: &'a Self,
    ) -> impl Future<Output = Result<Self, kube::Error>> + Send + 'a {
        client.replace_role(obj)
    }

    fn fields_differ(desired: &Self, live: &Self) -> bool {
        desired.rules.as_deref().unwrap_or_default() != live.rules.as_deref().unwrap_or_default()
    }

    fn copy_fields(desired: &Self, live: &mut Self) {
        live.rules.clone_from(&desired.rules);
    }
}

impl Dependent for ResourceQuota {
    const KIND: &'static str = KIND_RESOURCE_QUOTA;

    fn desired(state: &DesiredState) -> Vec<Self> {
        vec![state.resource_quota.clone()]
    }

    fn cached(stores: &Stores, namespace: Option<&str>, name: &str) -> Option<Arc<Self>> {
        stores.get_resource_quota(namespace.unwrap_or_default(), name)
    }

    fn get<'a>(
        client: &'a dyn ClusterClient,
        namespace: Option<&'a str>,
        name: &'a str,
    ) -> impl Future<Output = Result<Self, kube::Error>> + Send + 'a {
        client.get_resource_quota(namespace.unwrap_or_default(), name)
    }

    fn create<'a>(
        client: &'a dyn ClusterClient,
        obj: &'a Self,
    ) -> impl Future<Output = Result<Self, kube::Error>> + Send + 'a {
        client.create_resource_quota(obj)
    }

    fn replace<'a>(
        client: &'a dyn ClusterClient,
        obj: &'a Self,
    ) -> impl Future<Output = Result<Self, kube::Error>> + Send + 'a {
        client.replace_resource_quota(obj)
    }

    fn fields_differ(desired: &Self, live: &Self) -> bool {
        !optional_resource_lists_equal(quota_hard(desired), quota_hard(live))
    }

    fn copy_fields(desired: &Self, live: &mut Self) {
        live.spec.clone_from(&desired.spec);
    }
}

fn quota_hard(quota: &ResourceQuota) -> Option<&BTreeMap<String, Quantity>> {
    quota.spec.as_ref().and_then(|s| s.hard.as_ref())
}

impl Dependent for LimitRange {
    const KIND: &'static str = KIND_LIMIT_RANGE;

    fn desired(state: &DesiredState) -> Vec<Self> {
        vec![state.limit_range.clone()]
    }

    fn cached(stores: &Stores, namespace: Option<&str>, name: &str) -> Option<Arc<Self>> {
        stores.get_limit_range(namespace.unwrap_or_default(), name)
    }

    fn get<'a>(
        client: &'a dyn ClusterClient,
        namespace: Option<&'a str>,
        name: &'a str,
    ) -> impl Future<Output = Result<Self, kube::Error>> + Send + 'a {
        client.get_limit_range(namespace.unwrap_or_default(), name)
    }

    fn create<'a>(
        client: &'a dyn ClusterClient,
        obj: &'a Self,
    ) -> impl Future<Output = Result<Self, kube::Error>> + Send + 'a {
        client.create_limit_range(obj)
    }

    fn replace<'a>(
        client: &'a dyn ClusterClient,
        obj: &'a Self,
    ) -> impl Future<Output = Result<Self, kube::Error>> + Send + 'a {
        client.replace_limit_range(obj)
    }

    fn fields_differ(desired: &Self, live: &Self) -> bool {
        let limits = |l: &Self| l.spec.as_ref().map(|s| s.limits.clone()).unwrap_or_default();
        let (desired, live) = (limits(desired), limits(live));
        desired.len() != live.len()
            || desired
                .iter()
                .zip(&live)
                .any(|(d, l)| !limit_items_equal(d, l))
    }

    fn copy_fields(desired: &Self, live: &mut Self) {
        live.spec.clone_from(&desired.spec);
    }
}

fn limit_items_equal(a: &LimitRangeItem, b: &LimitRangeItem) -> bool {
    a.type_ == b.type_
        && optional_resource_lists_equal(a.default.as_ref(), b.default.as_ref())
        && optional_resource_lists_equal(a.default_request.as_ref(), b.default_request.as_ref())
        && optional_resource_lists_equal(a.max.as_ref(), b.max.as_ref())
        && optional_resource_lists_equal(a.min.as_ref(), b.min.as_ref())
        && optional_resource_lists_equal(
            a.max_limit_request_ratio.as_ref(),
            b.max_limit_request_ratio.as_ref(),
        )
}

#[cfg(test)]
#[path = "dependents_tests.rs"]
mod dependents_tests;
