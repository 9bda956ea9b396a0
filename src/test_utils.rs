// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory cluster used by reconcile tests.
//!
//! [`FakeCluster`] implements [`ClusterClient`] against maps of objects, hands out
//! increasing `resourceVersion`s, rejects stale replaces with 409, and mirrors every
//! write into the reflector stores the way the watch would. Tests can inject API
//! failures per operation and kind, and inspect the writes that were issued.

use crate::cache::{new_cache, DependentWriters, Stores};
use crate::cluster::ClusterClient;
use crate::constants::{
    KIND_LIMIT_RANGE, KIND_NAMESPACE, KIND_RESOURCE_QUOTA, KIND_ROLE, KIND_SPACE,
};
use crate::crd::{Space, SpaceStatus};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{LimitRange, Namespace, ResourceQuota};
use k8s_openapi::api::rbac::v1::Role;
use kube::core::Status;
use kube::runtime::reflector::{self, store::Writer};
use kube::runtime::watcher;
use kube::{Resource, ResourceExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Build an API error the way the API server reports it.
pub fn api_error(code: u16, reason: &str) -> kube::Error {
    kube::Error::Api(
        Status::failure(&format!("injected {reason}"), reason)
            .with_code(code)
            .boxed(),
    )
}

pub struct Objects<K> {
    items: BTreeMap<String, K>,
}

impl<K> Default for Objects<K> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

pub struct FakeState {
    space_writer: Writer<Space>,
    writers: DependentWriters,
    spaces: Objects<Space>,
    namespaces: Objects<Namespace>,
    roles: Objects<Role>,
    resource_quotas: Objects<ResourceQuota>,
    limit_ranges: Objects<LimitRange>,
    next_resource_version: u64,
    writes: Vec<String>,
    failures: HashMap<(String, String), (u16, String)>,
}

impl FakeState {
    fn bump(&mut self) -> String {
        self.next_resource_version += 1;
        self.next_resource_version.to_string()
    }

    fn check_failure(&self, operation: &str, kind: &str) -> Result<(), kube::Error> {
        match self
            .failures
            .get(&(operation.to_string(), kind.to_string()))
        {
            Some((code, reason)) => Err(api_error(*code, reason)),
            None => Ok(()),
        }
    }
}

/// Per-kind access to the fake's object map and cache writer.
pub trait FakeKind: Resource<DynamicType = ()> + Clone + Send + Sync + 'static {
    const KIND: &'static str;
    fn slot(state: &mut FakeState) -> (&mut Objects<Self>, &mut Writer<Self>);
}

impl FakeKind for Space {
    const KIND: &'static str = KIND_SPACE;
    fn slot(state: &mut FakeState) -> (&mut Objects<Self>, &mut Writer<Self>) {
        (&mut state.spaces, &mut state.space_writer)
    }
}

impl FakeKind for Namespace {
    const KIND: &'static str = KIND_NAMESPACE;
    fn slot(state: &mut FakeState) -> (&mut Objects<Self>, &mut Writer<Self>) {
        (&mut state.namespaces, &mut state.writers.namespaces)
    }
}

impl FakeKind for Role {
    const KIND: &'static str = KIND_ROLE;
    fn slot(state: &mut FakeState) -> (&mut Objects<Self>, &mut Writer<Self>) {
        (&mut state.roles, &mut state.writers.roles)
    }
}

impl FakeKind for ResourceQuota {
    const KIND: &'static str = KIND_RESOURCE_QUOTA;
    fn slot(state: &mut FakeState) -> (&mut Objects<Self>, &mut Writer<Self>) {
        (&mut state.resource_quotas, &mut state.writers.resource_quotas)
    }
}

impl FakeKind for LimitRange {
    const KIND: &'static str = KIND_LIMIT_RANGE;
    fn slot(state: &mut FakeState) -> (&mut Objects<Self>, &mut Writer<Self>) {
        (&mut state.limit_ranges, &mut state.writers.limit_ranges)
    }
}

fn object_key(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{ns}/{name}"),
        None => name.to_string(),
    }
}

/// Stateful in-memory [`ClusterClient`].
pub struct FakeCluster {
    state: Mutex<FakeState>,
}

impl FakeCluster {
    /// Create an empty cluster and the stores it keeps in sync.
    pub fn new() -> (Arc<Self>, Stores) {
        let (spaces, space_writer) = reflector::store();
        let (stores, writers) = new_cache(spaces);
        let state = FakeState {
            space_writer,
            writers,
            spaces: Objects::default(),
            namespaces: Objects::default(),
            roles: Objects::default(),
            resource_quotas: Objects::default(),
            limit_ranges: Objects::default(),
            next_resource_version: 0,
            writes: Vec::new(),
            failures: HashMap::new(),
        };
        (
            Arc::new(Self {
                state: Mutex::new(state),
            }),
            stores,
        )
    }

    /// Store an object as if another actor had created it, visible in the cache.
    pub fn seed<K: FakeKind>(&self, obj: K) {
        let mut state = self.state.lock().unwrap();
        store(&mut state, obj, true);
    }

    /// Store an object the cache has not observed yet.
    pub fn seed_uncached<K: FakeKind>(&self, obj: K) {
        let mut state = self.state.lock().unwrap();
        store(&mut state, obj, false);
    }

    /// Fail every `operation` ("get", "create", "replace", "patch_status") on `kind`.
    pub fn fail(&self, operation: &str, kind: &str, code: u16, reason: &str) {
        self.state.lock().unwrap().failures.insert(
            (operation.to_string(), kind.to_string()),
            (code, reason.to_string()),
        );
    }

    pub fn clear_failures(&self) {
        self.state.lock().unwrap().failures.clear();
    }

    /// Writes issued so far, as "operation Kind key".
    pub fn writes(&self) -> Vec<String> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state.lock().unwrap().writes.clear();
    }

    /// Server-side copy of a Space.
    pub fn space(&self, name: &str) -> Option<Space> {
        self.state.lock().unwrap().spaces.items.get(name).cloned()
    }

    /// Server-side copy of any stored object.
    pub fn object<K: FakeKind>(&self, namespace: Option<&str>, name: &str) -> Option<K> {
        let mut state = self.state.lock().unwrap();
        K::slot(&mut state)
            .0
            .items
            .get(&object_key(namespace, name))
            .cloned()
    }

    fn get<K: FakeKind>(&self, namespace: Option<&str>, name: &str) -> Result<K, kube::Error> {
        let mut state = self.state.lock().unwrap();
        state.check_failure("get", K::KIND)?;
        K::slot(&mut state)
            .0
            .items
            .get(&object_key(namespace, name))
            .cloned()
            .ok_or_else(|| api_error(404, "NotFound"))
    }

    fn create<K: FakeKind>(&self, obj: &K) -> Result<K, kube::Error> {
        let mut state = self.state.lock().unwrap();
        state.check_failure("create", K::KIND)?;
        let key = object_key(obj.namespace().as_deref(), &obj.name_any());
        if K::slot(&mut state).0.items.contains_key(&key) {
            return Err(api_error(409, "AlreadyExists"));
        }
        state.writes.push(format!("create {} {key}", K::KIND));
        Ok(store(&mut state, obj.clone(), true))
    }

    fn replace<K: FakeKind>(&self, obj: &K) -> Result<K, kube::Error> {
        let mut state = self.state.lock().unwrap();
        state.check_failure("replace", K::KIND)?;
        let key = object_key(obj.namespace().as_deref(), &obj.name_any());
        let current = K::slot(&mut state)
            .0
            .items
            .get(&key)
            .map(ResourceExt::resource_version)
            .ok_or_else(|| api_error(404, "NotFound"))?;
        if obj.resource_version().is_some() && obj.resource_version() != current {
            return Err(api_error(409, "Conflict"));
        }
        state.writes.push(format!("replace {} {key}", K::KIND));
        Ok(store(&mut state, obj.clone(), true))
    }
}

fn store<K: FakeKind>(state: &mut FakeState, mut obj: K, cached: bool) -> K {
    let resource_version = state.bump();
    obj.meta_mut().resource_version = Some(resource_version);
    if obj.meta().uid.is_none() {
        obj.meta_mut().uid = Some(format!("uid-{}", obj.name_any()));
    }
    let key = object_key(obj.namespace().as_deref(), &obj.name_any());
    let (objects, writer) = K::slot(state);
    objects.items.insert(key, obj.clone());
    if cached {
        writer.apply_watcher_event(&watcher::Event::Apply(obj.clone()));
    }
    obj
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn get_namespace(&self, name: &str) -> Result<Namespace, kube::Error> {
        self.get(None, name)
    }

    async fn create_namespace(&self, namespace: &Namespace) -> Result<Namespace, kube::Error> {
        self.create(namespace)
    }

    async fn replace_namespace(&self, namespace: &Namespace) -> Result<Namespace, kube::Error> {
        self.replace(namespace)
    }

    async fn get_role(&self, namespace: &str, name: &str) -> Result<Role, kube::Error> {
        self.get(Some(namespace), name)
    }

    async fn create_role(&self, role: &Role) -> Result<Role, kube::Error> {
        self.create(role)
    }

    async fn replace_role(&self, role: &Role) -> Result<Role, kube::Error> {
        self.replace(role)
    }

    async fn get_resource_quota(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ResourceQuota, kube::Error> {
        self.get(Some(namespace), name)
    }

    async fn create_resource_quota(
        &self,
        quota: &ResourceQuota,
    ) -> Result<ResourceQuota, kube::Error> {
        self.create(quota)
    }

    async fn replace_resource_quota(
        &self,
        quota: &ResourceQuota,
    ) -> Result<ResourceQuota, kube::Error> {
        self.replace(quota)
    }

    async fn get_limit_range(&self, namespace: &str, name: &str) -> Result<LimitRange, kube::Error> {
        self.get(Some(namespace), name)
    }

    async fn create_limit_range(&self, limits: &LimitRange) -> Result<LimitRange, kube::Error> {
        self.create(limits)
    }

    async fn replace_limit_range(&self, limits: &LimitRange) -> Result<LimitRange, kube::Error> {
        self.replace(limits)
    }

    async fn patch_space_status(
        &self,
        name: &str,
        resource_version: Option<String>,
        status: &SpaceStatus,
    ) -> Result<Space, kube::Error> {
        let mut state = self.state.lock().unwrap();
        state.check_failure("patch_status", KIND_SPACE)?;
        let mut space = state
            .spaces
            .items
            .get(name)
            .cloned()
            .ok_or_else(|| api_error(404, "NotFound"))?;
        if resource_version.is_some() && resource_version != space.resource_version() {
            return Err(api_error(409, "Conflict"));
        }
        space.status = Some(status.clone());
        state.writes.push(format!("patch_status {KIND_SPACE} {name}"));
        Ok(store(&mut state, space, true))
    }
}
