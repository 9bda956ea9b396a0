// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Maps dependent watch events to the Space that must be reconciled.
//!
//! A dependent maps to the name in its controller owner reference, but only when that
//! controller is a Space. Anything else is ignored.
//!
//! The controller's built-in owner mapping keeps the child's namespace on the owner
//! reference, which never matches a cluster-scoped Space, so namespaced dependents are
//! routed through [`owning_space_ref`] instead.

use crate::constants::{API_GROUP, KIND_SPACE};
use crate::crd::Space;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::runtime::reflector::ObjectRef;
use kube::ResourceExt;

/// Key of the Space that controls `obj`, if any.
#[must_use]
pub fn owning_space<K: ResourceExt>(obj: &K) -> Option<String> {
    obj.owner_references()
        .iter()
        .find(|o| o.controller == Some(true))
        .filter(|o| is_space_ref(o))
        .map(|o| o.name.clone())
}

/// Reference to the Space that controls `obj`, for `Controller::watches`.
#[must_use]
pub fn owning_space_ref<K: ResourceExt>(obj: &K) -> Option<ObjectRef<Space>> {
    owning_space(obj).map(|name| ObjectRef::new(&name))
}

fn is_space_ref(owner: &OwnerReference) -> bool {
    owner.kind == KIND_SPACE
        && owner
            .api_version
            .split_once('/')
            .is_some_and(|(group, _)| group == API_GROUP)
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod router_tests;
