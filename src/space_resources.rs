// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired state of the dependents a Space owns.
//!
//! [`compute_desired`] is a pure function of the Space: the same Space always yields
//! the same objects, and nothing here talks to the cluster. Every object it builds
//! carries a controller owner reference to the Space and the kf-managed labels, so the
//! garbage collector removes it when the Space is deleted.
//!
//! | Dependent       | Name                                  | Namespace  |
//! |-----------------|---------------------------------------|------------|
//! | `Namespace`     | Space name                            | -          |
//! | `Role`          | `space-developer`, `space-auditor`    | Space name |
//! | `ResourceQuota` | `space-quota`                         | Space name |
//! | `LimitRange`    | `space-limit-range`                   | Space name |

use crate::constants::{
    API_GROUP, AUDITOR_ROLE_NAME, DEVELOPER_ROLE_NAME, DEVELOPER_VERBS, KF_APP_RESOURCES,
    LIMIT_RANGE_NAME, LIMIT_TYPE_CONTAINER, MAX_NAMESPACE_NAME_LEN, READ_ONLY_VERBS,
    RESOURCE_QUOTA_NAME,
};
use crate::crd::{Space, SpaceDomain};
use crate::errors::SyncError;
use crate::labels::{
    ISTIO_INJECTION_ENABLED, ISTIO_INJECTION_LABEL, K8S_MANAGED_BY, K8S_PART_OF, KF_SPACE_LABEL,
    MANAGED_BY_KF, PART_OF_KF,
};
use crate::quantity::parse_nanos;
use k8s_openapi::api::core::v1::{
    LimitRange, LimitRangeItem, LimitRangeSpec, Namespace, ResourceQuota, ResourceQuotaSpec,
};
use k8s_openapi::api::rbac::v1::{PolicyRule, Role};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;

/// Every dependent a Space should own, as it should look in the cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct DesiredState {
    /// Domains with exactly one default when any are configured.
    pub domains: Vec<SpaceDomain>,
    pub namespace: Namespace,
    pub roles: Vec<Role>,
    pub resource_quota: ResourceQuota,
    pub limit_range: LimitRange,
}

/// Compute the desired dependents of `space`.
///
/// The Space's domains are returned with the default resolved: the first entry
/// flagged `isDefault` keeps the flag, otherwise the first entry gets it.
///
/// # Errors
///
/// Returns [`SyncError::InvalidSpec`] when the Space cannot be projected: a name that
/// is not a valid namespace name, a missing UID, an empty domain, or a resource
/// quantity that does not parse.
pub fn compute_desired(space: &Space) -> Result<DesiredState, SyncError> {
    validate(space)?;

    let name = space.name_any();
    let owner = owner_reference(space)?;
    let mut spec = space.spec.clone();
    spec.set_defaults();

    let namespace = Namespace {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            labels: Some(namespace_labels(&name)),
            owner_references: Some(vec![owner.clone()]),
            ..Default::default()
        },
        ..Default::default()
    };

    let roles = vec![
        Role {
            metadata: dependent_meta(DEVELOPER_ROLE_NAME, &name, &owner),
            rules: Some(developer_rules(
                spec.security.enable_developer_logs_access,
            )),
        },
        Role {
            metadata: dependent_meta(AUDITOR_ROLE_NAME, &name, &owner),
            rules: Some(vec![kf_rule(READ_ONLY_VERBS)]),
        },
    ];

    let quota = &spec.resource_limits.space_quota;
    let resource_quota = ResourceQuota {
        metadata: dependent_meta(RESOURCE_QUOTA_NAME, &name, &owner),
        spec: Some(ResourceQuotaSpec {
            hard: (!quota.is_empty()).then(|| quota.clone()),
            ..Default::default()
        }),
        ..Default::default()
    };

    let defaults = &spec.resource_limits.resource_defaults;
    let limits = if defaults.is_empty() {
        Vec::new()
    } else {
        vec![LimitRangeItem {
            type_: LIMIT_TYPE_CONTAINER.to_string(),
            default_request: Some(defaults.clone()),
            ..Default::default()
        }]
    };
    let limit_range = LimitRange {
        metadata: dependent_meta(LIMIT_RANGE_NAME, &name, &owner),
        spec: Some(LimitRangeSpec { limits }),
    };

    Ok(DesiredState {
        domains: spec.network_config.domains,
        namespace,
        roles,
        resource_quota,
        limit_range,
    })
}

fn validate(space: &Space) -> Result<(), SyncError> {
    let name = space.metadata.name.as_deref().unwrap_or_default();
    if !is_dns1123_label(name) {
        return Err(SyncError::InvalidSpec(format!(
            "Space name {name:?} is not a valid namespace name"
        )));
    }

    if space
        .spec
        .network_config
        .domains
        .iter()
        .any(|d| d.domain.trim().is_empty())
    {
        return Err(SyncError::InvalidSpec(
            "networkConfig.domains contains an empty domain".to_string(),
        ));
    }

    let limits = &space.spec.resource_limits;
    for (field, list) in [
        ("spaceQuota", &limits.space_quota),
        ("resourceDefaults", &limits.resource_defaults),
    ] {
        for (resource, quantity) in list {
            if parse_nanos(&quantity.0).is_none() {
                return Err(SyncError::InvalidSpec(format!(
                    "resourceLimits.{field}.{resource} has invalid quantity {:?}",
                    quantity.0
                )));
            }
        }
    }

    Ok(())
}

/// Lowercase alphanumerics and '-', starting and ending alphanumeric, at most 63 chars.
fn is_dns1123_label(name: &str) -> bool {
    let bytes = name.as_bytes();
    !bytes.is_empty()
        && bytes.len() <= MAX_NAMESPACE_NAME_LEN
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && bytes.first().is_some_and(u8::is_ascii_alphanumeric)
        && bytes.last().is_some_and(u8::is_ascii_alphanumeric)
}

/// Controller owner reference pointing at `space`.
///
/// # Errors
///
/// Returns [`SyncError::InvalidSpec`] when the Space has no UID yet.
pub fn owner_reference(space: &Space) -> Result<OwnerReference, SyncError> {
    let owner = space.controller_owner_ref(&()).ok_or_else(|| {
        SyncError::InvalidSpec(format!("Space {} has no uid", space.name_any()))
    })?;
    Ok(OwnerReference {
        block_owner_deletion: Some(true),
        ..owner
    })
}

/// Labels every dependent carries.
#[must_use]
pub fn managed_labels(space_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (K8S_MANAGED_BY.to_string(), MANAGED_BY_KF.to_string()),
        (K8S_PART_OF.to_string(), PART_OF_KF.to_string()),
        (KF_SPACE_LABEL.to_string(), space_name.to_string()),
    ])
}

fn namespace_labels(space_name: &str) -> BTreeMap<String, String> {
    let mut labels = managed_labels(space_name);
    labels.insert(
        ISTIO_INJECTION_LABEL.to_string(),
        ISTIO_INJECTION_ENABLED.to_string(),
    );
    labels
}

fn dependent_meta(name: &str, namespace: &str, owner: &OwnerReference) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(managed_labels(namespace)),
        owner_references: Some(vec![owner.clone()]),
        ..Default::default()
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

fn kf_rule(verbs: &[&str]) -> PolicyRule {
    PolicyRule {
        api_groups: Some(vec![API_GROUP.to_string()]),
        resources: Some(to_strings(KF_APP_RESOURCES)),
        verbs: to_strings(verbs),
        ..Default::default()
    }
}

fn developer_rules(logs_access: bool) -> Vec<PolicyRule> {
    let mut rules = vec![kf_rule(DEVELOPER_VERBS)];
    if logs_access {
        rules.push(PolicyRule {
            api_groups: Some(vec![String::new()]),
            resources: Some(to_strings(&["pods", "pods/log"])),
            verbs: to_strings(READ_ONLY_VERBS),
            ..Default::default()
        });
    }
    rules
}

#[cfg(test)]
#[path = "space_resources_tests.rs"]
mod space_resources_tests;
