// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definition for kf Spaces.
//!
//! A [`Space`] is the multi-tenant boundary of the platform. Each Space is
//! cluster-scoped and owns a namespace of the same name, the RBAC roles granted
//! inside it, a `ResourceQuota` and a `LimitRange`.
//!
//! # Example: Creating a Space
//!
//! ```rust,no_run
//! use kf_spaces::crd::{BuildConfig, NetworkConfig, SpaceDomain, SpaceSpec};
//!
//! let mut spec = SpaceSpec {
//!     build_config: BuildConfig {
//!         container_registry: "gcr.io/my-project".to_string(),
//!         ..Default::default()
//!     },
//!     network_config: NetworkConfig {
//!         domains: vec![SpaceDomain::new("apps.example.com")],
//!     },
//!     ..Default::default()
//! };
//!
//! // The first domain becomes the default when none is flagged
//! spec.set_defaults();
//! assert!(spec.network_config.domains[0].is_default);
//! ```

use crate::status_reasons::{CONDITION_READY, DEPENDENT_CONDITIONS};
use k8s_openapi::api::core::v1::EnvVar;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Condition status following Kubernetes conventions
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    /// Condition is true
    True,
    /// Condition is false
    False,
    /// Condition status is unknown
    #[default]
    Unknown,
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Condition represents an observation of a Space's current state.
///
/// Conditions are merged by type: setting an existing type overwrites its status,
/// reason and message, and only moves `lastTransitionTime` when the status changes.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition: Ready, `NamespaceReady`, `RoleReady`, `ResourceQuotaReady` or `LimitRangeReady`.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: ConditionStatus,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Build settings applied to apps pushed into the Space.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Container registry that built images are pushed to.
    #[serde(default)]
    pub container_registry: String,

    /// Builder image used for source builds. Uses the platform default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder_image: Option<String>,

    /// Environment variables injected into every build.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

/// A domain apps in the Space can bind routes to.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpaceDomain {
    /// Domain name, e.g. `apps.example.com`.
    pub domain: String,

    /// Whether routes without an explicit domain use this one.
    #[serde(default)]
    pub is_default: bool,
}

impl SpaceDomain {
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            is_default: false,
        }
    }
}

/// Networking settings for the Space.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    /// Ordered list of domains. At most one entry is the default.
    #[serde(default)]
    pub domains: Vec<SpaceDomain>,
}

/// Resource limits enforced in the Space namespace.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLimits {
    /// Hard limits projected into the Space `ResourceQuota`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub space_quota: BTreeMap<String, Quantity>,

    /// Default container requests projected into the Space `LimitRange`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resource_defaults: BTreeMap<String, Quantity>,
}

/// Access settings for Space roles.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityConfig {
    /// Grants developers read access to pod logs in the Space namespace.
    #[serde(default)]
    pub enable_developer_logs_access: bool,
}

/// Runtime settings for apps in the Space.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionConfig {
    /// Environment variables injected into every app at runtime.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

/// `Space` is a tenant boundary that owns a namespace and its access controls.
///
/// # Example
///
/// ```yaml
/// apiVersion: kf.dev/v1alpha1
/// kind: Space
/// metadata:
///   name: my-space
/// spec:
///   buildConfig:
///     containerRegistry: gcr.io/my-project
///   networkConfig:
///     domains:
///       - domain: apps.example.com
///         isDefault: true
///   resourceLimits:
///     spaceQuota:
///       memory: 10Gi
///       cpu: "4"
///     resourceDefaults:
///       memory: 512Mi
///   security:
///     enableDeveloperLogsAccess: true
/// ```
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "kf.dev",
    version = "v1alpha1",
    kind = "Space",
    plural = "spaces",
    doc = "Space is a multi-tenant boundary. Each Space is reconciled into a Namespace of the same name with developer and auditor Roles, a ResourceQuota and a LimitRange."
)]
#[kube(status = "SpaceStatus")]
#[serde(rename_all = "camelCase")]
pub struct SpaceSpec {
    /// Build settings.
    #[serde(default)]
    pub build_config: BuildConfig,

    /// Networking settings.
    #[serde(default)]
    pub network_config: NetworkConfig,

    /// Quota and default container requests.
    #[serde(default)]
    pub resource_limits: ResourceLimits,

    /// Role access settings.
    #[serde(default)]
    pub security: SecurityConfig,

    /// Runtime settings.
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl SpaceSpec {
    /// Normalises the domain list so that exactly one entry is the default.
    ///
    /// With no flagged entry the first domain becomes the default. With several,
    /// only the first flagged entry keeps the flag. An empty list stays empty.
    pub fn set_defaults(&mut self) {
        let domains = &mut self.network_config.domains;
        let chosen = domains.iter().position(|d| d.is_default).unwrap_or(0);
        for (i, domain) in domains.iter_mut().enumerate() {
            domain.is_default = i == chosen;
        }
    }

    /// The default domain, if any domains are configured.
    #[must_use]
    pub fn default_domain(&self) -> Option<&SpaceDomain> {
        self.network_config.domains.iter().find(|d| d.is_default)
    }
}

/// `Space` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpaceStatus {
    /// Ordered conditions: Ready first, then one per dependent kind.
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Generation of the spec the conditions describe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// The spec's domains with the default resolved: exactly one entry has
    /// `isDefault` set whenever any domains are configured.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<SpaceDomain>,
}

impl SpaceStatus {
    #[must_use]
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == condition_type)
    }
}

impl Space {
    /// Whether the status describes the current generation of the spec.
    #[must_use]
    pub fn status_is_current(&self) -> bool {
        match (&self.status, self.metadata.generation) {
            (Some(status), Some(generation)) => status.observed_generation == Some(generation),
            (Some(status), None) => status.observed_generation.is_some(),
            (None, _) => false,
        }
    }

    /// The `Ready` condition, if status has been reported.
    #[must_use]
    pub fn ready_condition(&self) -> Option<&Condition> {
        self.status.as_ref()?.condition(CONDITION_READY)
    }

    /// `Ready=True` for the current generation.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status_is_current()
            && self
                .ready_condition()
                .is_some_and(|c| c.status == ConditionStatus::True)
    }

    /// Domains apps can bind routes to, with the default resolved.
    ///
    /// Uses the domains the controller reported for the current generation, and falls
    /// back to the spec before the first reconcile has landed.
    #[must_use]
    pub fn domains(&self) -> &[SpaceDomain] {
        match &self.status {
            Some(status) if self.status_is_current() && !status.domains.is_empty() => {
                &status.domains
            }
            _ => &self.spec.network_config.domains,
        }
    }

    /// The first dependent condition (in declared order) that is `False`.
    #[must_use]
    pub fn first_failing_condition(&self) -> Option<&Condition> {
        let status = self.status.as_ref()?;
        DEPENDENT_CONDITIONS
            .iter()
            .filter_map(|t| status.condition(t))
            .find(|c| c.status == ConditionStatus::False)
    }
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
