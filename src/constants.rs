// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Space controller.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the Space CRD
pub const API_GROUP: &str = "kf.dev";

/// API version for the Space CRD
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "kf.dev/v1alpha1";

/// Kind name for the `Space` resource
pub const KIND_SPACE: &str = "Space";

/// Kind name for core `Namespace` dependents
pub const KIND_NAMESPACE: &str = "Namespace";

/// Kind name for RBAC `Role` dependents
pub const KIND_ROLE: &str = "Role";

/// Kind name for `ResourceQuota` dependents
pub const KIND_RESOURCE_QUOTA: &str = "ResourceQuota";

/// Kind name for `LimitRange` dependents
pub const KIND_LIMIT_RANGE: &str = "LimitRange";

/// Name used in logs and metrics for the controller itself
pub const CONTROLLER_NAME: &str = "spaces.kf.dev";

// ============================================================================
// Dependent Resource Names
// ============================================================================

/// Role granting developers read/write access to app resources in a Space
pub const DEVELOPER_ROLE_NAME: &str = "space-developer";

/// Role granting auditors read-only access to app resources in a Space
pub const AUDITOR_ROLE_NAME: &str = "space-auditor";

/// Name of the `ResourceQuota` created in every Space namespace
pub const RESOURCE_QUOTA_NAME: &str = "space-quota";

/// Name of the `LimitRange` created in every Space namespace
pub const LIMIT_RANGE_NAME: &str = "space-limit-range";

/// `LimitRange` item type the Space defaults apply to
pub const LIMIT_TYPE_CONTAINER: &str = "Container";

/// kf.dev resources that Space roles grant access to
pub const KF_APP_RESOURCES: &[&str] = &[
    "apps",
    "routes",
    "routeclaims",
    "sourcepackages",
    "builds",
    "serviceinstances",
    "serviceinstancebindings",
];

/// Verbs granted to the developer role on kf.dev resources
pub const DEVELOPER_VERBS: &[&str] = &[
    "get", "list", "watch", "create", "update", "patch", "delete",
];

/// Verbs granted for read-only access
pub const READ_ONLY_VERBS: &[&str] = &["get", "list", "watch"];

/// Maximum length of a Kubernetes namespace name (DNS-1123 label)
pub const MAX_NAMESPACE_NAME_LEN: usize = 63;

// ============================================================================
// Controller Runtime Constants
// ============================================================================

/// Default number of Spaces reconciled concurrently
pub const DEFAULT_WORKERS: u16 = 2;

/// Default per-Space base backoff delay (5 milliseconds)
pub const DEFAULT_BASE_BACKOFF_MILLIS: u64 = 5;

/// Default per-Space maximum backoff delay (1000 seconds)
pub const DEFAULT_MAX_BACKOFF_SECS: u64 = 1000;

/// Default delay before a converged Space is reconciled again (5 minutes)
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

// ============================================================================
// Client Constants
// ============================================================================

/// Interval between status polls in `wait_for`
pub const WAIT_POLL_INTERVAL_MILLIS: u64 = 500;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Default port for the health and metrics HTTP server
pub const DEFAULT_HEALTH_PORT: u16 = 8081;

/// Field manager name recorded on status patches
pub const FIELD_MANAGER: &str = "kf-spaces-controller";
