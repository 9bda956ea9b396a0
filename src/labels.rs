// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants applied to Space dependents.
//!
//! Every object the controller creates carries the standard Kubernetes
//! `managed-by` label plus a kf-specific label naming the owning Space.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

// ============================================================================
// Label Values
// ============================================================================

/// Value for `app.kubernetes.io/managed-by` on every kf-managed dependent
pub const MANAGED_BY_KF: &str = "kf";

/// Value for `app.kubernetes.io/part-of`
pub const PART_OF_KF: &str = "kf";

// ============================================================================
// kf-Specific Labels
// ============================================================================

/// Label naming the Space a dependent belongs to
pub const KF_SPACE_LABEL: &str = "kf.dev/space";

/// Label enabling sidecar injection for workloads in the Space namespace
pub const ISTIO_INJECTION_LABEL: &str = "istio-injection";

/// Value for [`ISTIO_INJECTION_LABEL`]
pub const ISTIO_INJECTION_ENABLED: &str = "enabled";

/// Label selector used by the dependent watches
#[must_use]
pub fn managed_by_selector() -> String {
    format!("{K8S_MANAGED_BY}={MANAGED_BY_KF}")
}
