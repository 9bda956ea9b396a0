// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Condition types and reasons reported on `Space.status.conditions`.
//!
//! Reasons are programmatic identifiers in CamelCase that explain why a condition has
//! a particular status. The encompassing `Ready` condition always copies the reason
//! and message of the first failing sub-condition.
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   observedGeneration: 3
//!   conditions:
//!     - type: Ready
//!       status: "False"
//!       reason: OwnershipConflict
//!       message: "Role space-developer in namespace my-space is not owned by Space my-space"
//!     - type: NamespaceReady
//!       status: "True"
//!       reason: Reconciled
//!     - type: RoleReady
//!       status: "False"
//!       reason: OwnershipConflict
//!       message: "Role space-developer in namespace my-space is not owned by Space my-space"
//!     - type: ResourceQuotaReady
//!       status: "True"
//!       reason: Reconciled
//!     - type: LimitRangeReady
//!       status: "True"
//!       reason: Reconciled
//! ```

// ============================================================================
// Condition Types
// ============================================================================

/// Aggregate condition; the one callers should poll.
pub const CONDITION_READY: &str = "Ready";

/// The Space namespace exists and matches the desired state.
pub const CONDITION_NAMESPACE_READY: &str = "NamespaceReady";

/// All Space roles exist and match the desired state.
pub const CONDITION_ROLE_READY: &str = "RoleReady";

/// The Space `ResourceQuota` exists and matches the desired state.
pub const CONDITION_RESOURCE_QUOTA_READY: &str = "ResourceQuotaReady";

/// The Space `LimitRange` exists and matches the desired state.
pub const CONDITION_LIMIT_RANGE_READY: &str = "LimitRangeReady";

/// Sub-conditions in declared order. Failure precedence follows this order.
pub const DEPENDENT_CONDITIONS: [&str; 4] = [
    CONDITION_NAMESPACE_READY,
    CONDITION_ROLE_READY,
    CONDITION_RESOURCE_QUOTA_READY,
    CONDITION_LIMIT_RANGE_READY,
];

// ============================================================================
// Reasons
// ============================================================================

/// Every dependent converged.
pub const REASON_ALL_READY: &str = "AllReady";

/// A single dependent converged.
pub const REASON_RECONCILED: &str = "Reconciled";

/// The condition has not been evaluated yet.
pub const REASON_INITIALIZING: &str = "Initializing";

/// A dependent could not be written because of an API error.
pub const REASON_RECONCILE_FAILED: &str = "ReconcileFailed";

/// A same-named dependent exists but is owned by something else.
pub const REASON_OWNERSHIP_CONFLICT: &str = "OwnershipConflict";

/// The Space spec cannot be turned into dependents.
pub const REASON_INVALID_SPEC: &str = "InvalidSpec";

/// A namespaced dependent was skipped because the namespace is not ready.
pub const REASON_NAMESPACE_NOT_READY: &str = "NamespaceNotReady";
