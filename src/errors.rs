// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for Space reconciliation and the inbound Space client.
//!
//! Errors are split by who has to act on them:
//!
//! - [`SyncError`] describes why a single dependent could not be converged. Its
//!   [`SyncError::reason`] is what ends up on the matching status condition.
//! - [`ReconcileError`] is what a reconcile hands back to the controller; any value
//!   of it means "requeue with backoff".
//! - [`ClientError`] is returned by the typed Space client used by callers such as a CLI.
//!
//! The `is_*` helpers classify raw [`kube::Error`] values the way the API server
//! reports them.

use crate::status_reasons::{
    REASON_INVALID_SPEC, REASON_OWNERSHIP_CONFLICT, REASON_RECONCILE_FAILED,
};
use std::time::Duration;
use thiserror::Error;

/// Reason string the API server uses for a create that collides with an existing object
const REASON_ALREADY_EXISTS: &str = "AlreadyExists";

/// Failure converging one dependent resource.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An API call failed. Retryable when the underlying error is transient.
    #[error("failed to {operation} {kind} {name}: {source}")]
    Api {
        kind: &'static str,
        name: String,
        operation: &'static str,
        #[source]
        source: kube::Error,
    },

    /// A same-named object exists but its controller owner is not this Space.
    #[error("{kind} {name} is not owned by Space {space}")]
    OwnershipConflict {
        kind: &'static str,
        name: String,
        space: String,
    },

    /// The Space spec cannot be projected into dependents.
    #[error("invalid Space spec: {0}")]
    InvalidSpec(String),
}

impl SyncError {
    /// Condition reason reported for this failure.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Api { .. } => REASON_RECONCILE_FAILED,
            Self::OwnershipConflict { .. } => REASON_OWNERSHIP_CONFLICT,
            Self::InvalidSpec(_) => REASON_INVALID_SPEC,
        }
    }

    /// Whether the failure is transient and the Space should be retried with backoff.
    ///
    /// Ownership conflicts, invalid specs and permanent API errors are terminal for
    /// the current generation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { source, .. } => is_retryable_error(source),
            Self::OwnershipConflict { .. } | Self::InvalidSpec(_) => false,
        }
    }
}

/// Error returned by a reconcile; `error_policy` requeues the Space with backoff.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("failed to write status for Space {name}: {source}")]
    Status {
        name: String,
        #[source]
        source: kube::Error,
    },
}

/// Errors returned by the inbound Space client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Space {0} not found")]
    NotFound(String),

    #[error("timed out after {timeout:?} waiting for Space {name}: {message}")]
    Timeout {
        name: String,
        timeout: Duration,
        message: String,
    },

    #[error(transparent)]
    Kube(#[from] kube::Error),
}

/// Determine if a Kubernetes error is retryable.
///
/// # Retryable Errors
///
/// - **HTTP 408 / 504** - Timeouts
/// - **HTTP 409** - Optimistic concurrency conflict on update
/// - **HTTP 429** (Too Many Requests) - Rate limiting
/// - **HTTP 5xx** (Server Errors) - Temporary API server issues
/// - **Service Errors** - Network/connection issues
///
/// # Non-Retryable Errors
///
/// - **HTTP 4xx** (other client errors) - Invalid request, forbidden, unprocessable
/// - Serialization and request-building errors
#[must_use]
pub fn is_retryable_error(err: &kube::Error) -> bool {
    match err {
        kube::Error::Api(api_err) => {
            matches!(api_err.code, 408 | 409 | 429) || (500..600).contains(&api_err.code)
        }
        kube::Error::Service(_) => true,
        _ => false,
    }
}

/// `true` for a create that failed because the object already exists.
#[must_use]
pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(api_err) if api_err.code == 409 && api_err.reason == REASON_ALREADY_EXISTS)
}

/// `true` for a 404.
#[must_use]
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(api_err) if api_err.code == 404)
}

/// `true` for an update rejected because the `resourceVersion` is stale.
#[must_use]
pub fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(api_err) if api_err.code == 409 && api_err.reason != REASON_ALREADY_EXISTS)
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
