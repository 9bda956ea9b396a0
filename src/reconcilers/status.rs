// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers and the Space status reporter.
//!
//! # Condition Format
//!
//! Kubernetes conditions follow a standard format:
//! - `type`: The aspect of the resource being reported (e.g., "Ready", "NamespaceReady")
//! - `status`: "True", "False", or "Unknown"
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `lastTransitionTime`: RFC3339 timestamp when the status last changed
//!
//! Space conditions are always reported in the same order: `Ready` first, then one
//! condition per dependent kind in declared order. `Ready` is derived, never set
//! directly: it is `True` only when every dependent condition is `True`, otherwise it
//! copies the reason and message of the first dependent condition that is not.
//!
//! # Example
//!
//! ```rust,ignore
//! use kf_spaces::reconcilers::status::SpaceStatusUpdater;
//!
//! let mut updater = SpaceStatusUpdater::new(&space);
//! updater.set_condition("NamespaceReady", ConditionStatus::True, "Reconciled", "");
//! updater.set_observed_generation(space.metadata.generation);
//! updater.apply(client.as_ref()).await?;
//! ```

use crate::cluster::ClusterClient;
use crate::crd::{Condition, ConditionStatus, Space, SpaceDomain, SpaceStatus};
use crate::errors::is_not_found;
use crate::status_reasons::{
    CONDITION_READY, DEPENDENT_CONDITIONS, REASON_ALL_READY, REASON_INITIALIZING,
};
use chrono::Utc;
use kube::ResourceExt;
use tracing::debug;

/// Create a new condition with the current timestamp.
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: ConditionStatus,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status,
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Find a condition by type in a list of conditions.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in a mutable conditions list (in-memory, no API call).
///
/// Merge-by-type: an existing condition of the same type has its status, reason and
/// message overwritten, and keeps its `lastTransitionTime` unless the status changed.
pub fn update_condition_in_memory(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: ConditionStatus,
    reason: &str,
    message: &str,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };

        existing.status = status;
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.last_transition_time = Some(last_transition_time);
    } else {
        conditions.push(create_condition(condition_type, status, reason, message));
    }
}

/// Compare two condition lists, ignoring `lastTransitionTime` and order.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    if current.len() != new.len() {
        return false;
    }

    new.iter().all(|new_cond| {
        find_condition(current, &new_cond.r#type).is_some_and(|curr_cond| {
            curr_cond.status == new_cond.status
                && curr_cond.reason == new_cond.reason
                && curr_cond.message == new_cond.message
        })
    })
}

/// Canonical position of a condition type: `Ready` first, then dependents in order.
fn condition_rank(condition_type: &str) -> usize {
    if condition_type == CONDITION_READY {
        return 0;
    }
    DEPENDENT_CONDITIONS
        .iter()
        .position(|t| *t == condition_type)
        .map_or(usize::MAX, |i| i + 1)
}

/// Collects the status computed during one reconcile and writes it in a single call.
///
/// Every reconcile starts from the Space's current status, so conditions that are not
/// touched keep their previous value and transition time.
pub struct SpaceStatusUpdater {
    name: String,
    resource_version: Option<String>,
    current_status: Option<SpaceStatus>,
    new_status: SpaceStatus,
}

impl SpaceStatusUpdater {
    /// Create an updater seeded with the Space's current status.
    ///
    /// Missing conditions are initialised to `Unknown` and the list is put in canonical
    /// order, so the written status always has all five conditions.
    #[must_use]
    pub fn new(space: &Space) -> Self {
        let current_status = space.status.clone();
        let mut new_status = current_status.clone().unwrap_or_default();

        for condition_type in std::iter::once(CONDITION_READY).chain(DEPENDENT_CONDITIONS) {
            if find_condition(&new_status.conditions, condition_type).is_none() {
                new_status.conditions.push(create_condition(
                    condition_type,
                    ConditionStatus::Unknown,
                    REASON_INITIALIZING,
                    "",
                ));
            }
        }
        new_status
            .conditions
            .sort_by_key(|c| condition_rank(&c.r#type));

        Self {
            name: space.name_any(),
            resource_version: space.resource_version(),
            current_status,
            new_status,
        }
    }

    /// Update a condition (in-memory only, no API call).
    pub fn set_condition(
        &mut self,
        condition_type: &str,
        status: ConditionStatus,
        reason: &str,
        message: &str,
    ) {
        update_condition_in_memory(
            &mut self.new_status.conditions,
            condition_type,
            status,
            reason,
            message,
        );
    }

    /// Record the generation the conditions describe.
    pub fn set_observed_generation(&mut self, generation: Option<i64>) {
        self.new_status.observed_generation = generation;
    }

    /// Record the domains with the default resolved.
    pub fn set_domains(&mut self, domains: Vec<SpaceDomain>) {
        self.new_status.domains = domains;
    }

    /// Derive `Ready` from the dependent conditions.
    pub fn aggregate_ready(&mut self) {
        let first_not_ready = DEPENDENT_CONDITIONS
            .iter()
            .filter_map(|t| find_condition(&self.new_status.conditions, t))
            .find(|c| c.status != ConditionStatus::True)
            .cloned();

        match first_not_ready {
            None => self.set_condition(CONDITION_READY, ConditionStatus::True, REASON_ALL_READY, ""),
            Some(cond) => self.set_condition(
                CONDITION_READY,
                ConditionStatus::False,
                cond.reason.as_deref().unwrap_or(REASON_INITIALIZING),
                cond.message.as_deref().unwrap_or_default(),
            ),
        }
    }

    /// Whether the status differs semantically from what the Space already has.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match &self.current_status {
            None => true,
            Some(current) => {
                current.observed_generation != self.new_status.observed_generation
                    || current.domains != self.new_status.domains
                    || !conditions_equal(&current.conditions, &self.new_status.conditions)
            }
        }
    }

    /// The status that will be written.
    #[must_use]
    pub fn status(&self) -> &SpaceStatus {
        &self.new_status
    }

    /// Write the status if it changed. Returns whether a write was issued.
    ///
    /// A Space that disappeared in the meantime is not an error.
    ///
    /// # Errors
    ///
    /// Returns the API error if the status write fails, including a 409 when the
    /// Space changed since it was read.
    pub async fn apply(&self, client: &dyn ClusterClient) -> Result<bool, kube::Error> {
        if !self.has_changes() {
            debug!(space = %self.name, "Space status unchanged, skipping update");
            return Ok(false);
        }

        match client
            .patch_space_status(&self.name, self.resource_version.clone(), &self.new_status)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => {
                debug!(space = %self.name, "Space deleted before status update");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
