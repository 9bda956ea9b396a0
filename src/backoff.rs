// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-key exponential backoff for failed reconciles.
//!
//! Each failing key doubles its delay, starting from the base and capped at the
//! maximum:
//!
//! | Failure | Delay (base 5ms) |
//! |---------|------------------|
//! | 1       | 5ms              |
//! | 2       | 10ms             |
//! | 3       | 20ms             |
//! | ...     | ...              |
//! | 19+     | 1000s (ceiling)  |
//!
//! A key's history is dropped with [`ItemBackoff::forget`] once it reconciles successfully.

use std::collections::HashMap;
use std::time::Duration;

/// Compute the delay for a key that has already failed `failures` times.
#[must_use]
pub fn compute_backoff(base: Duration, max: Duration, failures: u32) -> Duration {
    2u32.checked_pow(failures)
        .and_then(|factor| base.checked_mul(factor))
        .map_or(max, |delay| delay.min(max))
}

/// Tracks failure counts per key and hands out the next delay.
#[derive(Debug, Clone)]
pub struct ItemBackoff {
    base: Duration,
    max: Duration,
    failures: HashMap<String, u32>,
}

impl ItemBackoff {
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: HashMap::new(),
        }
    }

    /// Record a failure for `key` and return how long to wait before retrying it.
    pub fn next_delay(&mut self, key: &str) -> Duration {
        let failures = self.failures.entry(key.to_string()).or_insert(0);
        let delay = compute_backoff(self.base, self.max, *failures);
        *failures = failures.saturating_add(1);
        delay
    }

    /// Drop the failure history for `key`.
    pub fn forget(&mut self, key: &str) {
        self.failures.remove(key);
    }

    /// Number of failures recorded for `key` since it was last forgotten.
    #[must_use]
    pub fn num_requeues(&self, key: &str) -> u32 {
        self.failures.get(key).copied().unwrap_or(0)
    }

    /// Number of keys with a failure history.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// The ceiling delay.
    #[must_use]
    pub fn max_delay(&self) -> Duration {
        self.max
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod backoff_tests;
