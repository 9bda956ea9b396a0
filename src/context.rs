// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context handed to every reconcile.
//!
//! The controller passes an `Arc<Context>` holding:
//! - the [`ClusterClient`] all writes go through
//! - the watch-fed reflector [`Stores`] all reads come from
//! - the per-Space failure history that `error_policy` turns into retry delays

use crate::backoff::ItemBackoff;
use crate::cache::Stores;
use crate::cluster::ClusterClient;
use crate::constants::{
    DEFAULT_BASE_BACKOFF_MILLIS, DEFAULT_MAX_BACKOFF_SECS, DEFAULT_RESYNC_INTERVAL_SECS,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Shared context passed to all reconciles.
pub struct Context {
    /// Outbound API operations
    pub client: Arc<dyn ClusterClient>,

    /// Reflector stores for Spaces and every dependent kind
    pub stores: Stores,

    /// How long a converged Space waits before it is reconciled again
    pub resync_interval: Duration,

    backoff: Mutex<ItemBackoff>,
}

impl Context {
    #[must_use]
    pub fn new(client: Arc<dyn ClusterClient>, stores: Stores) -> Self {
        Self {
            client,
            stores,
            resync_interval: Duration::from_secs(DEFAULT_RESYNC_INTERVAL_SECS),
            backoff: Mutex::new(ItemBackoff::new(
                Duration::from_millis(DEFAULT_BASE_BACKOFF_MILLIS),
                Duration::from_secs(DEFAULT_MAX_BACKOFF_SECS),
            )),
        }
    }

    #[must_use]
    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.backoff = Mutex::new(ItemBackoff::new(base, max));
        self
    }

    #[must_use]
    pub fn with_resync_interval(mut self, interval: Duration) -> Self {
        self.resync_interval = interval;
        self
    }

    /// Lock the failure history. A panic in another reconcile never leaves the map
    /// half-written, so a poisoned lock is still usable.
    pub fn backoff(&self) -> MutexGuard<'_, ItemBackoff> {
        self.backoff.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
