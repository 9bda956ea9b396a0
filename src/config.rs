// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command-line and environment configuration for the controller binary.

use crate::constants::{
    DEFAULT_BASE_BACKOFF_MILLIS, DEFAULT_HEALTH_PORT, DEFAULT_MAX_BACKOFF_SECS,
    DEFAULT_RESYNC_INTERVAL_SECS, DEFAULT_WORKERS,
};
use clap::{Parser, ValueEnum};
use std::time::Duration;

/// Output format for log lines
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Controller settings. Every flag can also be set through its environment variable.
#[derive(Parser, Debug, Clone)]
#[command(name = "kf-spaces", version, about = "Reconciles kf Spaces into namespaces, roles, quotas and limit ranges", long_about = None)]
pub struct ControllerConfig {
    /// Maximum number of Spaces reconciled concurrently
    #[arg(long, env = "KF_SPACES_WORKERS", default_value_t = DEFAULT_WORKERS)]
    pub workers: u16,

    /// Seconds a converged Space waits before it is reconciled again
    #[arg(long, env = "KF_SPACES_RESYNC_INTERVAL_SECS", default_value_t = DEFAULT_RESYNC_INTERVAL_SECS)]
    pub resync_interval_secs: u64,

    /// Base per-Space retry delay in milliseconds
    #[arg(long, env = "KF_SPACES_BASE_BACKOFF_MILLIS", default_value_t = DEFAULT_BASE_BACKOFF_MILLIS)]
    pub base_backoff_millis: u64,

    /// Maximum per-Space retry delay in seconds
    #[arg(long, env = "KF_SPACES_MAX_BACKOFF_SECS", default_value_t = DEFAULT_MAX_BACKOFF_SECS)]
    pub max_backoff_secs: u64,

    /// Port for the /healthz, /readyz and /metrics endpoints
    #[arg(long, env = "KF_SPACES_HEALTH_PORT", default_value_t = DEFAULT_HEALTH_PORT)]
    pub health_port: u16,

    /// Log output format
    #[arg(long, env = "RUST_LOG_FORMAT", value_enum, ignore_case = true, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            base_backoff_millis: DEFAULT_BASE_BACKOFF_MILLIS,
            max_backoff_secs: DEFAULT_MAX_BACKOFF_SECS,
            health_port: DEFAULT_HEALTH_PORT,
            log_format: LogFormat::Text,
        }
    }
}

impl ControllerConfig {
    /// Reject settings the controller cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no workers, the resync interval is zero, or the
    /// base backoff exceeds the ceiling.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }
        if self.resync_interval_secs == 0 {
            anyhow::bail!("resync interval must be greater than zero");
        }
        if self.base_backoff() > self.max_backoff() {
            anyhow::bail!(
                "base backoff ({:?}) must not exceed max backoff ({:?})",
                self.base_backoff(),
                self.max_backoff()
            );
        }
        Ok(())
    }

    #[must_use]
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    #[must_use]
    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_millis)
    }

    #[must_use]
    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
