// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed client for Spaces, for callers such as a CLI.
//!
//! [`SpacesClient`] creates and reads Spaces, and waits for a Space to satisfy a
//! predicate. The waits are provided methods built on [`poll_until`], so every
//! implementation gets them and tests can stub them out. When a wait times out, the
//! error carries the message of the first failing condition so the caller can show
//! why the Space is not ready.
//!
//! # Example
//!
//! ```rust,no_run
//! use kf_spaces::client::{KubeSpacesClient, SpacesClient};
//! use kf_spaces::crd::SpaceSpec;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = KubeSpacesClient::new(kube::Client::try_default().await?);
//! client.create("my-space", SpaceSpec::default()).await?;
//! let space = client.wait_for_ready("my-space", Duration::from_secs(60)).await?;
//! # Ok(())
//! # }
//! ```

use crate::constants::WAIT_POLL_INTERVAL_MILLIS;
use crate::crd::{Space, SpaceSpec};
use crate::errors::{is_not_found, ClientError};
use async_trait::async_trait;
use kube::api::PostParams;
use kube::{Api, Client};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Condition a waited-for Space must satisfy.
pub type SpacePredicate = Arc<dyn Fn(&Space) -> bool + Send + Sync>;

/// Create, read and wait for Spaces.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpacesClient: Send + Sync {
    /// Create a Space. Domain defaults are applied before the create.
    async fn create(&self, name: &str, spec: SpaceSpec) -> Result<Space, ClientError>;

    /// Read a Space. A missing Space is [`ClientError::NotFound`].
    async fn get(&self, name: &str) -> Result<Space, ClientError>;

    /// Wait until the Space `name` satisfies `predicate`, polling with [`Self::get`].
    ///
    /// # Errors
    ///
    /// Same as [`poll_until`].
    async fn wait_for(
        &self,
        name: &str,
        timeout: Duration,
        predicate: SpacePredicate,
    ) -> Result<Space, ClientError> {
        poll_until(self, name, timeout, |space: &Space| predicate(space)).await
    }

    /// Wait until the Space `name` is ready for its current generation.
    ///
    /// # Errors
    ///
    /// Same as [`poll_until`].
    async fn wait_for_ready(&self, name: &str, timeout: Duration) -> Result<Space, ClientError> {
        let ready: SpacePredicate = Arc::new(Space::is_ready);
        self.wait_for(name, timeout, ready).await
    }
}

/// [`SpacesClient`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeSpacesClient {
    api: Api<Space>,
}

impl KubeSpacesClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }
}

#[async_trait]
impl SpacesClient for KubeSpacesClient {
    async fn create(&self, name: &str, mut spec: SpaceSpec) -> Result<Space, ClientError> {
        spec.set_defaults();
        let space = Space::new(name, spec);
        Ok(self.api.create(&PostParams::default(), &space).await?)
    }

    async fn get(&self, name: &str) -> Result<Space, ClientError> {
        self.api.get(name).await.map_err(|e| {
            if is_not_found(&e) {
                ClientError::NotFound(name.to_string())
            } else {
                ClientError::Kube(e)
            }
        })
    }
}

/// Poll the Space `name` until `predicate` holds or `timeout` elapses.
///
/// A Space that does not exist yet is waited for, not treated as an error.
///
/// # Errors
///
/// - [`ClientError::Timeout`] when the deadline passes. The message names the first
///   failing condition of the last observed Space, if any.
/// - [`ClientError::Kube`] for any other API failure.
pub async fn poll_until<C, P>(
    client: &C,
    name: &str,
    timeout: Duration,
    predicate: P,
) -> Result<Space, ClientError>
where
    C: SpacesClient + ?Sized,
    P: Fn(&Space) -> bool,
{
    let deadline = Instant::now() + timeout;
    let poll_interval = Duration::from_millis(WAIT_POLL_INTERVAL_MILLIS).min(timeout);
    let mut last_seen: Option<Space> = None;

    loop {
        match client.get(name).await {
            Ok(space) => {
                if predicate(&space) {
                    return Ok(space);
                }
                last_seen = Some(space);
            }
            Err(ClientError::NotFound(_)) => {
                debug!(space = %name, "Space not found yet, waiting");
            }
            Err(e) => return Err(e),
        }

        if Instant::now() + poll_interval > deadline {
            return Err(ClientError::Timeout {
                name: name.to_string(),
                timeout,
                message: timeout_message(last_seen.as_ref()),
            });
        }
        tokio::time::sleep(poll_interval).await;
    }
}

fn timeout_message(last_seen: Option<&Space>) -> String {
    let Some(space) = last_seen else {
        return "Space was never observed".to_string();
    };
    match space.first_failing_condition() {
        Some(cond) => format!(
            "{} is {}: {}",
            cond.r#type,
            cond.status,
            cond.message.as_deref().unwrap_or_default()
        ),
        None if !space.status_is_current() => {
            "Space status has not caught up with the latest generation".to_string()
        }
        None => "Space did not reach the expected state".to_string(),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
