// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Space controller runtime.
//!
//! # Architecture
//!
//! ```text
//!  watch(Space) ───────────────────────────┐
//!  watch(Namespace) ── owner ref ──────────┤
//!  watch(Role) ───────┐                    ├──► Controller ──► reconcile ──► reconcile_space
//!  watch(Quota) ──────┤ owning_space_ref ──┤    (N concurrent)     │
//!  watch(Limits) ─────┘                    │                       ▼
//!                                          └──────────── error_policy (per-Space backoff)
//!
//!  reflector(Namespace, Role, Quota, Limits) ──► Stores (read by reconcile_space)
//! ```
//!
//! The [`Controller`] deduplicates triggers per Space and never runs two reconciles
//! for the same Space at once. A Space that is already scheduled keeps only the
//! earliest pending run, so retries never pile up.
//!
//! Dependent watches are filtered to objects labelled `app.kubernetes.io/managed-by=kf`.
//! Reconciles only start once the dependent caches have completed their initial list,
//! and the readiness probe flips once the Space cache has too.

use crate::cache::{new_cache, DependentWriters};
use crate::cluster::KubeClusterClient;
use crate::config::ControllerConfig;
use crate::context::Context;
use crate::crd::Space;
use crate::errors::ReconcileError;
use crate::health::HealthState;
use crate::labels::managed_by_selector;
use crate::metrics;
use crate::reconcilers::space::{reconcile_space, ReconcileResult};
use crate::router::owning_space_ref;
use futures::StreamExt;
use k8s_openapi::api::core::v1::{LimitRange, Namespace, ResourceQuota};
use k8s_openapi::api::rbac::v1::Role;
use kube::runtime::controller::{Action, Config as RunnerConfig, Controller};
use kube::runtime::reflector::store::Writer;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Run the controller until SIGINT or SIGTERM.
///
/// On shutdown no new reconciles are started and in-flight ones are allowed to finish
/// before this returns.
///
/// # Errors
///
/// Returns an error if the dependent caches never complete their initial sync.
pub async fn run(
    client: Client,
    config: ControllerConfig,
    health: Arc<HealthState>,
) -> anyhow::Result<()> {
    let spaces = Api::<Space>::all(client.clone());
    let controller = Controller::new(spaces, watcher::Config::default());
    let (stores, writers) = new_cache(controller.store());
    let reflectors = spawn_reflectors(&client, writers);

    info!("Waiting for dependent caches to sync");
    stores.wait_for_dependents().await?;

    let readiness = {
        let stores = stores.clone();
        tokio::spawn(async move {
            match stores.wait_until_ready().await {
                Ok(()) => {
                    health.mark_synced();
                    info!(spaces = stores.space_names().len(), "Caches synced");
                }
                Err(e) => error!("Caches never completed their initial sync: {}", e),
            }
        })
    };

    let ctx = Arc::new(
        Context::new(Arc::new(KubeClusterClient::new(client.clone())), stores)
            .with_backoff(config.base_backoff(), config.max_backoff())
            .with_resync_interval(config.resync_interval()),
    );

    let dependents = || watcher::Config::default().labels(&managed_by_selector());

    info!(workers = config.workers, "Starting Space controller");
    controller
        .owns(Api::<Namespace>::all(client.clone()), dependents())
        .watches(Api::<Role>::all(client.clone()), dependents(), |role| {
            owning_space_ref(&role)
        })
        .watches(
            Api::<ResourceQuota>::all(client.clone()),
            dependents(),
            |quota| owning_space_ref(&quota),
        )
        .watches(Api::<LimitRange>::all(client), dependents(), |limits| {
            owning_space_ref(&limits)
        })
        .with_config(RunnerConfig::default().concurrency(config.workers))
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| {
            if let Err(e) = result {
                debug!(error = %e, "Controller event");
            }
            futures::future::ready(())
        })
        .await;

    readiness.abort();
    for handle in reflectors {
        handle.abort();
    }

    info!("Space controller stopped");
    Ok(())
}

fn spawn_reflectors(client: &Client, writers: DependentWriters) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(reflect(Api::<Namespace>::all(client.clone()), writers.namespaces)),
        tokio::spawn(reflect(Api::<Role>::all(client.clone()), writers.roles)),
        tokio::spawn(reflect(
            Api::<ResourceQuota>::all(client.clone()),
            writers.resource_quotas,
        )),
        tokio::spawn(reflect(
            Api::<LimitRange>::all(client.clone()),
            writers.limit_ranges,
        )),
    ]
}

/// Keep one dependent kind's store in sync with the cluster.
async fn reflect<K>(api: Api<K>, writer: Writer<K>)
where
    K: Resource<DynamicType = ()> + Clone + Debug + DeserializeOwned + Send + Sync + 'static,
{
    let kind = K::kind(&()).to_string();
    debug!(kind = %kind, "Starting reflector");

    let config = watcher::Config::default().labels(&managed_by_selector());
    let mut events = std::pin::pin!(watcher(api, config)
        .default_backoff()
        .reflect(writer)
        .touched_objects());

    while let Some(event) = events.next().await {
        if let Err(e) = event {
            warn!(kind = %kind, error = %e, "Watch stream error");
        }
    }

    warn!(kind = %kind, "Watch stream ended");
}

/// Reconcile one Space and decide when it runs again.
///
/// | Outcome   | Backoff | Next run                      |
/// |-----------|---------|-------------------------------|
/// | `Synced`  | reset   | after the resync interval     |
/// | `Stalled` | reset   | after the backoff ceiling     |
/// | error     | grows   | decided by [`error_policy`]   |
///
/// # Errors
///
/// Returns the reconcile error unchanged; the controller hands it to [`error_policy`].
pub async fn reconcile(space: Arc<Space>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let name = space.name_any();
    let start = Instant::now();

    let result = reconcile_space(&ctx, &name).await;

    match result {
        Ok(ReconcileResult::Synced) => {
            let backing_off = forget_failures(&ctx, &name);
            metrics::set_backoff_spaces(backing_off);
            metrics::record_reconciliation_success(start.elapsed());
            Ok(Action::requeue(ctx.resync_interval))
        }
        Ok(ReconcileResult::Stalled) => {
            let backing_off = forget_failures(&ctx, &name);
            let delay = ctx.backoff().max_delay();
            metrics::set_backoff_spaces(backing_off);
            metrics::record_reconciliation_stalled(start.elapsed());
            metrics::record_requeue("stalled");
            debug!(space = %name, delay = ?delay, "Space stalled, requeued at backoff ceiling");
            Ok(Action::requeue(delay))
        }
        Err(e) => {
            metrics::record_reconciliation_error(start.elapsed());
            Err(e)
        }
    }
}

/// Requeue a Space whose reconcile failed, with exponential backoff per Space.
pub fn error_policy(space: Arc<Space>, err: &ReconcileError, ctx: Arc<Context>) -> Action {
    let name = space.name_any();
    let (delay, attempts, backing_off) = {
        let mut backoff = ctx.backoff();
        let delay = backoff.next_delay(&name);
        (delay, backoff.num_requeues(&name), backoff.len())
    };

    metrics::set_backoff_spaces(backing_off);
    metrics::record_requeue("error");
    error!(
        space = %name,
        retry_in = ?delay,
        attempts,
        "Failed to reconcile Space: {}",
        err
    );

    Action::requeue(delay)
}

fn forget_failures(ctx: &Context, name: &str) -> usize {
    let mut backoff = ctx.backoff();
    backoff.forget(name);
    backoff.len()
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
