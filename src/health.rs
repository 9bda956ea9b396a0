// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Health and metrics HTTP server for Kubernetes probes and Prometheus scraping.
//!
//! Provides `/healthz` (liveness), `/readyz` (readiness) and `/metrics`.

use crate::metrics::gather_metrics;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Shared state for the probe endpoints.
#[derive(Debug, Default)]
pub struct HealthState {
    /// Whether every watch cache has completed its initial list.
    caches_synced: AtomicBool,
}

impl HealthState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the controller ready; called once all caches have synced.
    pub fn mark_synced(&self) {
        self.caches_synced.store(true, Ordering::SeqCst);
        info!("Health check: caches synced, controller ready");
    }

    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.caches_synced.load(Ordering::SeqCst)
    }
}

/// Build the probe router. Split out from [`run_health_server`] so it can be driven in tests.
pub fn router(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Run the health and metrics HTTP server.
///
/// Runs until the server encounters a fatal error; spawn it alongside the controller.
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails.
pub async fn run_health_server(state: Arc<HealthState>, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(port = port, "Health and metrics server listening");

    axum::serve(listener, router(state)).await
}

/// Liveness probe endpoint. Returns 200 while the process is serving requests.
async fn healthz() -> StatusCode {
    debug!("Liveness probe: OK");
    StatusCode::OK
}

/// Readiness probe endpoint. Returns 503 until all caches have synced.
async fn readyz(State(state): State<Arc<HealthState>>) -> StatusCode {
    if state.is_synced() {
        debug!("Readiness probe: OK");
        StatusCode::OK
    } else {
        debug!("Readiness probe: NOT READY (caches not synced)");
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics() -> impl IntoResponse {
    match gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                e.to_string(),
            )
        }
    }
}
