// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # kf-spaces - Space controller for Kubernetes
//!
//! A `Space` is a cluster-scoped tenant boundary. The controller converges every Space
//! into a set of owned dependents and reports progress on its status:
//!
//! - a `Namespace` named after the Space
//! - `space-developer` and `space-auditor` `Role`s
//! - a `ResourceQuota` from `spec.resourceLimits.spaceQuota`
//! - a `LimitRange` from `spec.resourceLimits.resourceDefaults`
//!
//! ## Modules
//!
//! - [`crd`] - The `Space` custom resource and its status
//! - [`space_resources`] - Pure computation of the desired dependents
//! - [`reconcilers`] - Dependent synchronisation, status reporting and the reconcile loop
//! - [`controller`] - The `kube` runtime controller, dependent watches and retry policy
//! - [`backoff`] - Per-Space exponential retry delays
//! - [`cache`] - Watch-fed reflector stores
//! - [`cluster`] - Outbound cluster writes
//! - [`client`] - Typed Space client with `wait_for`
//!
//! ## Example
//!
//! ```rust
//! use kf_spaces::crd::{Space, SpaceDomain, SpaceSpec};
//! use kf_spaces::space_resources::compute_desired;
//!
//! let mut spec = SpaceSpec::default();
//! spec.network_config.domains = vec![SpaceDomain::new("apps.example.com")];
//! spec.set_defaults();
//!
//! let mut space = Space::new("my-space", spec);
//! space.metadata.uid = Some("1234".to_string());
//!
//! let desired = compute_desired(&space).unwrap();
//! assert_eq!(desired.namespace.metadata.name.as_deref(), Some("my-space"));
//! ```

pub mod backoff;
pub mod cache;
pub mod client;
pub mod cluster;
pub mod config;
pub mod constants;
pub mod context;
pub mod controller;
pub mod crd;
pub mod errors;
pub mod health;
pub mod labels;
pub mod metrics;
pub mod quantity;
pub mod reconcilers;
pub mod router;
pub mod space_resources;
pub mod status_reasons;

#[cfg(test)]
mod test_utils;
