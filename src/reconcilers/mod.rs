// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of Spaces into their dependents.
//!
//! # Reconciliation Architecture
//!
//! 1. **Read** - Take the Space from the watch cache
//! 2. **Compute** - Project the spec into desired dependents ([`crate::space_resources`])
//! 3. **Sync** - Create or replace each dependent that is missing or drifted ([`resources`])
//! 4. **Status** - Record one condition per kind and derive `Ready` ([`status`])
//!
//! # Modules
//!
//! - [`space`] - The reconcile loop, [`reconcile_space`]
//! - [`dependents`] - Per-kind behaviour behind the [`dependents::Dependent`] trait
//! - [`resources`] - Generic create-or-replace of one dependent
//! - [`status`] - Condition helpers and the status reporter

pub mod dependents;
pub mod resources;
pub mod space;
pub mod status;

pub use space::{reconcile_space, ReconcileResult};
