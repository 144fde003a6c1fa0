// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! apm - a plugin manager for virtual machine plugins.
//!
//! [`Apm`] is the entry point: it owns the registry database and the
//! collaborators, resolves user-supplied plugin names, and runs every
//! mutating operation as a workflow through the executor.

pub mod apm;
pub mod resolve;

pub use apm::{Apm, Collaborators, PluginInfo};
pub use resolve::resolve;
