// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for apm integration tests.
//!
//! Provides mock collaborators and a harness for fast, deterministic tests
//! that never touch the network, a real git remote, or a running node.
//!
//! # Components
//!
//! - [`MockGit`] - In-memory upstream repositories with scripted commits
//! - [`MockInstaller`] - Writes placeholder artifacts and records calls
//! - [`MockNotifier`] - Admin API stand-in that can be online, offline, or failing
//! - [`TestHarness`] - A full [`apm::Apm`] over an in-memory database

pub mod fixtures;
pub mod harness;
pub mod mock_git;
pub mod mock_installer;
pub mod mock_notifier;

pub use harness::TestHarness;
pub use mock_git::MockGit;
pub use mock_installer::MockInstaller;
pub use mock_notifier::{MockNotifier, NotifierMode};
