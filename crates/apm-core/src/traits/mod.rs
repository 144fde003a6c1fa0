// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contracts for the external collaborators the workflows drive.
//!
//! Every collaborator is a blocking, object-safe trait so workflows can hold
//! `&dyn` references bound at construction time and tests can substitute
//! recording mocks.

pub mod git;
pub mod installer;
pub mod notifier;

pub use git::{BasicAuth, ChangeSet, GitSynchronizer};
pub use installer::ArtifactInstaller;
pub use notifier::AdminNotifier;
