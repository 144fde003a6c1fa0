// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mutating use cases of the plugin manager.
//!
//! Each use case is a plain struct holding a [`Context`] of borrowed
//! collaborators plus its arguments, wrapped in the closed [`Workflow`] enum
//! and run through the [`Executor`]. Workflows that fan out (sync all,
//! upgrade all, join subnet) dispatch their sub-workflows through the same
//! executor.

pub mod add_repository;
pub mod definition;
pub mod executor;
mod index;
pub mod install;
pub mod join_subnet;
pub mod layout;
pub mod remove_repository;
#[cfg(test)]
mod testing;
pub mod uninstall;
pub mod update;
pub mod update_repository;
pub mod upgrade;
pub mod upgrade_vm;

use apm_core::{AdminNotifier, ApmError, ArtifactInstaller, BasicAuth, GitSynchronizer};
use apm_storage::Namespaces;

pub use add_repository::AddRepository;
pub use executor::Executor;
pub use install::Install;
pub use join_subnet::JoinSubnet;
pub use layout::Layout;
pub use remove_repository::RemoveRepository;
pub use uninstall::Uninstall;
pub use update::Update;
pub use update_repository::UpdateRepository;
pub use upgrade::Upgrade;
pub use upgrade_vm::UpgradeVm;

/// Collaborators bound into every workflow at construction.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub namespaces: &'a Namespaces,
    pub layout: &'a Layout,
    pub git: &'a dyn GitSynchronizer,
    pub installer: &'a dyn ArtifactInstaller,
    pub notifier: &'a dyn AdminNotifier,
    pub auth: Option<&'a BasicAuth>,
    pub executor: &'a Executor,
}

/// Every mutating use case.
pub enum Workflow<'a> {
    AddRepository(AddRepository<'a>),
    RemoveRepository(RemoveRepository<'a>),
    Update(Update<'a>),
    UpdateRepository(UpdateRepository<'a>),
    Install(Install<'a>),
    Uninstall(Uninstall<'a>),
    Upgrade(Upgrade<'a>),
    UpgradeVm(UpgradeVm<'a>),
    JoinSubnet(JoinSubnet<'a>),
}

impl Workflow<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Workflow::AddRepository(_) => "add-repository",
            Workflow::RemoveRepository(_) => "remove-repository",
            Workflow::Update(_) => "update",
            Workflow::UpdateRepository(_) => "update-repository",
            Workflow::Install(_) => "install",
            Workflow::Uninstall(_) => "uninstall",
            Workflow::Upgrade(_) => "upgrade",
            Workflow::UpgradeVm(_) => "upgrade-vm",
            Workflow::JoinSubnet(_) => "join-subnet",
        }
    }

    pub fn execute(&self) -> Result<(), ApmError> {
        match self {
            Workflow::AddRepository(w) => w.execute(),
            Workflow::RemoveRepository(w) => w.execute(),
            Workflow::Update(w) => w.execute(),
            Workflow::UpdateRepository(w) => w.execute(),
            Workflow::Install(w) => w.execute(),
            Workflow::Uninstall(w) => w.execute(),
            Workflow::Upgrade(w) => w.execute(),
            Workflow::UpgradeVm(w) => w.execute(),
            Workflow::JoinSubnet(w) => w.execute(),
        }
    }
}
