// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Installation of a plugin artifact from its registered definition.

use apm_core::{ApmError, InstallInfo, QualifiedName};
use apm_storage::Storage;
use tracing::{info, warn};

use crate::Context;

/// Materializes a VM binary and records it as installed.
///
/// Installing an already installed plugin succeeds without touching the
/// artifact.
pub struct Install<'a> {
    pub ctx: Context<'a>,
    pub name: QualifiedName,
}

impl Install<'_> {
    pub fn execute(&self) -> Result<(), ApmError> {
        let installed = self.ctx.namespaces.installed();
        let key = self.name.key();
        if installed.has(&key)? {
            info!(name = %self.name, "already installed");
            return Ok(());
        }

        let definition = self
            .ctx
            .namespaces
            .repository(self.name.alias())
            .vms
            .get(self.name.plugin().as_bytes())?
            .ok_or_else(|| ApmError::not_found("vm", self.name.to_string()))?;
        let vm = &definition.definition;
        let dest = self.ctx.layout.artifact_path(&vm.id)?;

        self.ctx.installer.install(vm, &dest)?;

        let record = InstallInfo {
            id: vm.id.clone(),
            version: vm.version.clone(),
            commit: definition.commit,
        };
        if let Err(e) = installed.put(&key, &record) {
            if let Err(cleanup) = self.ctx.installer.remove(&dest) {
                warn!(path = %dest.display(), error = %cleanup, "orphaned artifact left behind");
            }
            return Err(e);
        }

        info!(name = %self.name, id = %vm.id, version = %vm.version, "installed");
        Ok(())
    }
}
