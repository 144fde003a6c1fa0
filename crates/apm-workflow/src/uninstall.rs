// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Removal of an installed plugin artifact and its install record.

use apm_core::{ApmError, QualifiedName};
use apm_storage::Storage;
use tracing::info;

use crate::Context;

/// Removes an installed VM binary, then its install record.
///
/// The artifact goes first so an interrupted run leaves a record pointing at
/// nothing, which a second run clears.
pub struct Uninstall<'a> {
    pub ctx: Context<'a>,
    pub name: QualifiedName,
}

impl Uninstall<'_> {
    pub fn execute(&self) -> Result<(), ApmError> {
        let installed = self.ctx.namespaces.installed();
        let key = self.name.key();
        let Some(record) = installed.get(&key)? else {
            info!(name = %self.name, "not installed");
            return Ok(());
        };

        let dest = self.ctx.layout.artifact_path(&record.id)?;
        self.ctx.installer.remove(&dest)?;
        installed.delete(&key)?;

        info!(name = %self.name, id = %record.id, "uninstalled");
        Ok(())
    }
}
