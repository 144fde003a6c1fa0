// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Removal of a repository source and everything it registered.

use std::io;

use apm_core::types::parse_alias;
use apm_core::{ApmError, DefinitionKind};
use apm_storage::{Storage, WriteBatch};
use tracing::{info, warn};

use crate::Context;
use crate::index::IndexUpdate;

/// Stops tracking a repository and drops everything it published.
///
/// Installed plugins are left alone, including ones installed from this
/// repository; they can still be uninstalled by qualified name.
pub struct RemoveRepository<'a> {
    pub ctx: Context<'a>,
    pub alias: &'a str,
    /// The always-tracked repository, which cannot be removed.
    pub core_alias: &'a str,
}

impl RemoveRepository<'_> {
    pub fn execute(&self) -> Result<(), ApmError> {
        parse_alias(self.alias)?;
        if self.alias == self.core_alias {
            return Err(ApmError::Validation(format!(
                "{} is the core repository and cannot be removed",
                self.alias
            )));
        }

        let namespaces = self.ctx.namespaces;
        let sources = namespaces.sources();
        let key = self.alias.as_bytes();
        if !sources.has(key)? {
            return Err(ApmError::not_found("repository", self.alias));
        }

        let repository = namespaces.repository(self.alias);
        let mut index = IndexUpdate::new(self.alias, &repository);
        let mut batch = WriteBatch::new();
        let mut definitions = 0usize;

        for entry in repository.vms.iter()? {
            repository.vms.stage_delete(&mut batch, entry.key());
            index.set(&entry.key_str(), DefinitionKind::Vm, false);
            definitions += 1;
        }
        for entry in repository.subnets.iter()? {
            repository.subnets.stage_delete(&mut batch, entry.key());
            index.set(&entry.key_str(), DefinitionKind::Subnet, false);
            definitions += 1;
        }
        index.stage(&namespaces.registry(), &mut batch)?;
        sources.stage_delete(&mut batch, key);
        sources.commit(batch)?;
        info!(alias = self.alias, definitions, "repository removed");

        let path = self.ctx.layout.repository_path(self.alias)?;
        match std::fs::remove_dir_all(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "could not delete working tree"),
        }
        Ok(())
    }
}
