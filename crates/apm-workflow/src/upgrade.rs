// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upgrade of every installed plugin.

use apm_core::{ApmError, ItemFailure, QualifiedName};
use apm_storage::Storage;
use tracing::{error, info};

use crate::upgrade_vm::Status;
use crate::{Context, UpgradeVm, Workflow};

/// Upgrades every installed plugin, continuing past individual failures.
pub struct Upgrade<'a> {
    pub ctx: Context<'a>,
}

impl Upgrade<'_> {
    pub fn execute(&self) -> Result<(), ApmError> {
        let names: Vec<String> = self
            .ctx
            .namespaces
            .installed()
            .iter()?
            .map(|entry| entry.key_str())
            .collect();

        let mut failures = Vec::new();
        let (mut upgraded, mut current) = (0usize, 0usize);
        for name in names {
            match self.upgrade_one(&name) {
                Ok(true) => upgraded += 1,
                Ok(false) => {
                    current += 1;
                    info!(name = %name, "already up to date");
                }
                Err(e) => {
                    error!(name = %name, error = %e, "upgrade failed");
                    failures.push(ItemFailure {
                        item: name,
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!(upgraded, current, failed = failures.len(), "upgrade pass complete");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ApmError::Aggregate {
                operation: "upgrade".into(),
                failures,
            })
        }
    }

    /// Returns true when the plugin was reinstalled.
    fn upgrade_one(&self, name: &str) -> Result<bool, ApmError> {
        let upgrade = UpgradeVm {
            ctx: self.ctx,
            name: name.parse::<QualifiedName>()?,
        };
        if let Status::Current(_) = upgrade.status()? {
            return Ok(false);
        }
        self.ctx.executor.execute(Workflow::UpgradeVm(upgrade))?;
        Ok(true)
    }
}
