// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synchronizes every tracked repository.

use apm_core::{ApmError, ItemFailure, SourceInfo};
use apm_storage::Storage;
use tracing::{error, info};

use crate::{Context, UpdateRepository, Workflow};

/// Syncs sources in alias order. A failing source does not stop the others;
/// the pass then ends with an aggregate error naming each failed alias.
pub struct Update<'a> {
    pub ctx: Context<'a>,
}

impl Update<'_> {
    pub fn execute(&self) -> Result<(), ApmError> {
        let mut failures = Vec::new();
        let mut synced = 0usize;

        for entry in self.ctx.namespaces.sources().iter()? {
            let alias = entry.key_str();
            match entry.value().and_then(|source| self.sync_one(source)) {
                Ok(()) => synced += 1,
                Err(e) => {
                    error!(alias = %alias, error = %e, "repository sync failed");
                    failures.push(ItemFailure {
                        item: alias,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            info!(repositories = synced, "update complete");
            Ok(())
        } else {
            Err(ApmError::Aggregate {
                operation: "update".into(),
                failures,
            })
        }
    }

    fn sync_one(&self, source: SourceInfo) -> Result<(), ApmError> {
        let path = self.ctx.layout.repository_path(&source.alias)?;
        let latest = self
            .ctx
            .git
            .sync(&source.url, &path, &source.branch, self.ctx.auth)?;

        if latest == source.commit {
            info!(alias = %source.alias, commit = %latest, "already at latest");
            return Ok(());
        }

        self.ctx
            .executor
            .execute(Workflow::UpdateRepository(UpdateRepository {
                ctx: self.ctx,
                source,
                latest,
                repository_path: path,
            }))
    }
}
