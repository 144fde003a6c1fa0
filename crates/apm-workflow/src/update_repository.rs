// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciles one repository's registry entries with a newly synced commit.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use apm_core::{ApmError, ChangeSet, CommitHash, Definition, DefinitionKind, SourceInfo};
use apm_storage::{Repository, Storage, WriteBatch};
use tracing::{debug, info};

use crate::Context;
use crate::definition::{self, Payload};
use crate::index::IndexUpdate;

/// Applies the diff between `source.commit` and `latest` to the registry.
///
/// The diff only says which definitions were touched. Each touched one is
/// re-read from the checked-out tree, so a name that is still defined under
/// another spelling survives the removal of one of its files. Everything is
/// decoded before anything is staged, and all definition, index, and
/// commit-pointer changes land in a single batch.
pub struct UpdateRepository<'a> {
    pub ctx: Context<'a>,
    /// The source as last persisted; its `commit` is the diff base.
    pub source: SourceInfo,
    pub latest: CommitHash,
    pub repository_path: PathBuf,
}

/// Where a touched definition stands at `latest`.
enum Resolved {
    Present(Payload),
    Absent,
}

fn touched(changes: &ChangeSet) -> BTreeSet<(DefinitionKind, String)> {
    changes
        .added
        .iter()
        .chain(&changes.modified)
        .chain(&changes.removed)
        .filter_map(|p| definition::classify(p))
        .map(|d| (d.kind, d.name))
        .collect()
}

fn resolve_all(
    root: &Path,
    touched: BTreeSet<(DefinitionKind, String)>,
) -> Result<Vec<(DefinitionKind, String, Resolved)>, ApmError> {
    touched
        .into_iter()
        .map(|(kind, name)| {
            let resolved = match definition::locate(root, kind, &name) {
                Some(path) => Resolved::Present(definition::load(root, &path, kind)?),
                None => Resolved::Absent,
            };
            Ok((kind, name, resolved))
        })
        .collect()
}

fn stage_put(
    repository: &Repository,
    name: &str,
    payload: &Payload,
    commit: CommitHash,
    batch: &mut WriteBatch,
) -> Result<(), ApmError> {
    let key = name.as_bytes();
    match payload {
        Payload::Vm(vm) => repository.vms.stage_put(
            batch,
            key,
            &Definition {
                definition: vm.clone(),
                commit,
            },
        ),
        Payload::Subnet(subnet) => repository.subnets.stage_put(
            batch,
            key,
            &Definition {
                definition: subnet.clone(),
                commit,
            },
        ),
    }
}

impl UpdateRepository<'_> {
    pub fn execute(&self) -> Result<(), ApmError> {
        let alias = self.source.alias.as_str();
        let namespaces = self.ctx.namespaces;
        let changes: ChangeSet =
            self.ctx
                .git
                .diff(&self.repository_path, self.source.commit, self.latest)?;

        let resolved = resolve_all(&self.repository_path, touched(&changes))?;

        let repository = namespaces.repository(alias);
        let mut index = IndexUpdate::new(alias, &repository);
        let mut batch = WriteBatch::new();
        let (mut stored, mut removed) = (0usize, 0usize);

        for (kind, name, resolution) in &resolved {
            match resolution {
                Resolved::Present(payload) => {
                    stage_put(&repository, name, payload, self.latest, &mut batch)?;
                    index.set(name, *kind, true);
                    stored += 1;
                    debug!(alias, name = %name, kind = %kind, "definition stored");
                }
                Resolved::Absent => {
                    let key = name.as_bytes();
                    match kind {
                        DefinitionKind::Vm => repository.vms.stage_delete(&mut batch, key),
                        DefinitionKind::Subnet => repository.subnets.stage_delete(&mut batch, key),
                    }
                    index.set(name, *kind, false);
                    removed += 1;
                    debug!(alias, name = %name, kind = %kind, "definition removed");
                }
            }
        }

        let index_changes = index.stage(&namespaces.registry(), &mut batch)?;

        let synced = SourceInfo {
            commit: self.latest,
            ..self.source.clone()
        };
        let sources = namespaces.sources();
        sources.stage_put(&mut batch, alias.as_bytes(), &synced)?;
        sources.commit(batch)?;

        info!(
            alias,
            from = %self.source.commit,
            to = %self.latest,
            files = changes.added.len() + changes.modified.len() + changes.removed.len(),
            stored,
            removed,
            index_changes,
            "repository reconciled"
        );
        Ok(())
    }
}
