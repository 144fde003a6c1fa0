// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keeps the alias index in step with staged definition changes.

use std::collections::BTreeMap;

use apm_core::{ApmError, DefinitionKind, RepoList};
use apm_storage::{Repository, Storage, WriteBatch};

#[derive(Debug, Default, Clone, Copy)]
struct Presence {
    vm: Option<bool>,
    subnet: Option<bool>,
}

/// Definition presence changes for one repository, staged but not yet
/// committed.
///
/// An alias belongs in `RepoList(name)` exactly when the repository holds a
/// VM or a subnet definition called `name` once the batch is applied. Later
/// calls to [`IndexUpdate::set`] for the same name and kind win.
pub(crate) struct IndexUpdate<'a> {
    alias: &'a str,
    repository: &'a Repository,
    touched: BTreeMap<String, Presence>,
}

impl<'a> IndexUpdate<'a> {
    pub(crate) fn new(alias: &'a str, repository: &'a Repository) -> Self {
        Self {
            alias,
            repository,
            touched: BTreeMap::new(),
        }
    }

    pub(crate) fn set(&mut self, name: &str, kind: DefinitionKind, present: bool) {
        let entry = self.touched.entry(name.to_string()).or_default();
        match kind {
            DefinitionKind::Vm => entry.vm = Some(present),
            DefinitionKind::Subnet => entry.subnet = Some(present),
        }
    }

    /// Stages the index entries that change. Empty lists are deleted.
    pub(crate) fn stage(
        self,
        registry: &dyn Storage<RepoList>,
        batch: &mut WriteBatch,
    ) -> Result<usize, ApmError> {
        let mut changed = 0;
        for (name, presence) in &self.touched {
            let key = name.as_bytes();
            let vm = match presence.vm {
                Some(v) => v,
                None => self.repository.vms.has(key)?,
            };
            let subnet = match presence.subnet {
                Some(s) => s,
                None => self.repository.subnets.has(key)?,
            };

            let mut list = registry.get(key)?.unwrap_or_default();
            let modified = if vm || subnet {
                list.add(self.alias)
            } else {
                list.remove(self.alias)
            };
            if !modified {
                continue;
            }
            if list.is_empty() {
                registry.stage_delete(batch, key);
            } else {
                registry.stage_put(batch, key, &list)?;
            }
            changed += 1;
        }
        Ok(changed)
    }
}
