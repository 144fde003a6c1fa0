// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk layout under the data and plugin directories.

use std::path::{Component, Path, PathBuf};

use apm_core::ApmError;
use apm_core::constants::{DB_DIR, DB_FILE, REPOSITORIES_DIR, TMP_DIR};
use apm_core::types::parse_alias;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    data_dir: PathBuf,
    plugin_dir: PathBuf,
}

impl Layout {
    pub fn new(data_dir: impl Into<PathBuf>, plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            plugin_dir: plugin_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_DIR).join(DB_FILE)
    }

    pub fn repositories_dir(&self) -> PathBuf {
        self.data_dir.join(REPOSITORIES_DIR)
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.data_dir.join(TMP_DIR)
    }

    /// Working tree for `alias`: `<data_dir>/repositories/<org>/<repo>`.
    pub fn repository_path(&self, alias: &str) -> Result<PathBuf, ApmError> {
        let (org, repo) = parse_alias(alias)?;
        Ok(self
            .repositories_dir()
            .join(single_component(org)?)
            .join(single_component(repo)?))
    }

    /// Installed binary for the VM with id `vm_id`.
    pub fn artifact_path(&self, vm_id: &str) -> Result<PathBuf, ApmError> {
        Ok(self.plugin_dir.join(single_component(vm_id)?))
    }
}

/// Accepts only a plain file name, so remote-controlled names cannot walk
/// out of the directory they are joined onto.
fn single_component(name: &str) -> Result<&str, ApmError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(ApmError::Validation(format!(
            "`{name}` is not a valid path component"
        ))),
    }
}
