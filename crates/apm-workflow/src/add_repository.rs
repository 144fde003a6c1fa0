// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registration of a new plugin repository source.

use apm_core::constants::BRANCH_REF_PREFIX;
use apm_core::types::parse_alias;
use apm_core::{ApmError, CommitHash, SourceInfo};
use apm_storage::Storage;
use tracing::info;

/// Starts tracking a repository. It stays unsynced until the next update.
pub struct AddRepository<'a> {
    pub sources: &'a dyn Storage<SourceInfo>,
    pub alias: &'a str,
    pub url: &'a str,
    /// Short name (`main`) or full reference (`refs/heads/main`).
    pub branch: &'a str,
}

/// `main` -> `refs/heads/main`; full references pass through.
pub fn branch_ref(branch: &str) -> String {
    if branch.starts_with("refs/") {
        branch.to_string()
    } else {
        format!("{BRANCH_REF_PREFIX}{branch}")
    }
}

impl AddRepository<'_> {
    pub fn execute(&self) -> Result<(), ApmError> {
        parse_alias(self.alias)?;
        if self.url.trim().is_empty() {
            return Err(ApmError::Validation("repository url must not be empty".into()));
        }
        if self.branch.trim().is_empty() {
            return Err(ApmError::Validation("branch must not be empty".into()));
        }
        let key = self.alias.as_bytes();
        if self.sources.has(key)? {
            return Err(ApmError::already_exists("repository", self.alias));
        }

        let source = SourceInfo {
            alias: self.alias.to_string(),
            url: self.url.to_string(),
            branch: branch_ref(self.branch),
            commit: CommitHash::ZERO,
        };
        self.sources.put(key, &source)?;
        info!(alias = self.alias, url = self.url, branch = %source.branch, "repository added");
        Ok(())
    }
}
