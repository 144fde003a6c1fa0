// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Git synchronizer contract.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ApmError;
use crate::types::CommitHash;

/// Optional basic-auth credentials for private plugin repositories.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Paths changed between two commits, relative to the working tree root.
///
/// The three sets are disjoint. A rename appears as one removal plus one
/// addition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

/// Brings a local working tree in line with a remote branch.
pub trait GitSynchronizer {
    /// Clones or fetches `url` into `local_path`, checks out the tip of
    /// `branch` (a full reference name), and returns its commit id.
    fn sync(
        &self,
        url: &str,
        local_path: &Path,
        branch: &str,
        auth: Option<&BasicAuth>,
    ) -> Result<CommitHash, ApmError>;

    /// Lists the paths that differ between `from` and `to` in the repository
    /// at `local_path`. A zero `from` compares against the empty tree.
    fn diff(
        &self,
        local_path: &Path,
        from: CommitHash,
        to: CommitHash,
    ) -> Result<ChangeSet, ApmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_debug_redacts_password() {
        let auth = BasicAuth {
            username: "alice".into(),
            password: "hunter2".into(),
        };
        let debug = format!("{auth:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn empty_change_set() {
        assert!(ChangeSet::default().is_empty());
        let changes = ChangeSet {
            removed: vec![PathBuf::from("vms/a.yaml")],
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
