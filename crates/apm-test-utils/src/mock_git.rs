// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory git collaborator.
//!
//! Each upstream url holds a linear history of full-tree snapshots. `sync`
//! writes the head snapshot into the local path and `diff` compares two
//! recorded snapshots, so the reconciler sees exactly what a real checkout
//! would contain.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use apm_core::{ApmError, BasicAuth, ChangeSet, CommitHash, GitSynchronizer};

type Tree = BTreeMap<PathBuf, Vec<u8>>;

/// One `sync` call as seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCall {
    pub url: String,
    pub branch: String,
    pub authenticated: bool,
}

#[derive(Default)]
struct State {
    heads: HashMap<String, CommitHash>,
    trees: HashMap<CommitHash, Tree>,
    failing: HashMap<String, String>,
    syncs: Vec<SyncCall>,
    next: u64,
}

/// Scripted upstream repositories. Clones share state.
#[derive(Clone, Default)]
pub struct MockGit {
    state: Arc<Mutex<State>>,
}

fn commit_from_counter(n: u64) -> CommitHash {
    let mut bytes = [0xa5; 20];
    bytes[12..].copy_from_slice(&n.to_be_bytes());
    CommitHash(bytes)
}

impl MockGit {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes a new head for `url` whose tree is exactly `files`.
    pub fn publish(&self, url: &str, files: &[(&str, &str)]) -> CommitHash {
        let commit = {
            let mut state = self.state();
            state.next += 1;
            commit_from_counter(state.next)
        };
        self.publish_with_commit(url, commit, files);
        commit
    }

    /// Like [`MockGit::publish`] with a caller-chosen commit id.
    pub fn publish_with_commit(&self, url: &str, commit: CommitHash, files: &[(&str, &str)]) {
        let tree: Tree = files
            .iter()
            .map(|(path, body)| (PathBuf::from(path), body.as_bytes().to_vec()))
            .collect();
        let mut state = self.state();
        state.trees.insert(commit, tree);
        state.heads.insert(url.to_string(), commit);
    }

    /// Makes every later `sync` of `url` fail with a sync error.
    pub fn fail_sync(&self, url: &str, reason: &str) {
        self.state()
            .failing
            .insert(url.to_string(), reason.to_string());
    }

    pub fn heal(&self, url: &str) {
        self.state().failing.remove(url);
    }

    pub fn head(&self, url: &str) -> Option<CommitHash> {
        self.state().heads.get(url).copied()
    }

    pub fn sync_calls(&self) -> Vec<SyncCall> {
        self.state().syncs.clone()
    }

    fn tree(&self, commit: CommitHash) -> Result<Tree, ApmError> {
        if commit.is_zero() {
            return Ok(Tree::new());
        }
        self.state()
            .trees
            .get(&commit)
            .cloned()
            .ok_or_else(|| ApmError::Sync {
                message: format!("unknown commit {commit}"),
                source: None,
            })
    }
}

fn materialize(local_path: &Path, tree: &Tree) -> std::io::Result<()> {
    match std::fs::remove_dir_all(local_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    std::fs::create_dir_all(local_path)?;
    for (path, body) in tree {
        let target = local_path.join(path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(target, body)?;
    }
    Ok(())
}

impl GitSynchronizer for MockGit {
    fn sync(
        &self,
        url: &str,
        local_path: &Path,
        branch: &str,
        auth: Option<&BasicAuth>,
    ) -> Result<CommitHash, ApmError> {
        let (head, failure) = {
            let mut state = self.state();
            state.syncs.push(SyncCall {
                url: url.to_string(),
                branch: branch.to_string(),
                authenticated: auth.is_some(),
            });
            (
                state.heads.get(url).copied(),
                state.failing.get(url).cloned(),
            )
        };
        if let Some(reason) = failure {
            return Err(ApmError::Sync {
                message: format!("cannot fetch {url}: {reason}"),
                source: None,
            });
        }
        let head = head.ok_or_else(|| ApmError::Sync {
            message: format!("repository {url} not found"),
            source: None,
        })?;

        let tree = self.tree(head)?;
        materialize(local_path, &tree)
            .map_err(|e| ApmError::sync(format!("cannot check out {url}"), e))?;
        tracing::debug!(url, commit = %head, files = tree.len(), "mock checkout");
        Ok(head)
    }

    fn diff(
        &self,
        _local_path: &Path,
        from: CommitHash,
        to: CommitHash,
    ) -> Result<ChangeSet, ApmError> {
        let old = self.tree(from)?;
        let new = self.tree(to)?;
        let mut changes = ChangeSet::default();
        for (path, body) in &new {
            match old.get(path) {
                None => changes.added.push(path.clone()),
                Some(previous) if previous != body => changes.modified.push(path.clone()),
                Some(_) => {}
            }
        }
        changes.removed = old
            .keys()
            .filter(|path| !new.contains_key(*path))
            .cloned()
            .collect();
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://example.com/plugins.git";

    #[test]
    fn sync_writes_head_tree() {
        let git = MockGit::new();
        let head = git.publish(URL, &[("vms/a.yaml", "a"), ("README.md", "hi")]);
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("repo");

        let synced = git.sync(URL, &local, "refs/heads/main", None).unwrap();
        assert_eq!(synced, head);
        assert_eq!(std::fs::read_to_string(local.join("vms/a.yaml")).unwrap(), "a");
        assert_eq!(git.sync_calls().len(), 1);
    }

    #[test]
    fn diff_classifies_paths() {
        let git = MockGit::new();
        let first = git.publish(URL, &[("vms/a.yaml", "a"), ("vms/b.yaml", "b")]);
        let second = git.publish(URL, &[("vms/a.yaml", "a2"), ("vms/c.yaml", "c")]);

        let changes = git.diff(Path::new("."), first, second).unwrap();
        assert_eq!(changes.added, vec![PathBuf::from("vms/c.yaml")]);
        assert_eq!(changes.modified, vec![PathBuf::from("vms/a.yaml")]);
        assert_eq!(changes.removed, vec![PathBuf::from("vms/b.yaml")]);

        let from_zero = git.diff(Path::new("."), CommitHash::ZERO, first).unwrap();
        assert_eq!(from_zero.added.len(), 2);
    }

    #[test]
    fn injected_failure_surfaces_as_sync_error() {
        let git = MockGit::new();
        git.publish(URL, &[]);
        git.fail_sync(URL, "connection refused");
        let dir = tempfile::tempdir().unwrap();
        let err = git.sync(URL, dir.path(), "refs/heads/main", None).unwrap_err();
        assert!(matches!(err, ApmError::Sync { .. }));
        git.heal(URL);
        assert!(git.sync(URL, dir.path(), "refs/heads/main", None).is_ok());
    }
}
