// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin repository synchronization over libgit2.
//!
//! The first sync of a repository initialises an empty working tree and adds
//! `origin`; every sync then fetches the tracked branch and force-checks-out
//! its tip, so the working tree always mirrors the remote exactly.

use std::path::{Path, PathBuf};

use apm_core::{ApmError, BasicAuth, ChangeSet, CommitHash, GitSynchronizer};
use apm_core::constants::BRANCH_REF_PREFIX;
use git2::build::CheckoutBuilder;
use git2::{Cred, Delta, FetchOptions, Oid, RemoteCallbacks, Repository};
use tracing::{debug, info};

const REMOTE: &str = "origin";

fn git_err(context: impl Into<String>) -> impl FnOnce(git2::Error) -> ApmError {
    let context = context.into();
    move |e| ApmError::sync(context, e)
}

fn to_hash(oid: Oid) -> CommitHash {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(oid.as_bytes());
    CommitHash(bytes)
}

fn to_oid(hash: CommitHash) -> Result<Oid, ApmError> {
    Oid::from_bytes(hash.as_bytes()).map_err(git_err(format!("invalid object id {hash}")))
}

fn tree_of(repo: &Repository, hash: CommitHash) -> Result<git2::Tree<'_>, ApmError> {
    repo.find_commit(to_oid(hash)?)
        .and_then(|c| c.tree())
        .map_err(git_err(format!("commit {hash} not found")))
}

/// [`GitSynchronizer`] backed by the `git2` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Synchronizer;

impl Git2Synchronizer {
    pub fn new() -> Self {
        Self
    }

    fn open_or_init(url: &str, local_path: &Path) -> Result<Repository, ApmError> {
        let repo = match Repository::open(local_path) {
            Ok(repo) => repo,
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                debug!(path = %local_path.display(), "initialising working tree");
                std::fs::create_dir_all(local_path).map_err(|e| {
                    ApmError::sync(format!("cannot create {}", local_path.display()), e)
                })?;
                Repository::init(local_path).map_err(git_err(format!(
                    "cannot initialise {}",
                    local_path.display()
                )))?
            }
            Err(e) => {
                return Err(ApmError::sync(
                    format!("cannot open {}", local_path.display()),
                    e,
                ));
            }
        };

        match repo.find_remote(REMOTE) {
            Ok(remote) if remote.url() == Some(url) => {}
            Ok(_) => repo
                .remote_set_url(REMOTE, url)
                .map_err(git_err("cannot update remote url"))?,
            Err(_) => {
                repo.remote(REMOTE, url)
                    .map_err(git_err("cannot add remote"))?;
            }
        }
        Ok(repo)
    }
}

fn fetch_options(auth: Option<&BasicAuth>) -> FetchOptions<'_> {
    let mut callbacks = RemoteCallbacks::new();
    if let Some(auth) = auth {
        let mut offered = false;
        callbacks.credentials(move |_url, _username, _allowed| {
            // libgit2 keeps asking while the server rejects; offer once.
            if offered {
                return Err(git2::Error::from_str("credentials rejected"));
            }
            offered = true;
            Cred::userpass_plaintext(&auth.username, &auth.password)
        });
    }
    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);
    options
}

impl GitSynchronizer for Git2Synchronizer {
    fn sync(
        &self,
        url: &str,
        local_path: &Path,
        branch: &str,
        auth: Option<&BasicAuth>,
    ) -> Result<CommitHash, ApmError> {
        let short = branch.strip_prefix(BRANCH_REF_PREFIX).unwrap_or(branch);
        let repo = Self::open_or_init(url, local_path)?;
        let tracking = format!("refs/remotes/{REMOTE}/{short}");
        let refspec = format!("+{BRANCH_REF_PREFIX}{short}:{tracking}");

        let mut remote = repo
            .find_remote(REMOTE)
            .map_err(git_err("cannot find remote"))?;
        remote
            .fetch(&[refspec.as_str()], Some(&mut fetch_options(auth)), None)
            .map_err(git_err(format!("failed to fetch {short} from {url}")))?;

        let commit = repo
            .find_reference(&tracking)
            .and_then(|r| r.peel_to_commit())
            .map_err(git_err(format!("branch {short} not found at {url}")))?;

        let mut checkout = CheckoutBuilder::new();
        checkout.force().remove_untracked(true);
        repo.checkout_tree(commit.as_object(), Some(&mut checkout))
            .map_err(git_err("checkout failed"))?;
        repo.set_head_detached(commit.id())
            .map_err(git_err("cannot move HEAD"))?;

        let hash = to_hash(commit.id());
        info!(url, branch = short, commit = %hash, "repository synced");
        Ok(hash)
    }

    fn diff(
        &self,
        local_path: &Path,
        from: CommitHash,
        to: CommitHash,
    ) -> Result<ChangeSet, ApmError> {
        let repo = Repository::open(local_path)
            .map_err(git_err(format!("cannot open {}", local_path.display())))?;
        let new_tree = tree_of(&repo, to)?;
        let old_tree = if from.is_zero() {
            None
        } else {
            Some(tree_of(&repo, from)?)
        };

        let diff = repo
            .diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), None)
            .map_err(git_err("cannot diff trees"))?;

        let mut changes = ChangeSet::default();
        for delta in diff.deltas() {
            let old: Option<PathBuf> = delta.old_file().path().map(Path::to_path_buf);
            let new: Option<PathBuf> = delta.new_file().path().map(Path::to_path_buf);
            match delta.status() {
                Delta::Added | Delta::Copied => changes.added.extend(new),
                Delta::Deleted => changes.removed.extend(old),
                Delta::Modified | Delta::Typechange => changes.modified.extend(new),
                Delta::Renamed => {
                    changes.removed.extend(old);
                    changes.added.extend(new);
                }
                _ => {}
            }
        }
        debug!(
            %from,
            %to,
            added = changes.added.len(),
            modified = changes.modified.len(),
            removed = changes.removed.len(),
            "computed diff"
        );
        Ok(changes)
    }
}
