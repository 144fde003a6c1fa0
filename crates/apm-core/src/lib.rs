// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the apm plugin manager.
//!
//! This crate provides the error taxonomy, registry record types, and the
//! collaborator traits shared by every other apm crate.

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{ApmError, BoxError, ItemFailure};
pub use types::{
    CommitHash, Definition, DefinitionKind, InstallInfo, QualifiedName, RepoList, SourceInfo,
    Subnet, Vm,
};

pub use traits::{AdminNotifier, ArtifactInstaller, BasicAuth, ChangeSet, GitSynchronizer};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_info_roundtrips_through_json() {
        let info = SourceInfo {
            alias: constants::CORE_ALIAS.into(),
            url: constants::CORE_URL.into(),
            branch: format!("{}{}", constants::BRANCH_REF_PREFIX, constants::CORE_BRANCH),
            commit: CommitHash::ZERO,
        };
        let json = serde_json::to_vec(&info).unwrap();
        let back: SourceInfo = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, info);
        assert!(back.commit.is_zero());
    }

    #[test]
    fn error_converts_through_box() {
        let err: BoxError = Box::new(ApmError::Internal("x".into()));
        assert_eq!(err.to_string(), "internal error: x");
    }
}
