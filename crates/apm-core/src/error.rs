// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the apm plugin manager.

use std::fmt;

use thiserror::Error;

/// Boxed source error carried by the collaborator-facing variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across storage, workflows, and collaborators.
#[derive(Debug, Error)]
pub enum ApmError {
    /// Malformed alias, plugin name, or other user-supplied identifier.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Unknown alias, plugin, or registry key.
    #[error("{kind} not found: {name}")]
    NotFound { kind: String, name: String },

    /// Duplicate registration.
    #[error("{kind} {name} is already registered")]
    AlreadyExists { kind: String, name: String },

    /// A bare plugin name is defined by more than one repository.
    #[error(
        "more than one match found for {name}, use a fully qualified name. Matches: {}",
        .candidates.join(", ")
    )]
    AmbiguousName {
        name: String,
        candidates: Vec<String>,
    },

    /// Key-value read/write failure or a record that does not decode.
    #[error("storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Git transport or diff failure, or a malformed definition file.
    #[error("sync error: {message}")]
    Sync {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Artifact materialization or removal failure.
    #[error("install error: {message}")]
    Install {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The host process could not be reached. Callers may downgrade this.
    #[error("node at {endpoint} is offline")]
    NotifierUnavailable { endpoint: String },

    /// The host process was reachable but rejected the request.
    #[error("admin api error: {message}")]
    Notifier {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Configuration errors surfaced after loading.
    #[error("configuration error: {0}")]
    Config(String),

    /// A batch operation finished with one or more per-item failures.
    #[error("{operation} failed for {} item(s): {}", .failures.len(), FailureList(.failures))]
    Aggregate {
        operation: String,
        failures: Vec<ItemFailure>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// One failed item of a batch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub item: String,
    pub reason: String,
}

struct FailureList<'a>(&'a [ItemFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} ({})", failure.item, failure.reason)?;
        }
        Ok(())
    }
}

impl ApmError {
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn already_exists(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn storage(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn sync(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Sync {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn install(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Install {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true for the recoverable "host offline" condition.
    pub fn is_notifier_unavailable(&self) -> bool {
        matches!(self, Self::NotifierUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_name_lists_candidates() {
        let err = ApmError::AmbiguousName {
            name: "x".into(),
            candidates: vec!["org1/repo1".into(), "org2/repo2".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("org1/repo1"));
        assert!(msg.contains("org2/repo2"));
    }

    #[test]
    fn aggregate_formats_every_failure() {
        let err = ApmError::Aggregate {
            operation: "upgrade".into(),
            failures: vec![
                ItemFailure {
                    item: "a/b:one".into(),
                    reason: "boom".into(),
                },
                ItemFailure {
                    item: "a/b:two".into(),
                    reason: "bang".into(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "upgrade failed for 2 item(s): a/b:one (boom); a/b:two (bang)"
        );
    }

    #[test]
    fn notifier_unavailable_is_distinguished() {
        let offline = ApmError::NotifierUnavailable {
            endpoint: "127.0.0.1:9650".into(),
        };
        assert!(offline.is_notifier_unavailable());
        assert!(!ApmError::Internal("x".into()).is_notifier_unavailable());
    }
}
