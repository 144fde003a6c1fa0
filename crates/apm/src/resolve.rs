// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bare plugin name resolution through the alias index.

use apm_core::types::is_qualified;
use apm_core::{ApmError, QualifiedName, RepoList};
use apm_storage::Storage;

/// Turns `name` into a fully qualified name.
///
/// `org/repo:plugin` passes through after validation. A bare `plugin` must be
/// published by exactly one tracked repository.
pub fn resolve(registry: &dyn Storage<RepoList>, name: &str) -> Result<QualifiedName, ApmError> {
    if is_qualified(name) {
        return name.parse();
    }

    let list = registry
        .get(name.as_bytes())?
        .filter(|list| !list.is_empty())
        .ok_or_else(|| ApmError::not_found("plugin", name))?;
    match list.repositories.as_slice() {
        [alias] => QualifiedName::new(alias.as_str(), name),
        _ => Err(ApmError::AmbiguousName {
            name: name.to_string(),
            candidates: list.repositories.clone(),
        }),
    }
}
