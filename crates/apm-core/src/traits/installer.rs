// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Artifact installer contract.

use std::path::Path;

use crate::error::ApmError;
use crate::types::Vm;

/// Materializes and removes plugin binaries on disk.
pub trait ArtifactInstaller {
    /// Places the binary described by `vm` at `dest`.
    ///
    /// On failure nothing is left at `dest` and any staging files are
    /// cleaned up.
    fn install(&self, vm: &Vm, dest: &Path) -> Result<(), ApmError>;

    /// Deletes the binary at `dest`. A missing file is not an error.
    fn remove(&self, dest: &Path) -> Result<(), ApmError>;
}
