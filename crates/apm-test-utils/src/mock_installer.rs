// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Artifact installer that writes a placeholder file instead of downloading.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use apm_core::{ApmError, ArtifactInstaller, Vm};

#[derive(Default)]
struct State {
    installs: Vec<(String, PathBuf)>,
    removals: Vec<PathBuf>,
    failing: HashSet<String>,
}

/// Writes `<id> <version>` to the destination. Clones share state.
#[derive(Clone, Default)]
pub struct MockInstaller {
    state: Arc<Mutex<State>>,
}

impl MockInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes installs of the VM with this id fail.
    pub fn fail_install(&self, vm_id: &str) {
        self.state().failing.insert(vm_id.to_string());
    }

    /// VM ids in install order.
    pub fn installed_ids(&self) -> Vec<String> {
        self.state().installs.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn install_count(&self) -> usize {
        self.state().installs.len()
    }

    pub fn removals(&self) -> Vec<PathBuf> {
        self.state().removals.clone()
    }
}

impl ArtifactInstaller for MockInstaller {
    fn install(&self, vm: &Vm, dest: &Path) -> Result<(), ApmError> {
        if self.state().failing.contains(&vm.id) {
            return Err(ApmError::Install {
                message: format!("download of {} failed", vm.url),
                source: None,
            });
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ApmError::install("cannot create plugin dir", e))?;
        }
        std::fs::write(dest, format!("{} {}", vm.id, vm.version))
            .map_err(|e| ApmError::install(format!("cannot write {}", dest.display()), e))?;
        self.state()
            .installs
            .push((vm.id.clone(), dest.to_path_buf()));
        Ok(())
    }

    fn remove(&self, dest: &Path) -> Result<(), ApmError> {
        match std::fs::remove_file(dest) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ApmError::install(
                    format!("cannot remove {}", dest.display()),
                    e,
                ));
            }
        }
        self.state().removals.push(dest.to_path_buf());
        Ok(())
    }
}
