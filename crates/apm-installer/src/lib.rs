// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Artifact installer for VM plugins distributed as `.tar.gz` archives.
//!
//! Every install stages in a scratch directory under the data dir's `tmp/`
//! and only the final rename touches the plugin directory, so a failed
//! install never leaves a partial binary behind.

mod archive;

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use apm_core::{ApmError, ArtifactInstaller, Vm};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

pub use archive::{extract_tar_gz, sanitize_relative};

const FILE_SCHEME: &str = "file://";

fn io_err(context: impl Into<String>) -> impl FnOnce(io::Error) -> ApmError {
    let context = context.into();
    move |e| ApmError::install(context, e)
}

fn failed(message: impl Into<String>) -> ApmError {
    ApmError::Install {
        message: message.into(),
        source: None,
    }
}

/// Installs plugin binaries from `.tar.gz` archives over HTTP(S) or `file://`.
pub struct ArchiveInstaller {
    client: reqwest::blocking::Client,
    tmp_dir: PathBuf,
}

impl ArchiveInstaller {
    pub fn new(tmp_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, ApmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("apm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApmError::install("cannot build http client", e))?;
        Ok(Self {
            client,
            tmp_dir: tmp_dir.into(),
        })
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, ApmError> {
        if let Some(path) = url.strip_prefix(FILE_SCHEME) {
            return fs::read(path).map_err(io_err(format!("cannot read {path}")));
        }
        debug!(url, "downloading artifact");
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ApmError::install(format!("download of {url} failed"), e))?;
        let bytes = response
            .bytes()
            .map_err(|e| ApmError::install(format!("download of {url} failed"), e))?;
        Ok(bytes.to_vec())
    }

    fn build(&self, vm: &Vm, root: &Path) -> Result<(), ApmError> {
        if vm.install_script.trim().is_empty() {
            return Ok(());
        }
        let script = sanitize_relative(Path::new(&vm.install_script))?;
        info!(vm = %vm.alias, script = %script.display(), "running install script");
        let status = Command::new("sh")
            .arg(&script)
            .current_dir(root)
            .status()
            .map_err(io_err("cannot run install script"))?;
        if !status.success() {
            return Err(failed(format!(
                "install script {} exited with {status}",
                script.display()
            )));
        }
        Ok(())
    }
}

/// Hex sha256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn verify_checksum(vm: &Vm, bytes: &[u8]) -> Result<(), ApmError> {
    let expected = vm.sha256.trim();
    if expected.is_empty() {
        warn!(vm = %vm.alias, "definition has no sha256, skipping verification");
        return Ok(());
    }
    let actual = sha256_hex(bytes);
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(failed(format!(
            "checksum mismatch for {}: expected {expected}, got {actual}",
            vm.url
        )));
    }
    Ok(())
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn place(binary: &Path, dest: &Path) -> Result<(), ApmError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(io_err(format!("cannot create {}", parent.display())))?;
    }
    let partial = partial_path(dest);
    let placed = fs::copy(binary, &partial)
        .and_then(|_| make_executable(&partial))
        .and_then(|_| fs::rename(&partial, dest));
    if let Err(e) = placed {
        let _ = fs::remove_file(&partial);
        return Err(ApmError::install(
            format!("cannot place binary at {}", dest.display()),
            e,
        ));
    }
    Ok(())
}

impl ArtifactInstaller for ArchiveInstaller {
    fn install(&self, vm: &Vm, dest: &Path) -> Result<(), ApmError> {
        fs::create_dir_all(&self.tmp_dir)
            .map_err(io_err(format!("cannot create {}", self.tmp_dir.display())))?;
        // Dropped on every return path, taking the extracted tree with it.
        let staging = tempfile::Builder::new()
            .prefix(&format!("{}-", vm.id))
            .tempdir_in(&self.tmp_dir)
            .map_err(io_err("cannot create staging directory"))?;

        let bytes = self.download(&vm.url)?;
        verify_checksum(vm, &bytes)?;
        extract_tar_gz(&bytes, staging.path())?;
        self.build(vm, staging.path())?;

        let binary = staging
            .path()
            .join(sanitize_relative(Path::new(&vm.binary_path))?);
        if !binary.is_file() {
            return Err(failed(format!(
                "archive for {} does not contain {}",
                vm.alias, vm.binary_path
            )));
        }
        place(&binary, dest)?;
        info!(vm = %vm.alias, version = %vm.version, dest = %dest.display(), "binary installed");
        Ok(())
    }

    fn remove(&self, dest: &Path) -> Result<(), ApmError> {
        match fs::remove_file(dest) {
            Ok(()) => {
                info!(dest = %dest.display(), "binary removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(dest = %dest.display(), "binary already absent");
                Ok(())
            }
            Err(e) => Err(ApmError::install(
                format!("cannot remove {}", dest.display()),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/plugins/abc")),
            PathBuf::from("/plugins/abc.partial")
        );
    }

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
