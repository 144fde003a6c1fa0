// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Safe `.tar.gz` extraction.

use std::fs;
use std::path::{Component, Path, PathBuf};

use apm_core::ApmError;
use tracing::warn;

/// Rejects absolute paths and `..`; drops `.` components.
pub fn sanitize_relative(path: &Path) -> Result<PathBuf, ApmError> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ApmError::Install {
                    message: format!("unsafe path component in {}", path.display()),
                    source: None,
                });
            }
        }
    }
    Ok(clean)
}

/// Unpacks a gzip-compressed tarball into `dest`.
///
/// Links are skipped and any entry that would land outside `dest` is an
/// error.
pub fn extract_tar_gz(bytes: &[u8], dest: &Path) -> Result<(), ApmError> {
    let extract_err = |e: std::io::Error| ApmError::install("cannot extract archive", e);

    fs::create_dir_all(dest).map_err(extract_err)?;
    let root = fs::canonicalize(dest).map_err(extract_err)?;
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(bytes));

    for entry in archive.entries().map_err(extract_err)? {
        let mut entry = entry.map_err(extract_err)?;
        let kind = entry.header().entry_type();
        if kind.is_symlink() || kind.is_hard_link() {
            warn!("skipping link entry in archive");
            continue;
        }

        let raw = entry.path().map_err(extract_err)?.into_owned();
        let rel = sanitize_relative(&raw)?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        let target = root.join(&rel);

        if kind.is_dir() {
            fs::create_dir_all(&target).map_err(extract_err)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(extract_err)?;
            let parent = fs::canonicalize(parent).map_err(extract_err)?;
            if !parent.starts_with(&root) {
                return Err(ApmError::Install {
                    message: format!("archive entry {} escapes staging dir", raw.display()),
                    source: None,
                });
            }
        }
        entry.unpack(&target).map_err(extract_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_rejects_parent_dir() {
        assert!(sanitize_relative(Path::new("../etc/passwd")).is_err());
        assert!(sanitize_relative(Path::new("build/../../x")).is_err());
    }

    #[test]
    fn sanitize_rejects_absolute() {
        assert!(sanitize_relative(Path::new("/usr/bin/vm")).is_err());
    }

    #[test]
    fn sanitize_strips_cur_dir() {
        assert_eq!(
            sanitize_relative(Path::new("./build/./vm")).unwrap(),
            PathBuf::from("build/vm")
        );
    }
}
