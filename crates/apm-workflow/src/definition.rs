// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of repository file paths to plugin definitions.

use std::path::{Component, Path, PathBuf};

use apm_core::constants::{DEFINITION_EXTENSIONS, SUBNET_DIRS, VM_DIRS};
use apm_core::{ApmError, DefinitionKind, Subnet, Vm};

/// A path that names a definition: `vms/<name>.yaml` or `subnets/<name>.yaml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionPath {
    pub kind: DefinitionKind,
    pub name: String,
}

/// Classifies a repository-relative path. Anything that is not a definition
/// file yields `None`.
pub fn classify(path: &Path) -> Option<DefinitionPath> {
    let mut components = path.components();
    let (Some(Component::Normal(dir)), Some(Component::Normal(file)), None) =
        (components.next(), components.next(), components.next())
    else {
        return None;
    };

    let dir = dir.to_str()?;
    let kind = if VM_DIRS.contains(&dir) {
        DefinitionKind::Vm
    } else if SUBNET_DIRS.contains(&dir) {
        DefinitionKind::Subnet
    } else {
        return None;
    };

    let file = Path::new(file);
    let ext = file.extension()?.to_str()?;
    if !DEFINITION_EXTENSIONS.contains(&ext) {
        return None;
    }
    let name = file.file_stem()?.to_str()?;
    if name.is_empty() || name.starts_with('.') {
        return None;
    }
    Some(DefinitionPath {
        kind,
        name: name.to_string(),
    })
}

/// A decoded definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Vm(Vm),
    Subnet(Subnet),
}

impl Payload {
    pub fn kind(&self) -> DefinitionKind {
        match self {
            Payload::Vm(_) => DefinitionKind::Vm,
            Payload::Subnet(_) => DefinitionKind::Subnet,
        }
    }
}

fn dirs_for(kind: DefinitionKind) -> &'static [&'static str] {
    match kind {
        DefinitionKind::Vm => &VM_DIRS,
        DefinitionKind::Subnet => &SUBNET_DIRS,
    }
}

/// Finds the file that defines `name` in the tree at `root`.
///
/// A repository may spell one definition several ways (`vms/x.yaml`,
/// `vm/x.yml`, ...). The first existing spelling in directory then extension
/// order is authoritative.
pub fn locate(root: &Path, kind: DefinitionKind, name: &str) -> Option<PathBuf> {
    dirs_for(kind)
        .iter()
        .flat_map(|dir| {
            DEFINITION_EXTENSIONS
                .iter()
                .map(move |ext| Path::new(dir).join(format!("{name}.{ext}")))
        })
        .find(|candidate| root.join(candidate).is_file())
}

/// Reads and decodes the definition at `root/path`.
pub fn load(root: &Path, path: &Path, kind: DefinitionKind) -> Result<Payload, ApmError> {
    let bytes = std::fs::read(root.join(path))
        .map_err(|e| ApmError::sync(format!("cannot read {}", path.display()), e))?;
    let malformed = |e: serde_yaml::Error| ApmError::sync(format!("malformed definition {}", path.display()), e);
    match kind {
        DefinitionKind::Vm => Vm::from_yaml(&bytes).map(Payload::Vm).map_err(malformed),
        DefinitionKind::Subnet => Subnet::from_yaml(&bytes)
            .map(Payload::Subnet)
            .map_err(malformed),
    }
}
