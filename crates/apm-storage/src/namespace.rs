// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Derives the registry's typed stores from one root database.

use std::sync::Arc;

use apm_core::{Definition, InstallInfo, RepoList, SourceInfo, Subnet, Vm};

use crate::database::Database;
use crate::prefix::PrefixDatabase;
use crate::typed::DbStorage;

const SOURCES: &str = "sources";
const INSTALLED: &str = "installed";
const REGISTRY: &str = "registry";
const REPOSITORIES: &str = "repositories";
const VMS: &str = "vms";
const SUBNETS: &str = "subnets";

/// Definition stores owned by one tracked repository.
#[derive(Clone)]
pub struct Repository {
    pub vms: DbStorage<Definition<Vm>>,
    pub subnets: DbStorage<Definition<Subnet>>,
}

/// Factory for every namespaced store in the registry.
///
/// All stores share the same root, so a `WriteBatch` staged across several
/// of them commits atomically through any one.
#[derive(Clone)]
pub struct Namespaces {
    root: Arc<dyn Database>,
}

impl Namespaces {
    pub fn new(root: Arc<dyn Database>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Arc<dyn Database> {
        &self.root
    }

    fn scoped(&self, namespace: &str) -> Arc<dyn Database> {
        Arc::new(PrefixDatabase::new(self.root.clone(), namespace))
    }

    /// Tracked repositories, keyed by alias.
    pub fn sources(&self) -> DbStorage<SourceInfo> {
        DbStorage::new(self.scoped(SOURCES))
    }

    /// Install state, keyed by qualified name.
    pub fn installed(&self) -> DbStorage<InstallInfo> {
        DbStorage::new(self.scoped(INSTALLED))
    }

    /// Alias index, keyed by bare plugin name.
    pub fn registry(&self) -> DbStorage<RepoList> {
        DbStorage::new(self.scoped(REGISTRY))
    }

    /// Definitions published by `alias`, keyed by plugin name.
    pub fn repository(&self, alias: &str) -> Repository {
        let repos: Arc<dyn Database> = self.scoped(REPOSITORIES);
        let repo: Arc<dyn Database> = Arc::new(PrefixDatabase::new(repos, alias));
        Repository {
            vms: DbStorage::new(Arc::new(PrefixDatabase::new(repo.clone(), VMS))),
            subnets: DbStorage::new(Arc::new(PrefixDatabase::new(repo, SUBNETS))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryDatabase, WriteBatch};
    use crate::typed::Storage;
    use apm_core::CommitHash;

    fn vm(id: &str) -> Definition<Vm> {
        Definition {
            definition: Vm {
                id: id.into(),
                alias: id.into(),
                homepage: String::new(),
                description: String::new(),
                maintainers: vec![],
                install_script: String::new(),
                binary_path: "build/vm".into(),
                url: "https://example.com/vm.tar.gz".into(),
                sha256: String::new(),
                version: semver::Version::new(1, 0, 0),
            },
            commit: CommitHash([7; 20]),
        }
    }

    #[test]
    fn repositories_are_isolated() {
        let ns = Namespaces::new(Arc::new(MemoryDatabase::new()));
        let a = ns.repository("org/a");
        let b = ns.repository("org/b");
        a.vms.put(b"x", &vm("a-x")).unwrap();
        assert!(a.vms.has(b"x").unwrap());
        assert!(!b.vms.has(b"x").unwrap());
        assert!(!a.subnets.has(b"x").unwrap());
        assert_eq!(b.vms.iter().unwrap().count(), 0);
    }

    #[test]
    fn batch_spans_namespaces() {
        let ns = Namespaces::new(Arc::new(MemoryDatabase::new()));
        let repo = ns.repository("org/a");
        let registry = ns.registry();
        let mut batch = WriteBatch::new();
        repo.vms.stage_put(&mut batch, b"x", &vm("x")).unwrap();
        registry
            .stage_put(
                &mut batch,
                b"x",
                &RepoList {
                    repositories: vec!["org/a".into()],
                },
            )
            .unwrap();
        ns.sources().commit(batch).unwrap();

        assert_eq!(repo.vms.get(b"x").unwrap().unwrap().definition.id, "x");
        assert!(registry.get(b"x").unwrap().unwrap().contains("org/a"));
    }
}
