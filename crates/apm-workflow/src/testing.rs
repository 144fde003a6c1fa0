// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixture for workflow unit tests.

use std::sync::Arc;

use apm_core::{ApmError, CommitHash, InstallInfo, QualifiedName, RepoList, SourceInfo};
use apm_storage::{MemoryDatabase, Namespaces, Storage};
use apm_test_utils::{MockGit, MockInstaller, MockNotifier};
use tempfile::TempDir;

use crate::{AddRepository, Context, Executor, Layout, Update, Workflow};

pub(crate) struct Fixture {
    pub namespaces: Namespaces,
    pub layout: Layout,
    pub git: MockGit,
    pub installer: MockInstaller,
    pub notifier: MockNotifier,
    pub executor: Executor,
    _dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self {
            namespaces: Namespaces::new(Arc::new(MemoryDatabase::new())),
            layout: Layout::new(dir.path().join("data"), dir.path().join("plugins")),
            git: MockGit::new(),
            installer: MockInstaller::new(),
            notifier: MockNotifier::new(),
            executor: Executor::new(),
            _dir: dir,
        }
    }

    pub fn ctx(&self) -> Context<'_> {
        Context {
            namespaces: &self.namespaces,
            layout: &self.layout,
            git: &self.git,
            installer: &self.installer,
            notifier: &self.notifier,
            auth: None,
            executor: &self.executor,
        }
    }

    pub fn url(alias: &str) -> String {
        format!("https://example.com/{alias}.git")
    }

    /// Publishes `files` for `alias` and registers it, unsynced.
    pub fn track(&self, alias: &str, files: &[(&str, &str)]) -> CommitHash {
        let url = Self::url(alias);
        let head = self.git.publish(&url, files);
        AddRepository {
            sources: &self.namespaces.sources(),
            alias,
            url: &url,
            branch: "main",
        }
        .execute()
        .unwrap();
        head
    }

    pub fn publish(&self, alias: &str, files: &[(&str, &str)]) -> CommitHash {
        self.git.publish(&Self::url(alias), files)
    }

    pub fn update(&self) -> Result<(), ApmError> {
        self.executor
            .execute(Workflow::Update(Update { ctx: self.ctx() }))
    }

    pub fn source(&self, alias: &str) -> SourceInfo {
        self.namespaces
            .sources()
            .get(alias.as_bytes())
            .unwrap()
            .unwrap()
    }

    pub fn index(&self, name: &str) -> Option<RepoList> {
        self.namespaces.registry().get(name.as_bytes()).unwrap()
    }

    pub fn installed(&self, name: &str) -> Option<InstallInfo> {
        let name: QualifiedName = name.parse().unwrap();
        self.namespaces.installed().get(&name.key()).unwrap()
    }
}

pub(crate) fn qn(name: &str) -> QualifiedName {
    name.parse().unwrap()
}
