// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete [`Apm`] over an in-memory database and
//! a scratch data directory, wired to mock collaborators that stay reachable
//! through the harness for scripting and assertions.

use std::path::PathBuf;
use std::sync::Arc;

use apm::{Apm, Collaborators};
use apm_config::CoreRepoConfig;
use apm_core::{ApmError, BasicAuth, CommitHash};
use apm_storage::{Database, MemoryDatabase};
use apm_workflow::Layout;

use crate::fixtures::vm_yaml;
use crate::mock_git::MockGit;
use crate::mock_installer::MockInstaller;
use crate::mock_notifier::{MockNotifier, NotifierMode};

/// Url of the core repository inside the harness.
pub const CORE_URL: &str = "https://example.com/core/plugins.git";
pub const CORE_ALIAS: &str = "core/plugins";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    core_files: Vec<(String, String)>,
    notifier_mode: NotifierMode,
    auth: Option<BasicAuth>,
    bootstrap: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            core_files: vec![("vms/corevm.yaml".into(), vm_yaml("corevm", "1.0.0"))],
            notifier_mode: NotifierMode::Online,
            auth: None,
            bootstrap: true,
        }
    }

    /// Replaces the core repository's initial tree.
    pub fn with_core_files(mut self, files: &[(&str, &str)]) -> Self {
        self.core_files = files
            .iter()
            .map(|(path, body)| (path.to_string(), body.to_string()))
            .collect();
        self
    }

    pub fn with_notifier(mut self, mode: NotifierMode) -> Self {
        self.notifier_mode = mode;
        self
    }

    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.auth = Some(BasicAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Skips the bootstrap pass so tests can observe a fresh registry.
    pub fn without_bootstrap(mut self) -> Self {
        self.bootstrap = false;
        self
    }

    pub fn build(self) -> Result<TestHarness, ApmError> {
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| ApmError::storage("cannot create temp dir", e))?;
        let layout = Layout::new(temp_dir.path().join("data"), temp_dir.path().join("plugins"));

        let git = MockGit::new();
        let files: Vec<(&str, &str)> = self
            .core_files
            .iter()
            .map(|(p, b)| (p.as_str(), b.as_str()))
            .collect();
        git.publish(CORE_URL, &files);

        let installer = MockInstaller::new();
        let notifier = MockNotifier::with_mode(self.notifier_mode);
        let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());

        let apm = Apm::new(
            layout,
            db.clone(),
            Collaborators {
                git: Box::new(git.clone()),
                installer: Box::new(installer.clone()),
                notifier: Box::new(notifier.clone()),
                auth: self.auth,
            },
            CoreRepoConfig {
                alias: CORE_ALIAS.into(),
                url: CORE_URL.into(),
                branch: "master".into(),
            },
        )?;
        if self.bootstrap {
            apm.bootstrap()?;
        }

        Ok(TestHarness {
            apm,
            git,
            installer,
            notifier,
            db,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete apm environment for integration testing.
pub struct TestHarness {
    pub apm: Apm,
    pub git: MockGit,
    pub installer: MockInstaller,
    pub notifier: MockNotifier,
    pub db: Arc<dyn Database>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Conventional upstream url for a test alias.
    pub fn url_for(alias: &str) -> String {
        format!("https://example.com/{alias}.git")
    }

    /// Publishes `files` upstream for `alias` and starts tracking it.
    pub fn add_repository(
        &self,
        alias: &str,
        files: &[(&str, &str)],
    ) -> Result<CommitHash, ApmError> {
        let url = Self::url_for(alias);
        let head = self.git.publish(&url, files);
        self.apm.add_repository(alias, &url, "main")?;
        Ok(head)
    }

    /// Replaces `alias`'s upstream tree with `files`.
    pub fn publish(&self, alias: &str, files: &[(&str, &str)]) -> CommitHash {
        self.git.publish(&Self::url_for(alias), files)
    }

    pub fn artifact(&self, vm_id: &str) -> PathBuf {
        self.apm.layout().plugin_dir().join(vm_id)
    }
}
