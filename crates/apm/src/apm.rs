// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The plugin manager façade.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use apm_admin::AdminClient;
use apm_config::{ApmConfig, CoreRepoConfig};
use apm_core::{
    AdminNotifier, ApmError, ArtifactInstaller, BasicAuth, Definition, GitSynchronizer,
    InstallInfo, QualifiedName, SourceInfo, Vm,
};
use apm_git::Git2Synchronizer;
use apm_installer::ArchiveInstaller;
use apm_storage::{Database, Namespaces, SqliteDatabase, Storage};
use apm_workflow::{
    AddRepository, Context, Executor, Install, JoinSubnet, Layout, RemoveRepository, Uninstall,
    Update, Upgrade, UpgradeVm, Workflow,
};
use tracing::{debug, info};

use crate::resolve::resolve;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// External systems the manager talks to.
pub struct Collaborators {
    pub git: Box<dyn GitSynchronizer + Send + Sync>,
    pub installer: Box<dyn ArtifactInstaller + Send + Sync>,
    pub notifier: Box<dyn AdminNotifier + Send + Sync>,
    pub auth: Option<BasicAuth>,
}

/// Registered definition and install state of one VM plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: QualifiedName,
    pub definition: Definition<Vm>,
    pub installed: Option<InstallInfo>,
}

pub struct Apm {
    layout: Layout,
    namespaces: Namespaces,
    collaborators: Collaborators,
    core: CoreRepoConfig,
    executor: Executor,
}

fn create_dir(path: &Path) -> Result<(), ApmError> {
    std::fs::create_dir_all(path)
        .map_err(|e| ApmError::storage(format!("cannot create {}", path.display()), e))
}

impl Apm {
    /// Binds the registry and collaborators. Only the working directories
    /// are created here; call [`Apm::bootstrap`] before other operations.
    pub fn new(
        layout: Layout,
        db: Arc<dyn Database>,
        collaborators: Collaborators,
        core: CoreRepoConfig,
    ) -> Result<Self, ApmError> {
        create_dir(&layout.repositories_dir())?;
        create_dir(&layout.tmp_dir())?;
        Ok(Self {
            layout,
            namespaces: Namespaces::new(db),
            collaborators,
            core,
            executor: Executor::new(),
        })
    }

    /// Wires the SQLite registry, the git2 synchronizer, the archive
    /// installer, and the admin API client from `config`.
    pub fn open(config: &ApmConfig) -> Result<Self, ApmError> {
        let layout = Layout::new(&config.apm.data_dir, &config.apm.plugin_dir);
        let db = SqliteDatabase::open(&layout.db_path())?;
        let auth = config.git.username.as_ref().map(|username| BasicAuth {
            username: username.clone(),
            password: config.git.password.clone().unwrap_or_default(),
        });
        let collaborators = Collaborators {
            git: Box::new(Git2Synchronizer::new()),
            installer: Box::new(ArchiveInstaller::new(layout.tmp_dir(), DOWNLOAD_TIMEOUT)?),
            notifier: Box::new(AdminClient::new(
                config.admin.endpoint.as_str(),
                Duration::from_secs(config.admin.timeout_secs),
            )?),
            auth,
        };
        debug!(
            data_dir = %layout.data_dir().display(),
            plugin_dir = %layout.plugin_dir().display(),
            "registry opened"
        );
        Self::new(layout, Arc::new(db), collaborators, config.core.clone())
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    fn ctx(&self) -> Context<'_> {
        Context {
            namespaces: &self.namespaces,
            layout: &self.layout,
            git: self.collaborators.git.as_ref(),
            installer: self.collaborators.installer.as_ref(),
            notifier: self.collaborators.notifier.as_ref(),
            auth: self.collaborators.auth.as_ref(),
            executor: &self.executor,
        }
    }

    fn run(&self, workflow: Workflow<'_>) -> Result<(), ApmError> {
        self.executor.execute(workflow)
    }

    /// Registers the core repository when missing and syncs once if it has
    /// never been synced. Safe to call on every start.
    pub fn bootstrap(&self) -> Result<(), ApmError> {
        let sources = self.namespaces.sources();
        let core = match sources.get(self.core.alias.as_bytes())? {
            Some(source) => source,
            None => {
                self.add_repository(&self.core.alias, &self.core.url, &self.core.branch)?;
                sources
                    .get(self.core.alias.as_bytes())?
                    .ok_or_else(|| ApmError::Internal("core repository vanished".into()))?
            }
        };
        if core.commit.is_zero() {
            info!(alias = %core.alias, "core repository has never been synced; updating");
            self.update()?;
        }
        Ok(())
    }

    pub fn add_repository(&self, alias: &str, url: &str, branch: &str) -> Result<(), ApmError> {
        let sources = self.namespaces.sources();
        self.run(Workflow::AddRepository(AddRepository {
            sources: &sources,
            alias,
            url,
            branch,
        }))
    }

    pub fn remove_repository(&self, alias: &str) -> Result<(), ApmError> {
        self.run(Workflow::RemoveRepository(RemoveRepository {
            ctx: self.ctx(),
            alias,
            core_alias: &self.core.alias,
        }))
    }

    /// Tracked repositories in alias order.
    pub fn list_repositories(&self) -> Result<Vec<SourceInfo>, ApmError> {
        self.namespaces
            .sources()
            .iter()?
            .map(|entry| entry.value())
            .collect()
    }

    pub fn update(&self) -> Result<(), ApmError> {
        self.run(Workflow::Update(Update { ctx: self.ctx() }))
    }

    pub fn resolve(&self, name: &str) -> Result<QualifiedName, ApmError> {
        resolve(&self.namespaces.registry(), name)
    }

    pub fn install(&self, name: &str) -> Result<(), ApmError> {
        let name = self.resolve(name)?;
        self.run(Workflow::Install(Install {
            ctx: self.ctx(),
            name,
        }))
    }

    pub fn uninstall(&self, name: &str) -> Result<(), ApmError> {
        let name = self.resolve(name)?;
        self.run(Workflow::Uninstall(Uninstall {
            ctx: self.ctx(),
            name,
        }))
    }

    /// Upgrades one plugin, or every installed plugin when `name` is `None`.
    pub fn upgrade(&self, name: Option<&str>) -> Result<(), ApmError> {
        match name {
            Some(name) => {
                let name = self.resolve(name)?;
                self.run(Workflow::UpgradeVm(UpgradeVm {
                    ctx: self.ctx(),
                    name,
                }))
            }
            None => self.run(Workflow::Upgrade(Upgrade { ctx: self.ctx() })),
        }
    }

    pub fn join_subnet(&self, name: &str) -> Result<(), ApmError> {
        let name = self.resolve(name)?;
        self.run(Workflow::JoinSubnet(JoinSubnet {
            ctx: self.ctx(),
            name,
        }))
    }

    pub fn info(&self, name: &str) -> Result<PluginInfo, ApmError> {
        let name = self.resolve(name)?;
        let definition = self
            .namespaces
            .repository(name.alias())
            .vms
            .get(name.plugin().as_bytes())?
            .ok_or_else(|| ApmError::not_found("vm", name.to_string()))?;
        let installed = self.namespaces.installed().get(&name.key())?;
        Ok(PluginInfo {
            name,
            definition,
            installed,
        })
    }

    /// Installed plugins keyed by qualified name, in name order.
    pub fn list_installed(&self) -> Result<Vec<(String, InstallInfo)>, ApmError> {
        self.namespaces
            .installed()
            .iter()?
            .map(|entry| Ok((entry.key_str(), entry.value()?)))
            .collect()
    }
}
