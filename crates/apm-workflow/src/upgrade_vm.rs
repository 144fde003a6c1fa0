// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upgrade of a single installed plugin.

use apm_core::{ApmError, Definition, InstallInfo, QualifiedName, Vm};
use apm_storage::Storage;
use tracing::info;

use crate::{Context, Install, Uninstall, Workflow};

/// Reinstalls one plugin when its registered definition moved past the
/// commit it was installed from.
pub struct UpgradeVm<'a> {
    pub ctx: Context<'a>,
    pub name: QualifiedName,
}

/// Install state of one plugin against its registered definition.
pub enum Status {
    Current(InstallInfo),
    Outdated {
        installed: InstallInfo,
        available: Definition<Vm>,
    },
}

impl UpgradeVm<'_> {
    /// Compares the install record with the registered definition.
    pub fn status(&self) -> Result<Status, ApmError> {
        let installed = self
            .ctx
            .namespaces
            .installed()
            .get(&self.name.key())?
            .ok_or_else(|| ApmError::not_found("installed plugin", self.name.to_string()))?;
        let available = self
            .ctx
            .namespaces
            .repository(self.name.alias())
            .vms
            .get(self.name.plugin().as_bytes())?
            .ok_or_else(|| ApmError::not_found("vm", self.name.to_string()))?;

        if installed.commit == available.commit {
            Ok(Status::Current(installed))
        } else {
            Ok(Status::Outdated {
                installed,
                available,
            })
        }
    }

    pub fn execute(&self) -> Result<(), ApmError> {
        let (installed, available) = match self.status()? {
            Status::Current(installed) => {
                info!(name = %self.name, version = %installed.version, "already up to date");
                return Ok(());
            }
            Status::Outdated {
                installed,
                available,
            } => (installed, available),
        };

        let executor = self.ctx.executor;
        executor.execute(Workflow::Uninstall(Uninstall {
            ctx: self.ctx,
            name: self.name.clone(),
        }))?;
        executor.execute(Workflow::Install(Install {
            ctx: self.ctx,
            name: self.name.clone(),
        }))?;

        info!(
            name = %self.name,
            from = %installed.version,
            to = %available.definition.version,
            "upgraded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use apm_test_utils::fixtures::vm_yaml;

    use super::*;
    use crate::testing::{Fixture, qn};

    const ALIAS: &str = "acme/plugins";

    fn installed_fixture() -> Fixture {
        let fx = Fixture::new();
        let vm = vm_yaml("a", "1.0.0");
        fx.track(ALIAS, &[("vms/a.yaml", vm.as_str())]);
        fx.update().unwrap();
        fx.executor
            .execute(Workflow::Install(Install {
                ctx: fx.ctx(),
                name: qn("acme/plugins:a"),
            }))
            .unwrap();
        fx
    }

    fn upgrade(fx: &Fixture) -> Result<(), ApmError> {
        fx.executor.execute(Workflow::UpgradeVm(UpgradeVm {
            ctx: fx.ctx(),
            name: qn("acme/plugins:a"),
        }))
    }

    fn status(fx: &Fixture) -> Status {
        UpgradeVm {
            ctx: fx.ctx(),
            name: qn("acme/plugins:a"),
        }
        .status()
        .unwrap()
    }

    #[test]
    fn status_tracks_the_registered_commit() {
        let fx = installed_fixture();
        assert!(matches!(status(&fx), Status::Current(_)));

        let vm = vm_yaml("a", "2.0.0");
        fx.publish(ALIAS, &[("vms/a.yaml", vm.as_str())]);
        fx.update().unwrap();
        match status(&fx) {
            Status::Outdated {
                installed,
                available,
            } => {
                assert_eq!(installed.version, semver::Version::new(1, 0, 0));
                assert_eq!(available.definition.version, semver::Version::new(2, 0, 0));
            }
            Status::Current(_) => panic!("expected an outdated plugin"),
        }

        upgrade(&fx).unwrap();
        assert!(matches!(status(&fx), Status::Current(_)));
    }

    #[test]
    fn same_commit_is_already_up_to_date() {
        let fx = installed_fixture();
        upgrade(&fx).unwrap();
        assert_eq!(fx.installer.install_count(), 1);
        assert!(fx.installer.removals().is_empty());
    }

    #[test]
    fn newer_definition_is_reinstalled() {
        let fx = installed_fixture();
        let vm = vm_yaml("a", "2.0.0");
        let head = fx.publish(ALIAS, &[("vms/a.yaml", vm.as_str())]);
        fx.update().unwrap();

        upgrade(&fx).unwrap();

        let record = fx.installed("acme/plugins:a").unwrap();
        assert_eq!(record.version, semver::Version::new(2, 0, 0));
        assert_eq!(record.commit, head);
        assert_eq!(fx.installer.install_count(), 2);
        assert_eq!(fx.installer.removals().len(), 1);
        let body = std::fs::read_to_string(fx.layout.artifact_path("a").unwrap()).unwrap();
        assert_eq!(body, "a 2.0.0");
    }

    #[test]
    fn not_installed_is_not_found() {
        let fx = Fixture::new();
        let err = upgrade(&fx).unwrap_err();
        assert!(matches!(err, ApmError::NotFound { ref kind, .. } if kind == "installed plugin"));
    }

    #[test]
    fn definition_gone_upstream_is_not_found() {
        let fx = installed_fixture();
        fx.publish(ALIAS, &[]);
        fx.update().unwrap();
        let err = upgrade(&fx).unwrap_err();
        assert!(matches!(err, ApmError::NotFound { ref kind, .. } if kind == "vm"));
        assert!(fx.installed("acme/plugins:a").is_some());
    }
}
