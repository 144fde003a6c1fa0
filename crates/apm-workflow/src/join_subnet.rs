// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Installation of a subnet's plugins and registration with the local node.

use apm_core::{ApmError, QualifiedName};
use apm_storage::Storage;
use tracing::{info, warn};

use crate::{Context, Install, Workflow};

/// Installs every VM a subnet needs and asks the node to pick them up.
///
/// VMs are looked up in the subnet's own repository. The first install
/// failure aborts the join. An offline node only produces a warning.
pub struct JoinSubnet<'a> {
    pub ctx: Context<'a>,
    pub name: QualifiedName,
}

impl JoinSubnet<'_> {
    pub fn execute(&self) -> Result<(), ApmError> {
        let subnet = self
            .ctx
            .namespaces
            .repository(self.name.alias())
            .subnets
            .get(self.name.plugin().as_bytes())?
            .ok_or_else(|| ApmError::not_found("subnet", self.name.to_string()))?
            .definition;

        for vm in &subnet.vms {
            let name = QualifiedName::new(self.name.alias(), vm.as_str())?;
            self.ctx
                .executor
                .execute(Workflow::Install(Install { ctx: self.ctx, name }))?;
        }

        match self.notify(&subnet.id) {
            Ok(()) => {
                info!(subnet = %self.name, id = %subnet.id, vms = subnet.vms.len(), "joined subnet");
                Ok(())
            }
            Err(e) if e.is_notifier_unavailable() => {
                warn!(
                    subnet = %self.name,
                    id = %subnet.id,
                    error = %e,
                    "node is offline; restart it and whitelist the subnet manually"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn notify(&self, subnet_id: &str) -> Result<(), ApmError> {
        self.ctx.notifier.reload_plugins()?;
        self.ctx.notifier.register_subnet(subnet_id)
    }
}

#[cfg(test)]
mod tests {
    use apm_test_utils::NotifierMode;
    use apm_test_utils::fixtures::{subnet_yaml, vm_yaml};
    use tracing_test::traced_test;

    use super::*;
    use crate::testing::{Fixture, qn};

    const ALIAS: &str = "acme/plugins";

    fn subnet_fixture() -> Fixture {
        let fx = Fixture::new();
        let a = vm_yaml("a", "1.0.0");
        let b = vm_yaml("b", "1.0.0");
        let net = subnet_yaml("net", &["a", "b"]);
        fx.track(
            ALIAS,
            &[
                ("vms/a.yaml", a.as_str()),
                ("vms/b.yaml", b.as_str()),
                ("subnets/net.yaml", net.as_str()),
            ],
        );
        fx.update().unwrap();
        fx
    }

    fn join(fx: &Fixture) -> Result<(), ApmError> {
        fx.executor.execute(Workflow::JoinSubnet(JoinSubnet {
            ctx: fx.ctx(),
            name: qn("acme/plugins:net"),
        }))
    }

    #[test]
    fn installs_every_vm_and_notifies_the_node() {
        let fx = subnet_fixture();
        join(&fx).unwrap();
        assert_eq!(fx.installer.installed_ids(), vec!["a", "b"]);
        assert_eq!(fx.notifier.reloads(), 1);
        assert_eq!(fx.notifier.registered_subnets(), vec!["net-id"]);
    }

    #[test]
    #[traced_test]
    fn offline_node_is_only_a_warning() {
        let fx = subnet_fixture();
        fx.notifier.set_mode(NotifierMode::Offline);
        join(&fx).unwrap();
        assert!(fx.installed("acme/plugins:a").is_some());
        assert!(fx.installed("acme/plugins:b").is_some());
        assert!(logs_contain("node is offline"));
    }

    #[test]
    fn other_notifier_errors_propagate() {
        let fx = subnet_fixture();
        fx.notifier.set_mode(NotifierMode::Failing);
        let err = join(&fx).unwrap_err();
        assert!(matches!(err, ApmError::Notifier { .. }));
    }

    #[test]
    fn first_install_failure_aborts() {
        let fx = subnet_fixture();
        fx.installer.fail_install("a");
        let err = join(&fx).unwrap_err();
        assert!(matches!(err, ApmError::Install { .. }));
        assert!(fx.installed("acme/plugins:b").is_none());
        assert_eq!(fx.notifier.reloads(), 0);
    }

    #[test]
    fn unknown_subnet_is_not_found() {
        let fx = subnet_fixture();
        let err = fx
            .executor
            .execute(Workflow::JoinSubnet(JoinSubnet {
                ctx: fx.ctx(),
                name: qn("acme/plugins:ghost"),
            }))
            .unwrap_err();
        assert!(matches!(err, ApmError::NotFound { ref kind, .. } if kind == "subnet"));
    }
}
