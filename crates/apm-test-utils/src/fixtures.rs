// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML definition file bodies.

/// A `vm:` definition file whose artifact id equals `name`.
pub fn vm_yaml(name: &str, version: &str) -> String {
    format!(
        "vm:\n  id: {name}\n  alias: {name}\n  homepage: https://example.com/{name}\n  \
         description: test vm {name}\n  maintainers:\n    - dev@example.com\n  \
         installScript: \"\"\n  binaryPath: build/{name}\n  \
         url: https://example.com/{name}.tar.gz\n  sha256: \"\"\n  version: {version}\n"
    )
}

/// A `subnet:` definition file listing `vms` by bare name.
pub fn subnet_yaml(name: &str, vms: &[&str]) -> String {
    let mut body = format!(
        "subnet:\n  id: {name}-id\n  alias: {name}\n  homepage: https://example.com/{name}\n  \
         description: test subnet {name}\n  maintainers:\n    - dev@example.com\n  vms:\n"
    );
    for vm in vms {
        body.push_str(&format!("    - {vm}\n"));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use apm_core::{Subnet, Vm};

    #[test]
    fn vm_fixture_decodes() {
        let vm = Vm::from_yaml(vm_yaml("spacesvm", "1.2.3").as_bytes()).unwrap();
        assert_eq!(vm.id, "spacesvm");
        assert_eq!(vm.version, semver::Version::new(1, 2, 3));
        assert_eq!(vm.binary_path, "build/spacesvm");
    }

    #[test]
    fn subnet_fixture_decodes() {
        let subnet = Subnet::from_yaml(subnet_yaml("spaces", &["spacesvm", "other"]).as_bytes())
            .unwrap();
        assert_eq!(subnet.id, "spaces-id");
        assert_eq!(subnet.vms, vec!["spacesvm", "other"]);
    }
}
