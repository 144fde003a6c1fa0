// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry records, plugin definitions, and identifier types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

use crate::constants::{ALIAS_DELIMITER, QUALIFIED_NAME_DELIMITER};
use crate::error::ApmError;

/// A git object id. [`CommitHash::ZERO`] marks a repository that has never
/// been synced.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CommitHash(pub [u8; 20]);

impl CommitHash {
    pub const ZERO: CommitHash = CommitHash([0; 20]);

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitHash({self})")
    }
}

impl FromStr for CommitHash {
    type Err = ApmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; 20];
        hex::decode_to_slice(s, &mut out)
            .map_err(|e| ApmError::Validation(format!("invalid commit hash `{s}`: {e}")))?;
        Ok(Self(out))
    }
}

impl Serialize for CommitHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CommitHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Splits an `organization/repository` alias.
pub fn parse_alias(alias: &str) -> Result<(&str, &str), ApmError> {
    match alias.split_once(ALIAS_DELIMITER) {
        Some((org, repo))
            if !org.is_empty()
                && !repo.is_empty()
                && !repo.contains(ALIAS_DELIMITER)
                && !alias.contains(QUALIFIED_NAME_DELIMITER) =>
        {
            Ok((org, repo))
        }
        _ => Err(ApmError::Validation(format!(
            "{alias} is not a valid alias (must be in the form of organization/repository)"
        ))),
    }
}

/// Returns true if `name` carries the `alias:plugin` delimiter.
pub fn is_qualified(name: &str) -> bool {
    name.contains(QUALIFIED_NAME_DELIMITER)
}

/// A fully qualified plugin name, `organization/repository:plugin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    alias: String,
    plugin: String,
}

impl QualifiedName {
    pub fn new(alias: impl Into<String>, plugin: impl Into<String>) -> Result<Self, ApmError> {
        let alias = alias.into();
        let plugin = plugin.into();
        parse_alias(&alias)?;
        if plugin.is_empty() || plugin.contains(QUALIFIED_NAME_DELIMITER) {
            return Err(ApmError::Validation(format!(
                "`{plugin}` is not a valid plugin name"
            )));
        }
        Ok(Self { alias, plugin })
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Registry key bytes for the installed-plugins store.
    pub fn key(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl FromStr for QualifiedName {
    type Err = ApmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(QUALIFIED_NAME_DELIMITER) {
            Some((alias, plugin)) => Self::new(alias, plugin),
            None => Err(ApmError::Validation(format!(
                "{s} is not a fully qualified name (expected organization/repository:plugin)"
            ))),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.alias, QUALIFIED_NAME_DELIMITER, self.plugin)
    }
}

/// A tracked plugin repository and the last commit it was synced to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub alias: String,
    pub url: String,
    pub branch: String,
    pub commit: CommitHash,
}

/// Repositories that publish a definition under one bare plugin name.
///
/// `foo/plugins:x, bar/plugins:x => x: [foo/plugins, bar/plugins]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoList {
    pub repositories: Vec<String>,
}

impl RepoList {
    /// Adds `alias` unless already present. Returns true if it was added.
    pub fn add(&mut self, alias: &str) -> bool {
        if self.contains(alias) {
            return false;
        }
        self.repositories.push(alias.to_string());
        true
    }

    /// Removes `alias`. Returns true if it was present.
    pub fn remove(&mut self, alias: &str) -> bool {
        let before = self.repositories.len();
        self.repositories.retain(|a| a != alias);
        before != self.repositories.len()
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.repositories.iter().any(|a| a == alias)
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

/// Install state of one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallInfo {
    pub id: String,
    pub version: semver::Version,
    /// Definition commit the artifact was materialized from.
    #[serde(default)]
    pub commit: CommitHash,
}

/// A plugin definition alongside the repository commit it was read at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition<T> {
    pub definition: T,
    pub commit: CommitHash,
}

/// Kind of definition file published by a plugin repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DefinitionKind {
    Vm,
    Subnet,
}

/// A virtual machine plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vm {
    pub id: String,
    pub alias: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub maintainers: Vec<String>,
    #[serde(default)]
    pub install_script: String,
    pub binary_path: String,
    pub url: String,
    #[serde(default)]
    pub sha256: String,
    pub version: semver::Version,
}

/// A subnet and the virtual machines it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub id: String,
    pub alias: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub maintainers: Vec<String>,
    #[serde(default)]
    pub vms: Vec<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct VmFile {
    vm: Vm,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SubnetFile {
    subnet: Subnet,
}

impl Vm {
    /// Decodes a `vm:` YAML definition file.
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_slice::<VmFile>(bytes).map(|f| f.vm)
    }
}

impl Subnet {
    /// Decodes a `subnet:` YAML definition file.
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_slice::<SubnetFile>(bytes).map(|f| f.subnet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_hash_hex_roundtrip_through_json() {
        let hash = CommitHash([0xde; 20]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "de".repeat(20)));
        let back: CommitHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn commit_hash_rejects_short_input() {
        assert!("deadbeef".parse::<CommitHash>().is_err());
    }

    #[test]
    fn zero_hash_is_default() {
        assert!(CommitHash::default().is_zero());
        assert!(!CommitHash([1; 20]).is_zero());
    }

    #[test]
    fn parse_alias_accepts_org_repo() {
        assert_eq!(parse_alias("acme/plugins").unwrap(), ("acme", "plugins"));
    }

    #[test]
    fn parse_alias_rejects_malformed() {
        for bad in ["noslash", "a/b/c", "/repo", "org/", "org/repo:x", ""] {
            assert!(parse_alias(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn qualified_name_parses_and_displays() {
        let name: QualifiedName = "org1/repo1:x".parse().unwrap();
        assert_eq!(name.alias(), "org1/repo1");
        assert_eq!(name.plugin(), "x");
        assert_eq!(name.to_string(), "org1/repo1:x");
        assert_eq!(name.key(), b"org1/repo1:x".to_vec());
    }

    #[test]
    fn qualified_name_rejects_missing_plugin() {
        assert!("org/repo:".parse::<QualifiedName>().is_err());
        assert!("org:x".parse::<QualifiedName>().is_err());
        assert!("plain".parse::<QualifiedName>().is_err());
    }

    #[test]
    fn repo_list_add_is_idempotent() {
        let mut list = RepoList::default();
        assert!(list.add("a/b"));
        assert!(!list.add("a/b"));
        assert!(list.add("c/d"));
        assert_eq!(list.repositories, vec!["a/b", "c/d"]);
        assert!(list.remove("a/b"));
        assert!(!list.remove("a/b"));
        assert_eq!(list.repositories, vec!["c/d"]);
    }

    #[test]
    fn install_info_without_commit_defaults_to_zero() {
        let info: InstallInfo =
            serde_json::from_str(r#"{"id":"vm1","version":"1.2.3"}"#).unwrap();
        assert!(info.commit.is_zero());
        assert_eq!(info.version, semver::Version::new(1, 2, 3));
    }

    #[test]
    fn vm_definition_decodes_from_yaml() {
        let yaml = b"vm:
  id: srEXiWaHuhNyGwPUi444Tu47ZEDwxTWrbQiuD7FmgSAQ6X7Dy
  alias: spacesvm
  homepage: https://example.com
  description: key-value storage
  maintainers: [dev@example.com]
  installScript: scripts/build.sh
  binaryPath: build/spacesvm
  url: https://example.com/spacesvm.tar.gz
  sha256: abcd
  version: 0.0.3
";
        let vm = Vm::from_yaml(yaml).unwrap();
        assert_eq!(vm.alias, "spacesvm");
        assert_eq!(vm.binary_path, "build/spacesvm");
        assert_eq!(vm.version, semver::Version::new(0, 0, 3));
    }

    #[test]
    fn subnet_definition_decodes_from_yaml() {
        let yaml = b"subnet:
  id: Ai42MkKqk8yjXFCpoHXw7rdTWSHiKEMqh5h8gbxwjgkCUfkrk
  alias: spaces
  vms: [spacesvm]
";
        let subnet = Subnet::from_yaml(yaml).unwrap();
        assert_eq!(subnet.vms, vec!["spacesvm"]);
    }

    #[test]
    fn malformed_definition_is_an_error() {
        assert!(Vm::from_yaml(b"vm: [not, a, map]").is_err());
        assert!(Vm::from_yaml(b"subnet:\n  id: x\n  alias: y\n").is_err());
    }

    #[test]
    fn definition_kind_parses_lowercase() {
        assert_eq!("vm".parse::<DefinitionKind>().unwrap(), DefinitionKind::Vm);
        assert_eq!(DefinitionKind::Subnet.to_string(), "subnet");
    }

    proptest::proptest! {
        #[test]
        fn qualified_name_display_parses_back(
            org in "[A-Za-z0-9_-]{1,12}",
            repo in "[A-Za-z0-9_.-]{1,12}",
            plugin in "[A-Za-z0-9_.-]{1,12}",
        ) {
            let name = QualifiedName::new(format!("{org}/{repo}"), plugin.clone()).unwrap();
            let parsed: QualifiedName = name.to_string().parse().unwrap();
            proptest::prop_assert_eq!(parsed.plugin(), plugin.as_str());
            proptest::prop_assert_eq!(parsed, name);
        }
    }
}
