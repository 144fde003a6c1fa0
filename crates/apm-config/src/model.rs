// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for apm.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::fmt;
use std::path::PathBuf;

use apm_core::constants::{CORE_ALIAS, CORE_BRANCH, CORE_URL};
use serde::{Deserialize, Serialize};

/// Top-level apm configuration.
///
/// Every section is optional and falls back to the defaults below.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApmConfig {
    /// Local paths and logging.
    #[serde(default)]
    pub apm: GeneralConfig,

    /// Node admin API used to reload plugins and whitelist subnets.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Credentials for private plugin repositories.
    #[serde(default)]
    pub git: GitConfig,

    /// The repository that is always tracked.
    #[serde(default)]
    pub core: CoreRepoConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Root for the registry database, repository checkouts, and staging.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Where installed plugin binaries are placed.
    #[serde(default = "default_plugin_dir")]
    pub plugin_dir: PathBuf,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            plugin_dir: default_plugin_dir(),
            log_level: default_log_level(),
        }
    }
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    home().join(".apm")
}

fn default_plugin_dir() -> PathBuf {
    home().join(".metalgo").join("build").join("plugins")
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    /// `host:port` of the node's HTTP API.
    #[serde(default = "default_admin_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds.
    #[serde(default = "default_admin_timeout")]
    pub timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            endpoint: default_admin_endpoint(),
            timeout_secs: default_admin_timeout(),
        }
    }
}

fn default_admin_endpoint() -> String {
    "127.0.0.1:9650".to_string()
}

fn default_admin_timeout() -> u64 {
    10
}

/// Basic-auth credentials. Both fields unset means anonymous access.
#[derive(Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GitConfig {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

impl fmt::Debug for GitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CoreRepoConfig {
    #[serde(default = "default_core_alias")]
    pub alias: String,

    #[serde(default = "default_core_url")]
    pub url: String,

    /// Short branch name, e.g. `master`.
    #[serde(default = "default_core_branch")]
    pub branch: String,
}

impl Default for CoreRepoConfig {
    fn default() -> Self {
        Self {
            alias: default_core_alias(),
            url: default_core_url(),
            branch: default_core_branch(),
        }
    }
}

fn default_core_alias() -> String {
    CORE_ALIAS.to_string()
}

fn default_core_url() -> String {
    CORE_URL.to_string()
}

fn default_core_branch() -> String {
    CORE_BRANCH.to_string()
}
