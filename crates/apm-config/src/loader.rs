// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the hierarchy `./apm.toml` > `~/.config/apm/apm.toml` > `/etc/apm/apm.toml`
//! with environment variable overrides via the `APM_` prefix.

#![allow(clippy::result_large_err)]

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ApmConfig;

pub const SYSTEM_CONFIG: &str = "/etc/apm/apm.toml";
pub const LOCAL_CONFIG: &str = "apm.toml";

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("apm").join("apm.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/apm/apm.toml`
/// 3. `<config_dir>/apm/apm.toml`
/// 4. `./apm.toml`
/// 5. `APM_*` environment variables
pub fn load_config() -> Result<ApmConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of the defaults only.
pub fn load_config_from_str(toml_content: &str) -> Result<ApmConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ApmConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ApmConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ApmConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ApmConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Maps `APM_<SECTION>_<KEY>` onto `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys such as
/// `data_dir` contain underscores: `APM_APM_DATA_DIR` must become
/// `apm.data_dir`, not `apm.data.dir`.
fn env_provider() -> Env {
    Env::prefixed("APM_").map(|key| {
        let key_str = key.as_str();
        let mapped = ["apm_", "admin_", "git_", "core_"]
            .iter()
            .find(|section| key_str.starts_with(**section))
            .map(|section| key_str.replacen(section, &format!("{}.", &section[..section.len() - 1]), 1))
            .unwrap_or_else(|| key_str.to_string());
        mapped.into()
    })
}
