// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: non-empty paths, a
//! well-formed core alias, a usable admin endpoint, and complete credentials.

use std::str::FromStr;

use crate::diagnostic::ConfigError;
use crate::model::ApmConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Validate a deserialized configuration.
///
/// Collects every violation rather than stopping at the first.
pub fn validate_config(config: &ApmConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.apm.data_dir.as_os_str().is_empty() {
        errors.push(invalid("apm.data_dir", "must not be empty"));
    }
    if config.apm.plugin_dir.as_os_str().is_empty() {
        errors.push(invalid("apm.plugin_dir", "must not be empty"));
    }
    if !LOG_LEVELS.contains(&config.apm.log_level.to_ascii_lowercase().as_str()) {
        errors.push(invalid(
            "apm.log_level",
            format!(
                "`{}` is not one of {}",
                config.apm.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    let endpoint = config.admin.endpoint.trim();
    if endpoint.is_empty() {
        errors.push(invalid("admin.endpoint", "must not be empty"));
    } else if endpoint.contains("://") || endpoint.contains('/') {
        errors.push(invalid(
            "admin.endpoint",
            format!("`{endpoint}` must be host:port without a scheme or path"),
        ));
    }
    if config.admin.timeout_secs == 0 {
        errors.push(invalid("admin.timeout_secs", "must be greater than zero"));
    }

    if config.git.password.is_some() && config.git.username.is_none() {
        errors.push(invalid("git.password", "is set but git.username is not"));
    }

    if let Err(e) = apm_core::types::parse_alias(&config.core.alias) {
        errors.push(invalid("core.alias", e.to_string()));
    }
    if config.core.url.trim().is_empty() {
        errors.push(invalid("core.url", "must not be empty"));
    }
    if config.core.branch.trim().is_empty() {
        errors.push(invalid("core.branch", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parses a log level the same way validation accepts it.
pub fn parse_log_level(level: &str) -> Option<tracing::Level> {
    tracing::Level::from_str(level).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&ApmConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_violation() {
        let mut config = ApmConfig::default();
        config.apm.data_dir = PathBuf::new();
        config.admin.timeout_secs = 0;
        config.core.alias = "not-an-alias".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn rejects_endpoint_with_scheme() {
        let mut config = ApmConfig::default();
        config.admin.endpoint = "http://127.0.0.1:9650".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("admin.endpoint"));
    }

    #[test]
    fn rejects_password_without_username() {
        let mut config = ApmConfig::default();
        config.git.password = Some("token".into());
        assert!(validate_config(&config).is_err());
        config.git.username = Some("bot".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = ApmConfig::default();
        config.apm.log_level = "loud".into();
        assert!(validate_config(&config).is_err());
        assert_eq!(parse_log_level("DEBUG"), Some(tracing::Level::DEBUG));
    }
}
