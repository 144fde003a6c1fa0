// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for apm.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! a system/user/local file hierarchy, `APM_*` environment overrides, and miette
//! diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use apm_config::load_and_validate;
//!
//! let config = load_and_validate(None).expect("config errors");
//! println!("plugins go to {}", config.apm.plugin_dir.display());
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{AdminConfig, ApmConfig, CoreRepoConfig, GeneralConfig, GitConfig};

/// Load and validate configuration.
///
/// With `explicit` set, only that file (plus environment overrides) is read;
/// otherwise the full hierarchy is merged.
pub fn load_and_validate(explicit: Option<&Path>) -> Result<ApmConfig, Vec<ConfigError>> {
    let loaded = match explicit {
        Some(path) => loader::load_config_from_path(path),
        None => loader::load_config(),
    };
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = collect_toml_sources(explicit);
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<ApmConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Reads the TOML files that may have contributed to a failed load so
/// diagnostics can point into them.
fn collect_toml_sources(explicit: Option<&Path>) -> Vec<(String, String)> {
    let candidates: Vec<std::path::PathBuf> = match explicit {
        Some(path) => vec![path.to_path_buf()],
        None => {
            let mut paths = vec![Path::new(loader::SYSTEM_CONFIG).to_path_buf()];
            paths.extend(loader::user_config_path());
            paths.push(
                std::env::current_dir()
                    .map(|d| d.join(loader::LOCAL_CONFIG))
                    .unwrap_or_else(|_| loader::LOCAL_CONFIG.into()),
            );
            paths
        }
    };

    candidates
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), content))
        })
        .collect()
}
