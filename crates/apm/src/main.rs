// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! apm - plugin manager for virtual machine plugins.
//!
//! This is the binary entry point.

use std::path::PathBuf;

use apm::Apm;
use apm_config::{ApmConfig, ConfigError};
use apm_core::ApmError;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

/// apm - install and upgrade virtual machine plugins from git repositories.
#[derive(Parser, Debug)]
#[command(name = "apm", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file only.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Registry, checkouts, and staging directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Where plugin binaries are installed.
    #[arg(long, global = true)]
    plugin_dir: Option<PathBuf>,

    /// `host:port` of the node's admin API.
    #[arg(long, global = true)]
    admin_api_endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start tracking a plugin repository.
    AddRepository {
        /// `organization/repository`
        #[arg(long)]
        alias: String,
        #[arg(long)]
        url: String,
        #[arg(long, default_value = "main")]
        branch: String,
    },
    /// Stop tracking a plugin repository.
    RemoveRepository {
        #[arg(long)]
        alias: String,
    },
    /// Show tracked repositories.
    ListRepositories,
    /// Sync every tracked repository.
    Update,
    /// Install a VM plugin.
    Install {
        /// `plugin` or `organization/repository:plugin`
        #[arg(long)]
        vm: String,
    },
    /// Remove an installed VM plugin.
    Uninstall {
        #[arg(long)]
        vm: String,
    },
    /// Upgrade one VM plugin, or all of them.
    Upgrade {
        #[arg(long)]
        vm: Option<String>,
    },
    /// Install a subnet's VMs and whitelist it on the node.
    JoinSubnet {
        #[arg(long)]
        subnet: String,
    },
    /// Show a VM plugin's definition and install state.
    Info {
        #[arg(long)]
        vm: String,
    },
    /// Show installed plugins.
    ListInstalled,
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("apm={log_level},warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Applies command-line overrides and validates the merged result.
fn apply_overrides(config: &mut ApmConfig, cli: &Cli) -> Result<(), Vec<ConfigError>> {
    if let Some(dir) = &cli.data_dir {
        config.apm.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.plugin_dir {
        config.apm.plugin_dir = dir.clone();
    }
    if let Some(endpoint) = &cli.admin_api_endpoint {
        config.admin.endpoint = endpoint.clone();
    }
    apm_config::validation::validate_config(config)
}

fn main() {
    let cli = Cli::parse();

    let mut config = match apm_config::load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            apm_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    if let Err(errors) = apply_overrides(&mut config, &cli) {
        apm_config::render_errors(&errors);
        std::process::exit(1);
    }
    init_tracing(&config.apm.log_level);

    if let Err(e) = run(&config, cli.command) {
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn run(config: &ApmConfig, command: Commands) -> Result<(), ApmError> {
    let apm = Apm::open(config)?;
    apm.bootstrap()?;

    match command {
        Commands::AddRepository { alias, url, branch } => {
            apm.add_repository(&alias, &url, &branch)?;
            println!("{} {alias}; run `apm update` to sync it", "added".green());
        }
        Commands::RemoveRepository { alias } => {
            apm.remove_repository(&alias)?;
            println!("{} {alias}", "removed".green());
        }
        Commands::ListRepositories => {
            for source in apm.list_repositories()? {
                let commit = if source.commit.is_zero() {
                    "never synced".dimmed().to_string()
                } else {
                    source.commit.to_string()
                };
                println!(
                    "{}  {}  {}  {}",
                    source.alias.bold(),
                    source.url,
                    source.branch,
                    commit
                );
            }
        }
        Commands::Update => {
            apm.update()?;
            println!("{}", "registry up to date".green());
        }
        Commands::Install { vm } => {
            apm.install(&vm)?;
            println!("{} {vm}", "installed".green());
        }
        Commands::Uninstall { vm } => {
            apm.uninstall(&vm)?;
            println!("{} {vm}", "uninstalled".green());
        }
        Commands::Upgrade { vm } => {
            apm.upgrade(vm.as_deref())?;
            println!("{}", "upgrade complete".green());
        }
        Commands::JoinSubnet { subnet } => {
            apm.join_subnet(&subnet)?;
            println!("{} {subnet}", "joined".green());
        }
        Commands::Info { vm } => {
            let info = apm.info(&vm)?;
            let def = &info.definition.definition;
            println!("{}", info.name.to_string().bold());
            println!("  id:          {}", def.id);
            println!("  version:     {}", def.version);
            println!("  homepage:    {}", def.homepage);
            println!("  description: {}", def.description);
            println!("  commit:      {}", info.definition.commit);
            match info.installed {
                Some(installed) => println!(
                    "  installed:   {} ({})",
                    installed.version.to_string().green(),
                    installed.commit
                ),
                None => println!("  installed:   {}", "no".dimmed()),
            }
        }
        Commands::ListInstalled => {
            for (name, installed) in apm.list_installed()? {
                println!("{}  {}  {}", name.bold(), installed.id, installed.version);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn add_repository_defaults_branch() {
        let cli = Cli::parse_from([
            "apm",
            "add-repository",
            "--alias",
            "acme/plugins",
            "--url",
            "https://example.com/acme/plugins.git",
        ]);
        match cli.command {
            Commands::AddRepository { branch, .. } => assert_eq!(branch, "main"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "apm",
            "--data-dir",
            "/tmp/apm-data",
            "--admin-api-endpoint",
            "10.0.0.1:9650",
            "upgrade",
        ]);
        let mut config = ApmConfig::default();
        apply_overrides(&mut config, &cli).unwrap();
        assert_eq!(config.apm.data_dir, PathBuf::from("/tmp/apm-data"));
        assert_eq!(config.admin.endpoint, "10.0.0.1:9650");
        assert!(matches!(cli.command, Commands::Upgrade { vm: None }));
    }

    #[test]
    fn overrides_are_validated() {
        let cli = Cli::parse_from([
            "apm",
            "--admin-api-endpoint",
            "http://10.0.0.1:9650",
            "list-installed",
        ]);
        let mut config = ApmConfig::default();
        let errors = apply_overrides(&mut config, &cli).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ConfigError::Validation { key, .. } if key == "admin.endpoint"
        ));

        let cli = Cli::parse_from(["apm", "--admin-api-endpoint", "", "list-installed"]);
        let mut config = ApmConfig::default();
        assert!(apply_overrides(&mut config, &cli).is_err());
    }
}
