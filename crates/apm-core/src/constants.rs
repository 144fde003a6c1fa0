// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Well-known names, delimiters, and on-disk layout.

/// Alias of the repository that is always tracked and cannot be removed.
pub const CORE_ALIAS: &str = "MetalBlockchain/metal-plugins-core";
pub const CORE_URL: &str = "https://github.com/MetalBlockchain/metal-plugins-core.git";
pub const CORE_BRANCH: &str = "master";

/// Separates the repository alias from the plugin name, `org/repo:plugin`.
pub const QUALIFIED_NAME_DELIMITER: char = ':';
/// Separates organization from repository inside an alias.
pub const ALIAS_DELIMITER: char = '/';

pub const DB_DIR: &str = "db";
pub const DB_FILE: &str = "registry.db";
pub const REPOSITORIES_DIR: &str = "repositories";
pub const TMP_DIR: &str = "tmp";

pub const VM_DIRS: [&str; 2] = ["vms", "vm"];
pub const SUBNET_DIRS: [&str; 2] = ["subnets", "subnet"];
pub const DEFINITION_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Prefix of the full reference name stored in `SourceInfo.branch`.
pub const BRANCH_REF_PREFIX: &str = "refs/heads/";
