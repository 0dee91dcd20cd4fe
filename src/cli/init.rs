// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Init command - write a starter configuration

use colored::Colorize;
use miette::Result;
use std::path::Path;

use crate::config::CONFIG_FILE_NAME;
use crate::errors::StowageError;
use crate::utils::print_success;

/// Run the init command
pub async fn run(force: bool, verbose: bool) -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);
    write_config(path, force)?;

    print_success(&format!("Created {}", CONFIG_FILE_NAME));
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to set the maintainer and build directory", CONFIG_FILE_NAME.cyan());
    println!("  2. Add a {} to every directory that should become a package", "debian.yml".cyan());
    println!("  3. Run {} to check what would be built", "stowage plan <ROOT>".cyan());
    println!();

    if verbose {
        println!("{}", "Generated configuration:".dimmed());
        println!("{}", "─".repeat(50).dimmed());
        println!("{}", STARTER_CONFIG.dimmed());
    }

    Ok(())
}

fn write_config(path: &Path, force: bool) -> Result<(), StowageError> {
    if path.exists() && !force {
        return Err(StowageError::Configuration {
            message: format!("{} already exists", path.display()),
            help: Some("Use --force to overwrite it".into()),
        });
    }

    std::fs::write(path, STARTER_CONFIG).map_err(|e| {
        StowageError::configuration(format!("Failed to write {}: {}", path.display(), e))
    })
}

const STARTER_CONFIG: &str = r#"# stowage build configuration

# Working directories and fresh artifacts live under <build_directory>/temp
build_directory: ~/build

# Where finished packages are collected (defaults to build_directory)
# package_repo: ~/repo

# Package versions are 0.<revision>; one of git, subversion, bazaar
version_control: git

maintainer: "Your Name <you@example.com>"

# Derived names are <prefix>-<path-segments>
# prefix: acme
# package_name_filters:
#   "-src": ""

# Where a source directory lands inside the package
destination_mapping:
  root: /srv
#  apps/web: www/web

# Defaults shared by several directories
# collections:
#   web:
#     architecture: all
#     depends: [nginx]
#     post_copy: dir_utils.create_directory
#     directory_to_create: /var/log/web
# collection_mapping:
#   apps/web: web

# Extra glob patterns skipped while copying
build_exclusions: []
"#;
