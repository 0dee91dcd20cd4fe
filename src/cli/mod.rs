// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for stowage.

pub mod build;
pub mod init;
pub mod plan;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::backend::PackageFormat;
use crate::config::GlobalConfig;
use crate::errors::{StowageError, StowageResult};

/// Debian package build orchestrator
///
/// Walks a source tree and builds one package per descriptor.
#[derive(Parser, Debug)]
#[clap(
    name = "stowage",
    version,
    about = "Walks a source tree and builds Debian packages from per-directory descriptors",
    long_about = None,
    after_help = "Examples:\n\
        stowage init                    Write a starter stowage.yaml\n\
        stowage plan src/               Show what would be built\n\
        stowage build src/ -y           Build every package under src/\n\n\
        See 'stowage <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build every package found under ROOT
    Build {
        /// Directory to walk for descriptors
        root: PathBuf,

        /// Global configuration file (defaults to ./stowage.yaml)
        #[clap(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Delete stale working directories without asking
        #[clap(short = 'y', long = "yes")]
        assume_yes: bool,

        /// Rebuild packages whose artifact already exists in the repository
        #[clap(short, long)]
        force: bool,

        /// Only print warnings and errors
        #[clap(short, long)]
        quiet: bool,

        /// Leave built artifacts in the build directory
        #[clap(long)]
        no_move: bool,

        /// Keep working directories and temporary artifacts
        #[clap(long)]
        no_clean: bool,

        /// Package format
        #[clap(long = "format", value_name = "FORMAT")]
        package_format: Option<PackageFormat>,

        /// Build directory (overrides the configuration)
        #[clap(short = 'b', long, value_name = "DIR")]
        build_dir: Option<PathBuf>,

        /// Skip packages whose version is below this revision
        #[clap(long, value_name = "REV")]
        limit_from: Option<String>,
    },

    /// Show the packages a build would produce without building them
    Plan {
        /// Directory to walk for descriptors
        root: PathBuf,

        /// Global configuration file (defaults to ./stowage.yaml)
        #[clap(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format
        #[clap(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Write a starter stowage.yaml in the current directory
    Init {
        /// Overwrite an existing configuration
        #[clap(long)]
        force: bool,
    },
}

/// Output format for the plan command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Load the global configuration for a walk of `root`
///
/// The root is canonicalised and becomes the base path unless the
/// configuration names one.
pub fn load_config(config: Option<&Path>, root: &Path) -> StowageResult<(GlobalConfig, PathBuf)> {
    let root = root.canonicalize().map_err(|e| StowageError::Configuration {
        message: format!("Cannot open root directory {}: {}", root.display(), e),
        help: None,
    })?;
    if !root.is_dir() {
        return Err(StowageError::configuration(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let cwd = std::env::current_dir()?;
    let mut global = GlobalConfig::discover(config, &cwd)?;
    if global.base_path.is_none() {
        global.base_path = Some(root.clone());
    }
    Ok((global, root))
}
