// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Packaging backends
//!
//! The pipeline only talks to [`PackageBackend`]; each supported archive
//! format provides one implementation, selected by [`PackageFormat`].

mod debian;
mod template;

pub use debian::DebianBackend;
pub use template::render;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::artifact::{self, FinalizeOutcome};
use crate::config::{GlobalConfig, PackageConfig};
use crate::errors::{StowageError, StowageResult};
use crate::naming;
use crate::pipeline::BuildContext;

/// Supported archive formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageFormat {
    #[default]
    #[serde(rename = "deb", alias = "debian")]
    Deb,
}

impl PackageFormat {
    /// Per-directory descriptor file for this format
    pub fn descriptor_name(&self) -> &'static str {
        match self {
            Self::Deb => "debian.yml",
        }
    }

    /// Construct the backend for this format
    pub fn create_backend(&self) -> Box<dyn PackageBackend> {
        match self {
            Self::Deb => Box::new(DebianBackend::new()),
        }
    }
}

impl std::fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deb => write!(f, "deb"),
        }
    }
}

impl FromStr for PackageFormat {
    type Err = StowageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deb" | "debian" => Ok(Self::Deb),
            other => Err(StowageError::Import {
                what: "package format".to_string(),
                name: other.to_string(),
                help: Some("Supported formats: deb".into()),
            }),
        }
    }
}

/// One archive format
#[async_trait]
pub trait PackageBackend: Send + Sync {
    fn format(&self) -> PackageFormat;

    /// External programs the backend runs
    fn required_tools(&self) -> &'static [&'static str];

    /// Artifact file name for a package
    fn make_package_filename(&self, package: &PackageConfig) -> String;

    /// Whether the format accepts this package name
    fn is_valid_package_name(&self, name: &str) -> bool {
        naming::is_valid_name(name)
    }

    /// Checks run before any file is touched
    fn pre_build(&self, global: &GlobalConfig, package: &PackageConfig) -> StowageResult<()>;

    /// Stage the package sources into its working directory
    async fn copy_files_to_package_dir(
        &self,
        ctx: &BuildContext<'_>,
        package: PackageConfig,
    ) -> StowageResult<PackageConfig>;

    /// Write the format's metadata files
    async fn make_package_conf_files(
        &self,
        ctx: &BuildContext<'_>,
        package: PackageConfig,
    ) -> StowageResult<PackageConfig>;

    /// Produce the archive in the temp directory
    async fn build_package(
        &self,
        ctx: &BuildContext<'_>,
        package: PackageConfig,
    ) -> StowageResult<PackageConfig>;

    /// Move the archive into the repository
    fn move_package(
        &self,
        global: &GlobalConfig,
        package: &PackageConfig,
    ) -> StowageResult<FinalizeOutcome> {
        artifact::finalize(global, package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!("debian".parse::<PackageFormat>().unwrap(), PackageFormat::Deb);
        assert!("rpm".parse::<PackageFormat>().is_err());
        let parsed: PackageFormat = serde_yaml::from_str("debian").unwrap();
        assert_eq!(parsed, PackageFormat::Deb);
        assert_eq!(PackageFormat::Deb.create_backend().format(), PackageFormat::Deb);
    }
}
