// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Process-wide configuration
//!
//! Loaded once from `stowage.yaml` (or a `.toml` file), then overlaid with
//! command-line flags. Read-only for the rest of the run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::PackageAttributes;
use crate::backend::PackageFormat;
use crate::errors::{StowageError, StowageResult};
use crate::mapping::DestinationMapping;
use crate::utils::{expand_home, relative_to_base};
use crate::vcs::VcsKind;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "stowage.yaml";

/// How a package version is compared against `limit_from`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionComparison {
    /// Compare the revision numbers as integers, falling back to text
    #[default]
    Numeric,
    /// Plain string comparison of the full version
    Lexicographic,
}

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Root build directory; staging happens under `<build_directory>/temp`
    pub build_directory: PathBuf,

    /// Source tree base; package names and mappings are relative to it
    pub base_path: Option<PathBuf>,

    /// Leading segment for derived package names
    pub prefix: Option<String>,

    /// Literal substring replacements applied to derived names
    pub package_name_filters: BTreeMap<String, String>,

    /// Logical name (base-relative source path) → staged path fragment
    pub destination_mapping: DestinationMapping,

    /// Named bundles of default package attributes
    pub collections: BTreeMap<String, PackageAttributes>,

    /// Base-relative source path → collection name
    pub collection_mapping: BTreeMap<String, String>,

    pub path_exclusions: Vec<String>,
    pub default_path_exclusions: Vec<String>,
    pub build_exclusions: Vec<String>,
    pub default_build_exclusions: Vec<String>,

    pub force_build: bool,
    pub quiet: bool,
    pub no_move: bool,
    pub no_clean: bool,
    pub assume_yes: bool,

    /// Packages whose version is below `0.<limit_from>` are skipped
    pub limit_from: Option<String>,
    pub version_comparison: VersionComparison,

    /// Where finished artifacts go; defaults to the build directory
    pub package_repo: Option<PathBuf>,

    pub package_format: PackageFormat,
    pub version_control: Option<VcsKind>,

    /// Fallback maintainer for packages that do not name one
    pub maintainer: Option<String>,
    pub control_template: Option<PathBuf>,
    pub copyright_template: Option<PathBuf>,

    /// Descriptor file name; defaults to the format's own (`debian.yml`)
    pub descriptor_name: Option<String>,

    /// Upper bound for any single external command
    pub command_timeout_secs: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            build_directory: PathBuf::from("~/build"),
            base_path: None,
            prefix: None,
            package_name_filters: BTreeMap::new(),
            destination_mapping: DestinationMapping::default(),
            collections: BTreeMap::new(),
            collection_mapping: BTreeMap::new(),
            path_exclusions: vec![],
            default_path_exclusions: default_path_exclusions(),
            build_exclusions: vec![],
            default_build_exclusions: default_build_exclusions(),
            force_build: false,
            quiet: false,
            no_move: false,
            no_clean: false,
            assume_yes: false,
            limit_from: None,
            version_comparison: VersionComparison::default(),
            package_repo: None,
            package_format: PackageFormat::default(),
            version_control: None,
            maintainer: None,
            control_template: None,
            copyright_template: None,
            descriptor_name: None,
            command_timeout_secs: 600,
        }
    }
}

fn default_path_exclusions() -> Vec<String> {
    [".git", ".svn", ".bzr", "CVS"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_build_exclusions() -> Vec<String> {
    [".git", ".svn", ".bzr", "CVS", "*.pyc", "*.swp", "*~", ".DS_Store"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl GlobalConfig {
    /// Load configuration from a YAML or TOML file
    pub fn from_file(path: &Path) -> StowageResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| StowageError::Configuration {
            message: format!("Failed to read {}: {}", path.display(), e),
            help: Some("Create one with 'stowage init'".into()),
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Parse configuration from YAML
    pub fn from_yaml(yaml: &str) -> StowageResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let parsed: Option<Self> = serde_yaml::from_str(yaml)?;
        Ok(parsed.unwrap_or_default())
    }

    /// Parse configuration from TOML
    pub fn from_toml(content: &str) -> StowageResult<Self> {
        toml::from_str(content).map_err(Into::into)
    }

    /// Load the explicit file, else `stowage.yaml` in `dir`, else defaults
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> StowageResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            Self::from_file(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Build directory with `~` expanded
    pub fn build_dir(&self) -> PathBuf {
        expand_home(&self.build_directory)
    }

    /// Scratch area holding working dirs and freshly built artifacts
    pub fn temp_dir(&self) -> PathBuf {
        self.build_dir().join("temp")
    }

    /// Final artifact repository
    pub fn repository_dir(&self) -> PathBuf {
        self.package_repo
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(|| self.build_dir())
    }

    /// Base path, falling back to `/`
    pub fn base_path(&self) -> PathBuf {
        self.base_path
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(|| PathBuf::from("/"))
    }

    /// Descriptor file name for the configured package format
    pub fn descriptor_name(&self) -> String {
        self.descriptor_name
            .clone()
            .unwrap_or_else(|| self.package_format.descriptor_name().to_string())
    }

    /// Directory basenames pruned during discovery
    pub fn walk_exclusions(&self) -> Vec<String> {
        self.path_exclusions
            .iter()
            .chain(self.default_path_exclusions.iter())
            .cloned()
            .collect()
    }

    /// Global copy exclusions; the descriptor file itself never ships
    pub fn copy_exclusions(&self) -> Vec<String> {
        let mut exclusions: Vec<String> = self
            .default_build_exclusions
            .iter()
            .chain(self.build_exclusions.iter())
            .cloned()
            .collect();
        exclusions.push(self.descriptor_name());
        exclusions
    }

    /// Collection bundle for a source directory, if one is mapped to it
    pub fn find_collection(&self, path: &Path) -> Option<&PackageAttributes> {
        if self.collections.is_empty() {
            return None;
        }

        let relative = relative_to_base(&self.base_path(), path);
        self.collection_mapping
            .get(&relative)
            .and_then(|name| self.collections.get(name))
    }
}
