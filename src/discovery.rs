// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Package discovery
//!
//! Walks a source tree and turns every directory holding a descriptor file,
//! or mapped to a collection, into a package record. Collection defaults
//! are overlaid with the descriptor, the version is looked up in version
//! control, and packages that are already built or below the version floor
//! are dropped with a warning.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::backend::PackageBackend;
use crate::config::{GlobalConfig, PackageAttributes, PackageConfig, VersionComparison};
use crate::errors::{RecoverySuggestion, StowageError, StowageResult};
use crate::executors::CommandRunner;
use crate::naming::derive_name;
use crate::utils::display_warning;
use crate::vcs::RevisionResolver;
use crate::{artifact, artifact::ArtifactLocation};

/// Source directory → package record, in path order
pub type BuildSet = BTreeMap<PathBuf, PackageConfig>;

/// Prefix joined to every revision to form a package version
pub const VERSION_PREFIX: &str = "0.";

/// Whether `version` falls below the floor `0.<floor>`
pub fn below_floor(version: &str, floor: &str, mode: VersionComparison) -> bool {
    let floor_version = format!("{}{}", VERSION_PREFIX, floor);

    if mode == VersionComparison::Numeric {
        let revision = version.strip_prefix(VERSION_PREFIX).unwrap_or(version);
        if let (Ok(revision), Ok(floor)) = (revision.parse::<u64>(), floor.parse::<u64>()) {
            return revision < floor;
        }
    }

    version.cmp(floor_version.as_str()) == Ordering::Less
}

/// Discovers the packages under a root directory
pub struct PackageDiscovery<'a> {
    global: &'a GlobalConfig,
    backend: &'a dyn PackageBackend,
    runner: &'a dyn CommandRunner,
    resolver: Option<&'a dyn RevisionResolver>,
}

impl<'a> PackageDiscovery<'a> {
    pub fn new(
        global: &'a GlobalConfig,
        backend: &'a dyn PackageBackend,
        runner: &'a dyn CommandRunner,
        resolver: Option<&'a dyn RevisionResolver>,
    ) -> Self {
        Self {
            global,
            backend,
            runner,
            resolver,
        }
    }

    /// Directories under `root` that may hold a package, in walk order
    fn candidate_dirs(&self, root: &Path) -> StowageResult<Vec<PathBuf>> {
        let exclusions = self.global.walk_exclusions();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !(entry.file_type().is_dir()
                        && exclusions
                            .iter()
                            .any(|x| entry.file_name().to_string_lossy() == x.as_str()))
            });

        let mut dirs = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                StowageError::packaging(format!("Cannot walk {}: {}", root.display(), e))
            })?;
            if entry.file_type().is_dir() {
                dirs.push(entry.into_path());
            }
        }
        Ok(dirs)
    }

    /// Collection defaults overlaid with the descriptor, if this is a package
    fn load_attributes(&self, dir: &Path) -> StowageResult<Option<PackageAttributes>> {
        let collection = self.global.find_collection(dir);
        let descriptor = dir.join(self.global.descriptor_name());
        let has_descriptor = descriptor.is_file();

        if !has_descriptor && collection.is_none() {
            return Ok(None);
        }

        let base = collection.cloned().unwrap_or_default();
        if has_descriptor {
            Ok(Some(base.overlay(PackageAttributes::from_file(&descriptor)?)))
        } else {
            Ok(Some(base))
        }
    }

    async fn version(&self, path: &Path) -> StowageResult<String> {
        let resolver = self.resolver.ok_or_else(|| StowageError::Packaging {
            message: "No version control system defined".into(),
            help: Some("Set 'version_control' (git, subversion or bazaar) in the configuration".into()),
        })?;
        let revision = resolver.revision(self.runner, path).await?;
        Ok(format!("{}{}", VERSION_PREFIX, revision))
    }

    /// Reason to leave a package out of this run, if any
    fn skip_reason(&self, package: &PackageConfig) -> Option<String> {
        let ArtifactLocation { exists, .. } = artifact::locate(self.global, &package.package_filename);
        if exists && !self.global.force_build {
            return Some(format!(
                "Warning: Package {} already exists; skipping build...",
                package.package_filename
            ));
        }

        if let Some(ref floor) = self.global.limit_from {
            if below_floor(&package.version, floor, self.global.version_comparison) {
                return Some(format!(
                    "Warning: Package version {} below limit; skipping build...",
                    package.version
                ));
            }
        }
        None
    }

    /// Walk `root` and return every package to build
    pub async fn discover(&self, root: &Path) -> StowageResult<BuildSet> {
        let base_path = self.global.base_path();
        let mut build_set = BuildSet::new();
        let mut names: HashMap<String, PathBuf> = HashMap::new();

        for dir in self.candidate_dirs(root)? {
            let Some(attributes) = self.load_attributes(&dir)? else {
                continue;
            };

            let name = attributes.package.clone().unwrap_or_else(|| {
                derive_name(
                    &base_path,
                    &dir,
                    self.global.prefix.as_deref(),
                    &self.global.package_name_filters,
                )
            });

            if let Some(existing) = names.get(&name) {
                return Err(StowageError::Packaging {
                    message: format!(
                        "A duplicate package name exists: '{}' in {} and {}",
                        name,
                        existing.display(),
                        dir.display()
                    ),
                    help: Some(RecoverySuggestion::fix_duplicate_package(&name).action),
                });
            }
            names.insert(name.clone(), dir.clone());

            let mut package = PackageConfig::from_attributes(name, dir.clone(), attributes);
            package.version = self.version(&dir).await?;
            package.package_filename = self.backend.make_package_filename(&package);

            if let Some(reason) = self.skip_reason(&package) {
                display_warning(self.global.quiet, &reason);
                continue;
            }

            tracing::debug!(package = %package.package, version = %package.version, path = %dir.display(), "discovered");
            build_set.insert(dir, package);
        }

        if build_set.is_empty() {
            return Err(StowageError::Packaging {
                message: format!("No packages to build from walking {}", root.display()),
                help: Some(format!(
                    "Add a {} descriptor or map the directory to a collection",
                    self.global.descriptor_name()
                )),
            });
        }

        Ok(build_set)
    }
}
