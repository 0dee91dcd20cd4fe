// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Built artifact placement
//!
//! Archives are written to `<build_directory>/temp` and then moved into the
//! package repository (or the build directory when no repository is set).

use std::fs;
use std::path::PathBuf;

use crate::config::{GlobalConfig, PackageConfig};
use crate::errors::{StowageError, StowageResult};
use crate::utils::display_warning;

/// Where an artifact is built and where it ends up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    /// Whether the artifact is already in the repository
    pub exists: bool,
    /// Freshly built artifact
    pub source: PathBuf,
    /// Repository directory
    pub destination: PathBuf,
}

impl ArtifactLocation {
    /// Final path of the artifact
    pub fn target(&self) -> PathBuf {
        match self.source.file_name() {
            Some(name) => self.destination.join(name),
            None => self.destination.clone(),
        }
    }
}

/// Compute the paths for a package filename
pub fn locate(global: &GlobalConfig, package_filename: &str) -> ArtifactLocation {
    let destination = global.repository_dir();
    ArtifactLocation {
        exists: destination.join(package_filename).exists(),
        source: global.temp_dir().join(package_filename),
        destination,
    }
}

/// Result of [`finalize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// `no_move` is set; the artifact stays in the temp directory
    Disabled,
    /// The repository already had this artifact
    AlreadyPresent(PathBuf),
    /// The artifact now lives at this path
    Moved(PathBuf),
}

/// Move a built artifact into the repository
pub fn finalize(global: &GlobalConfig, package: &PackageConfig) -> StowageResult<FinalizeOutcome> {
    if global.no_move {
        return Ok(FinalizeOutcome::Disabled);
    }

    let location = locate(global, &package.package_filename);
    fs::create_dir_all(&location.destination).map_err(|e| StowageError::Packaging {
        message: format!("Cannot create {}: {}", location.destination.display(), e),
        help: None,
    })?;

    let target = location.target();
    if location.exists {
        display_warning(
            global.quiet,
            &format!(
                "Warning: {} already exists in {}, not moving",
                package.package_filename,
                location.destination.display()
            ),
        );
        return Ok(FinalizeOutcome::AlreadyPresent(target));
    }

    fs::copy(&location.source, &target).map_err(|e| StowageError::Packaging {
        message: format!(
            "Cannot copy {} to {}: {}",
            location.source.display(),
            target.display(),
            e
        ),
        help: None,
    })?;

    if !global.no_clean {
        fs::remove_file(&location.source)?;
    }

    tracing::info!(package = %package.package, artifact = %target.display(), "artifact stored");
    Ok(FinalizeOutcome::Moved(target))
}
