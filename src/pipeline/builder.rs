// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Build strategies
//!
//! A descriptor's `builder` key picks the strategy that drives its package
//! through the backend. Only the standard sequence ships today.

use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;

use super::{BuildContext, PackageState, StateTracker};
use crate::artifact::FinalizeOutcome;
use crate::backend::PackageBackend;
use crate::config::PackageConfig;
use crate::errors::{StowageError, StowageResult};
use crate::hooks::HookPhase;

/// Strategy used when a descriptor names none
pub const DEFAULT_BUILDER: &str = "packages";

/// A finished package
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub package: PackageConfig,
    pub outcome: FinalizeOutcome,
}

/// Drives one package through the backend
#[async_trait]
pub trait Builder: Send + Sync {
    async fn build(
        &self,
        ctx: &BuildContext<'_>,
        backend: &dyn PackageBackend,
        package: PackageConfig,
        tracker: &StateTracker,
    ) -> StowageResult<BuildOutput>;
}

/// Resolve a builder name
pub fn builder_for(name: &str) -> StowageResult<Box<dyn Builder>> {
    match name {
        DEFAULT_BUILDER => Ok(Box::new(StandardBuilder)),
        other => Err(StowageError::Import {
            what: "builder".to_string(),
            name: other.to_string(),
            help: Some(format!("Available builders: {}", DEFAULT_BUILDER)),
        }),
    }
}

/// Create an empty working directory for a package
///
/// An existing directory is deleted after confirmation; declining stops the
/// whole run.
pub fn make_working_dir(ctx: &BuildContext<'_>, package: &PackageConfig) -> StowageResult<PathBuf> {
    let working_dir = ctx.global.temp_dir().join(&package.package);

    if working_dir.exists() {
        let prompt = format!(
            "Warning: {} will be deleted. Are you sure?",
            working_dir.display()
        );
        if !ctx.global.assume_yes && !ctx.confirm.confirm(&prompt) {
            return Err(StowageError::Declined { path: working_dir });
        }
        fs::remove_dir_all(&working_dir).map_err(|e| {
            StowageError::packaging(format!("Cannot remove {}: {}", working_dir.display(), e))
        })?;
    }

    fs::create_dir_all(&working_dir).map_err(|e| {
        StowageError::packaging(format!("Cannot create {}: {}", working_dir.display(), e))
    })?;
    tracing::debug!(dir = %working_dir.display(), "working directory ready");
    Ok(working_dir)
}

/// Stage, describe, archive and move
pub struct StandardBuilder;

#[async_trait]
impl Builder for StandardBuilder {
    async fn build(
        &self,
        ctx: &BuildContext<'_>,
        backend: &dyn PackageBackend,
        package: PackageConfig,
        tracker: &StateTracker,
    ) -> StowageResult<BuildOutput> {
        let mut package = package;

        tracker.enter(PackageState::PreBuild);
        ctx.checkpoint()?;
        backend.pre_build(ctx.global, &package)?;
        package.working_dir = Some(make_working_dir(ctx, &package)?);

        tracker.enter(PackageState::PreCopy);
        let package = ctx.run_hooks(HookPhase::PreCopy, package).await?;

        tracker.enter(PackageState::Copy);
        ctx.checkpoint()?;
        let package = backend.copy_files_to_package_dir(ctx, package).await?;

        tracker.enter(PackageState::PostCopy);
        let package = ctx.run_hooks(HookPhase::PostCopy, package).await?;

        tracker.enter(PackageState::PreConf);
        let package = ctx.run_hooks(HookPhase::PreConf, package).await?;

        tracker.enter(PackageState::Conf);
        ctx.checkpoint()?;
        let package = backend.make_package_conf_files(ctx, package).await?;

        tracker.enter(PackageState::PostConf);
        let package = ctx.run_hooks(HookPhase::PostConf, package).await?;

        tracker.enter(PackageState::Build);
        ctx.checkpoint()?;
        let package = backend.build_package(ctx, package).await?;

        tracker.enter(PackageState::Finalize);
        let outcome = backend.move_package(ctx.global, &package)?;

        tracker.enter(PackageState::Done);
        Ok(BuildOutput { package, outcome })
    }
}
