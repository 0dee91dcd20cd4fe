// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Built-in hooks
//!
//! Settings are read from the package record's extra keys, so a descriptor
//! configures them next to the hook name:
//!
//! ```yaml
//! post_copy: dir_utils.create_directory
//! directory_to_create: var/log/myapp
//! ```

use async_trait::async_trait;

use super::Hook;
use crate::config::PackageConfig;
use crate::errors::{StowageError, StowageResult};
use crate::executors::CommandRequest;
use crate::pipeline::BuildContext;
use crate::utils::{merge_unique, strip_leading_slash};

fn required<'p>(package: &'p PackageConfig, key: &str, hook: &str) -> StowageResult<&'p str> {
    package.extra_str(key).ok_or_else(|| StowageError::Packaging {
        message: format!("{} missing from config", key),
        help: Some(format!("Set '{}' in the descriptor to use {}", key, hook)),
    })
}

/// Resolve a path from the descriptor against the staging root
///
/// Relative and absolute paths both land inside the working directory.
fn staged_path(package: &PackageConfig, path: &str) -> String {
    match package.working_dir {
        Some(ref dir) => dir
            .join(strip_leading_slash(path))
            .to_string_lossy()
            .into_owned(),
        None => path.to_string(),
    }
}

/// `dir_utils.create_directory`: `mkdir -p` the `directory_to_create` key
pub struct CreateDirectory;

#[async_trait]
impl Hook for CreateDirectory {
    async fn call(
        &self,
        ctx: &BuildContext<'_>,
        package: PackageConfig,
    ) -> StowageResult<PackageConfig> {
        let directory = required(&package, "directory_to_create", "dir_utils.create_directory")?;
        let directory = staged_path(&package, directory);

        ctx.privileged(&CommandRequest::new("mkdir", ["-p", directory.as_str()]))
            .await?;
        Ok(package)
    }
}

/// `dir_utils.chown_directory`: `chown` `chown_directory` to `chown_user`
pub struct ChownDirectory;

#[async_trait]
impl Hook for ChownDirectory {
    async fn call(
        &self,
        ctx: &BuildContext<'_>,
        package: PackageConfig,
    ) -> StowageResult<PackageConfig> {
        let user = required(&package, "chown_user", "dir_utils.chown_directory")?;
        let directory = required(&package, "chown_directory", "dir_utils.chown_directory")?;
        let directory = staged_path(&package, directory);

        ctx.privileged(&CommandRequest::new("chown", [user, directory.as_str()]))
            .await?;
        Ok(package)
    }
}

/// `depends.dedupe`: drop repeated dependencies, keeping the first
pub struct DedupeDepends;

#[async_trait]
impl Hook for DedupeDepends {
    async fn call(
        &self,
        _ctx: &BuildContext<'_>,
        mut package: PackageConfig,
    ) -> StowageResult<PackageConfig> {
        package.depends = merge_unique(&package.depends, &[]);
        Ok(package)
    }
}
