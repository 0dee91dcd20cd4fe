// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Shell hook
//!
//! Runs a command through `sh -c` with the package exported as `STOWAGE_*`
//! variables. The working directory is the staging root once it exists, the
//! package source otherwise.

use async_trait::async_trait;
use std::collections::HashMap;

use super::Hook;
use crate::config::PackageConfig;
use crate::errors::StowageResult;
use crate::executors::CommandRequest;
use crate::pipeline::BuildContext;

/// Shell hook
pub struct ShellHook {
    command: String,
}

impl ShellHook {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }

    /// Environment describing the package
    pub fn environment(package: &PackageConfig) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("STOWAGE_PACKAGE".to_string(), package.package.clone());
        env.insert("STOWAGE_VERSION".to_string(), package.version.clone());
        env.insert(
            "STOWAGE_ARCHITECTURE".to_string(),
            package.architecture.clone(),
        );
        env.insert(
            "STOWAGE_SOURCE_DIR".to_string(),
            package.path.to_string_lossy().into_owned(),
        );
        env.insert(
            "STOWAGE_PACKAGE_FILENAME".to_string(),
            package.package_filename.clone(),
        );
        if let Some(ref dir) = package.working_dir {
            env.insert(
                "STOWAGE_WORKING_DIR".to_string(),
                dir.to_string_lossy().into_owned(),
            );
        }
        env
    }
}

#[async_trait]
impl Hook for ShellHook {
    async fn call(
        &self,
        ctx: &BuildContext<'_>,
        package: PackageConfig,
    ) -> StowageResult<PackageConfig> {
        let dir = package.working_dir.clone().unwrap_or_else(|| package.path.clone());
        let request = CommandRequest::new("sh", ["-c", self.command.as_str()])
            .current_dir(dir)
            .envs(Self::environment(&package));

        let output = ctx.runner.run(&request).await?;
        if !output.output.trim().is_empty() {
            tracing::info!(package = %package.package, "{}", output.output.trim_end());
        }
        Ok(package)
    }
}
