// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Pipeline hooks
//!
//! A hook receives the package record and hands back the record later hooks
//! and phases see. Hooks are named in descriptors and collections; the
//! names resolve against a registry built at compile time, plus
//! `shell:<command>` hooks that run an arbitrary command.

mod builtins;
mod shell;

pub use builtins::{ChownDirectory, CreateDirectory, DedupeDepends};
pub use shell::ShellHook;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{GlobalConfig, PackageConfig};
use crate::errors::{StowageError, StowageResult};
use crate::pipeline::BuildContext;
use crate::utils::merge_unique;

/// Prefix selecting a [`ShellHook`]
pub const SHELL_PREFIX: &str = "shell:";

/// Points in the pipeline where hooks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPhase {
    PreCopy,
    PostCopy,
    PreConf,
    PostConf,
    PostPermissions,
}

impl HookPhase {
    pub const ALL: [HookPhase; 5] = [
        Self::PreCopy,
        Self::PostCopy,
        Self::PreConf,
        Self::PostConf,
        Self::PostPermissions,
    ];

    /// Descriptor key for this phase
    pub fn key(&self) -> &'static str {
        match self {
            Self::PreCopy => "pre_copy",
            Self::PostCopy => "post_copy",
            Self::PreConf => "pre_conf",
            Self::PostConf => "post_conf",
            Self::PostPermissions => "post_permissions",
        }
    }
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// An extension point invoked during a pipeline phase
#[async_trait]
pub trait Hook: Send + Sync {
    /// Transform the package record
    ///
    /// Hooks that only cause side effects return `package` unchanged.
    async fn call(
        &self,
        ctx: &BuildContext<'_>,
        package: PackageConfig,
    ) -> StowageResult<PackageConfig>;
}

/// Merge package and collection hook lists
///
/// Package entries come first in declared order, then collection entries
/// not already present. The first occurrence of a name wins.
pub fn resolve_hooks(package: &[String], collection: &[String]) -> Vec<String> {
    merge_unique(package, collection)
}

/// Named hooks available to descriptors
pub struct HookRegistry {
    hooks: BTreeMap<String, Arc<dyn Hook>>,
}

impl HookRegistry {
    /// An empty registry; only `shell:` hooks resolve
    pub fn new() -> Self {
        Self {
            hooks: BTreeMap::new(),
        }
    }

    /// Registry holding the built-in hooks
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("dir_utils.create_directory", CreateDirectory);
        registry.register("dir_utils.chown_directory", ChownDirectory);
        registry.register("depends.dedupe", DedupeDepends);
        registry
    }

    /// Add or replace a named hook
    pub fn register(&mut self, name: &str, hook: impl Hook + 'static) {
        self.hooks.insert(name.to_string(), Arc::new(hook));
    }

    /// Registered hook names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.hooks.keys().map(String::as_str)
    }

    /// Resolve a hook identifier
    pub fn lookup(&self, name: &str) -> StowageResult<Arc<dyn Hook>> {
        if let Some(command) = name.strip_prefix(SHELL_PREFIX) {
            return Ok(Arc::new(ShellHook::new(command.trim())));
        }

        self.hooks.get(name).cloned().ok_or_else(|| StowageError::Import {
            what: "hook".to_string(),
            name: name.to_string(),
            help: Some(format!(
                "Known hooks: {}; or use '{}<command>'",
                self.names().collect::<Vec<_>>().join(", "),
                SHELL_PREFIX
            )),
        })
    }

    /// Ordered hook names for a phase, collection defaults merged in
    pub fn resolve(
        &self,
        phase: HookPhase,
        package: &PackageConfig,
        global: &GlobalConfig,
    ) -> Vec<String> {
        let collection = global
            .find_collection(&package.path)
            .map(|c| c.hooks(phase))
            .unwrap_or_default();
        resolve_hooks(package.hooks(phase), &collection)
    }

    /// Run every hook for a phase, threading the record through
    ///
    /// All names are resolved before the first hook runs, so an unknown name
    /// fails the phase without partial side effects.
    pub async fn run(
        &self,
        phase: HookPhase,
        ctx: &BuildContext<'_>,
        package: PackageConfig,
    ) -> StowageResult<PackageConfig> {
        let names = self.resolve(phase, &package, ctx.global);
        let hooks = names
            .iter()
            .map(|name| self.lookup(name).map(|hook| (name, hook)))
            .collect::<StowageResult<Vec<_>>>()?;

        let mut package = package;
        for (name, hook) in hooks {
            tracing::debug!(phase = %phase, hook = %name, package = %package.package, "running hook");
            package = hook.call(ctx, package).await?;
        }
        Ok(package)
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
