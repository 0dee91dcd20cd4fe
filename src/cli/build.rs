// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Build command - discover packages and run them through the pipeline

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use super::load_config;
use crate::backend::PackageFormat;
use crate::discovery::PackageDiscovery;
use crate::errors::{RecoverySuggestion, StowageError};
use crate::executors::{missing_tools, SystemRunner};
use crate::hooks::HookRegistry;
use crate::pipeline::PipelineExecutor;
use crate::utils::TerminalConfirm;

/// Flags of the build command
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub root: PathBuf,
    pub config: Option<PathBuf>,
    pub assume_yes: bool,
    pub force: bool,
    pub quiet: bool,
    pub no_move: bool,
    pub no_clean: bool,
    pub package_format: Option<PackageFormat>,
    pub build_dir: Option<PathBuf>,
    pub limit_from: Option<String>,
}

/// Run the build command
pub async fn run(options: BuildOptions, abort: &AtomicBool) -> Result<()> {
    let (mut global, root) = load_config(options.config.as_deref(), &options.root)?;

    // Flags only ever switch behaviour on
    global.assume_yes |= options.assume_yes;
    global.force_build |= options.force;
    global.quiet |= options.quiet;
    global.no_move |= options.no_move;
    global.no_clean |= options.no_clean;
    if let Some(format) = options.package_format {
        global.package_format = format;
    }
    if let Some(dir) = options.build_dir {
        global.build_directory = dir;
    }
    if options.limit_from.is_some() {
        global.limit_from = options.limit_from;
    }
    let global = global;

    let backend = global.package_format.create_backend();
    let missing = missing_tools(backend.required_tools());
    if let Some(tool) = missing.first() {
        return Err(StowageError::Configuration {
            message: format!(
                "Required tool(s) not found for {} packages: {}",
                global.package_format,
                missing.join(", ")
            ),
            help: Some(RecoverySuggestion::install_tool(tool).format()),
        }
        .into());
    }

    if !global.quiet {
        println!(
            "{} {}",
            "Walking".bold(),
            root.display().to_string().cyan()
        );
    }

    let runner = SystemRunner::new(Duration::from_secs(global.command_timeout_secs));
    let resolver = global.version_control.map(|kind| kind.resolver());
    let discovery = PackageDiscovery::new(&global, backend.as_ref(), &runner, resolver.as_deref());
    let build_set = discovery.discover(&root).await?;
    tracing::info!(packages = build_set.len(), root = %root.display(), "discovery finished");

    let hooks = HookRegistry::with_builtins();
    let confirm = TerminalConfirm;
    let executor = PipelineExecutor::new(&global, backend.as_ref(), &runner, &hooks, &confirm, abort);
    let report = executor.execute(build_set).await?;

    if !global.quiet || !report.success() {
        report.print_summary();
    }

    report.into_result()?;
    Ok(())
}
