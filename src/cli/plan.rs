// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Plan command - show what a build would produce

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;
use std::time::Duration;

use super::{load_config, OutputFormat};
use crate::config::PackageConfig;
use crate::discovery::PackageDiscovery;
use crate::errors::StowageError;
use crate::executors::SystemRunner;
use crate::hooks::HookPhase;
use crate::utils::{print_header, print_info, print_section};

/// Run the plan command
pub async fn run(
    root: PathBuf,
    config: Option<PathBuf>,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let (mut global, root) = load_config(config.as_deref(), &root)?;
    // Keep stdout parseable when emitting JSON
    global.quiet |= format == OutputFormat::Json;
    let global = global;

    let backend = global.package_format.create_backend();
    let runner = SystemRunner::new(Duration::from_secs(global.command_timeout_secs));
    let resolver = global.version_control.map(|kind| kind.resolver());
    let discovery = PackageDiscovery::new(&global, backend.as_ref(), &runner, resolver.as_deref());
    let build_set = discovery.discover(&root).await?;
    let packages: Vec<PackageConfig> = build_set.into_values().collect();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&packages).map_err(StowageError::from)?;
            println!("{}", json);
        }
        OutputFormat::Text => print_plan(&packages, &root, verbose),
    }

    Ok(())
}

fn print_plan(packages: &[PackageConfig], root: &std::path::Path, verbose: bool) {
    print_header(&format!("Build plan for {}", root.display()));

    for package in packages {
        print_section(&package.package);
        print_info(&format!("version       {}", package.version));
        print_info(&format!("architecture  {}", package.architecture));
        print_info(&format!("artifact      {}", package.package_filename));
        print_info(&format!("source        {}", package.path.display()));

        if verbose {
            if !package.depends.is_empty() {
                print_info(&format!("depends       {}", package.depends.join(", ")));
            }
            for phase in HookPhase::ALL {
                if let Some(hooks) = package.hooks.get(&phase) {
                    print_info(&format!("{:<13} {}", phase.key(), hooks.join(", ")));
                }
            }
        }
    }

    println!();
    println!(
        "{}",
        format!("{} package(s) would be built", packages.len()).green()
    );
}
