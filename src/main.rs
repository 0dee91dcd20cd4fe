// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! stowage - Debian package build orchestrator
//!
//! Walks a source tree and builds one package per descriptor.

use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stowage::cli::build::BuildOptions;
use stowage::cli::{Cli, Commands};
use stowage::utils::should_use_colors;
use stowage::StowageError;

/// Set by Ctrl-C; the pipeline checks it between phases
static ABORT: AtomicBool = AtomicBool::new(false);

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let quiet = matches!(cli.command, Commands::Build { quiet: true, .. });
    let default_filter = if cli.verbose {
        "stowage=debug"
    } else if quiet {
        "stowage=warn"
    } else {
        "stowage=info"
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if !should_use_colors() {
        colored::control::set_override(false);
    }

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current step");
            ABORT.store(true, Ordering::SeqCst);
        }
    });

    if let Err(report) = dispatch(cli).await {
        let code = report
            .downcast_ref::<StowageError>()
            .map(StowageError::exit_code)
            .unwrap_or(1);
        eprintln!("{:?}", report);
        std::process::exit(code);
    }
}

async fn dispatch(cli: Cli) -> miette::Result<()> {
    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            StowageError::configuration(format!(
                "Failed to change to directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
    }

    // Dispatch to command handlers
    match cli.command {
        Commands::Build {
            root,
            config,
            assume_yes,
            force,
            quiet,
            no_move,
            no_clean,
            package_format,
            build_dir,
            limit_from,
        } => {
            let options = BuildOptions {
                root,
                config,
                assume_yes,
                force,
                quiet,
                no_move,
                no_clean,
                package_format,
                build_dir,
                limit_from,
            };
            stowage::cli::build::run(options, &ABORT).await
        }
        Commands::Plan {
            root,
            config,
            format,
        } => stowage::cli::plan::run(root, config, format, cli.verbose).await,
        Commands::Init { force } => stowage::cli::init::run(force, cli.verbose).await,
    }
}
