// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Terminal color utilities
//!
//! Provides consistent color schemes across the CLI.

use colored::Colorize;

/// Check if colors should be disabled
pub fn should_use_colors() -> bool {
    // Respect NO_COLOR environment variable
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    std::env::var("TERM").is_ok()
}

/// Print a styled header
pub fn print_header(title: &str) {
    println!("{}", title.bold());
    println!("{}", "═".repeat(title.len().max(40)));
}

/// Print a styled section
pub fn print_section(title: &str) {
    println!();
    println!("{}:", title.bold());
}

/// Print a success check
pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

/// Print a warning line in yellow on stderr
pub fn print_warning(msg: &str) {
    eprintln!("{}", msg.yellow());
}

/// Print an info item
pub fn print_info(msg: &str) {
    println!("  {} {}", "→".blue(), msg);
}

/// Emit a warning unless the run is quiet
///
/// The warning is always recorded as a debug event so `-q -v` runs keep it
/// in the log.
pub fn display_warning(quiet: bool, msg: &str) {
    tracing::debug!(warning = msg);
    if !quiet {
        print_warning(msg);
    }
}
