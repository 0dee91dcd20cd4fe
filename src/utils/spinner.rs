// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Progress spinner utilities
//!
//! Provides progress indicators for long-running external commands.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner for indeterminate progress
///
/// Quiet runs get a hidden spinner so callers never branch on it.
pub fn create_spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("/-\\| ")
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Phase-by-phase progress for one package
pub struct PhaseProgress {
    package: String,
    quiet: bool,
}

impl PhaseProgress {
    pub fn new(package: &str, quiet: bool) -> Self {
        Self {
            package: package.to_string(),
            quiet,
        }
    }

    pub fn phase(&self, phase: &str) {
        tracing::debug!(package = %self.package, phase, "entering phase");
        if !self.quiet {
            use colored::Colorize;
            println!("  {} {}", "→".blue(), phase.dimmed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_spinner_is_hidden() {
        let pb = create_spinner("building", true);
        assert!(pb.is_hidden());
    }
}
