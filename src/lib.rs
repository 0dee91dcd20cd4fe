// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! # stowage - Debian package build orchestrator
//!
//! `stowage` walks a source tree, finds every directory that carries a
//! package descriptor (or belongs to a configured collection) and turns each
//! one into a `.deb`.
//!
//! ## Features
//!
//! - **Descriptor driven** - a `debian.yml` next to the code is all a package needs
//! - **Path mapping** - source directories land wherever the mapping says
//! - **Hooks** - built-in and shell hooks around every build phase
//! - **VCS versions** - versions come from the git, Subversion or Bazaar revision
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a starter configuration
//! stowage init
//!
//! # See what would be built
//! stowage plan src/
//!
//! # Build everything
//! stowage build src/ -y
//! ```

pub mod artifact;
pub mod backend;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod executors;
pub mod hooks;
pub mod mapping;
pub mod naming;
pub mod pipeline;
pub mod staging;
pub mod utils;
pub mod vcs;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use errors::{StowageError, StowageResult};
pub use pipeline::{BuildReport, PipelineExecutor};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
