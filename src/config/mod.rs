// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Configuration
//!
//! Global settings, the descriptor/collection key vocabulary and the
//! per-package record the pipeline threads through every phase.

mod attributes;
mod global;
mod package;

pub use attributes::{OneOrMany, PackageAttributes};
pub use global::{GlobalConfig, VersionComparison, CONFIG_FILE_NAME};
pub use package::PackageConfig;
