// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Build pipeline
//!
//! Every package runs through a fixed sequence of phases:
//!
//! ```text
//! pre-build → pre_copy → copy → post_copy → pre_conf → conf → post_conf
//!           → build (chown/chmod → post_permissions → archive) → finalize
//! ```
//!
//! Packages are built one after another. A failure stops only the package
//! it happened in; the run goes on with the next one.

mod builder;
mod context;
mod executor;
mod state;

pub use builder::{builder_for, make_working_dir, BuildOutput, Builder, StandardBuilder, DEFAULT_BUILDER};
pub use context::BuildContext;
pub use executor::{BuildReport, BuiltPackage, PackageFailure, PipelineExecutor};
pub use state::{PackageState, StateTracker};
