// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Per-package state machine

use serde::Serialize;
use std::sync::Mutex;

use crate::utils::PhaseProgress;

/// Where a package is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageState {
    Discovered,
    PreBuild,
    PreCopy,
    Copy,
    PostCopy,
    PreConf,
    Conf,
    PostConf,
    Build,
    Finalize,
    Done,
    Failed,
}

impl std::fmt::Display for PackageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Discovered => "discovered",
            Self::PreBuild => "pre-build",
            Self::PreCopy => "pre_copy",
            Self::Copy => "copy",
            Self::PostCopy => "post_copy",
            Self::PreConf => "pre_conf",
            Self::Conf => "conf",
            Self::PostConf => "post_conf",
            Self::Build => "build",
            Self::Finalize => "finalize",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Tracks and reports the current state of one package
pub struct StateTracker {
    progress: PhaseProgress,
    current: Mutex<PackageState>,
}

impl StateTracker {
    pub fn new(package: &str, quiet: bool) -> Self {
        Self {
            progress: PhaseProgress::new(package, quiet),
            current: Mutex::new(PackageState::Discovered),
        }
    }

    /// Move to the next state
    pub fn enter(&self, state: PackageState) {
        if let Ok(mut current) = self.current.lock() {
            *current = state;
        }
        if !matches!(state, PackageState::Done | PackageState::Failed) {
            self.progress.phase(&state.to_string());
        }
    }

    /// The last state entered
    pub fn current(&self) -> PackageState {
        self.current
            .lock()
            .map(|s| *s)
            .unwrap_or(PackageState::Failed)
    }
}
