// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Fakeroot session
//!
//! Ownership and permission changes made under `fakeroot` only persist
//! between invocations when every call loads and saves the same state file.
//! One session spans one package build; the state file is created on first
//! use and removed on `release()` or when the session is dropped.

use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::NamedTempFile;

use super::{CommandOutput, CommandRequest, CommandRunner};
use crate::errors::{StowageError, StowageResult};

/// Program used to fake root privileges
pub const FAKEROOT: &str = "fakeroot";

/// Scoped fakeroot state
#[derive(Default)]
pub struct Fakeroot {
    state: Mutex<Option<NamedTempFile>>,
}

impl Fakeroot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the state file, creating it on first use
    fn state_path(&self) -> StowageResult<PathBuf> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StowageError::packaging("fakeroot session lock poisoned"))?;

        if state.is_none() {
            let file = tempfile::Builder::new()
                .prefix("stowage-fakeroot-")
                .tempfile()?;
            tracing::debug!(state = %file.path().display(), "fakeroot session started");
            *state = Some(file);
        }

        Ok(state
            .as_ref()
            .map(|f| f.path().to_path_buf())
            .unwrap_or_default())
    }

    /// Wrap a request so it runs under this session
    pub fn wrap(&self, request: &CommandRequest) -> StowageResult<CommandRequest> {
        let state = self.state_path()?.to_string_lossy().into_owned();

        let mut args = vec![
            "-i".to_string(),
            state.clone(),
            "-s".to_string(),
            state,
            "--".to_string(),
            request.program.clone(),
        ];
        args.extend(request.args.iter().cloned());

        Ok(CommandRequest {
            program: FAKEROOT.to_string(),
            args,
            current_dir: request.current_dir.clone(),
            env: request.env.clone(),
            wraps: Some(request.program.clone()),
        })
    }

    /// Run a command with faked root privileges
    pub async fn run(
        &self,
        runner: &dyn CommandRunner,
        request: &CommandRequest,
    ) -> StowageResult<CommandOutput> {
        let wrapped = self.wrap(request)?;
        runner.run(&wrapped).await
    }

    /// Whether a state file currently exists
    pub fn is_active(&self) -> bool {
        self.state.lock().map(|s| s.is_some()).unwrap_or(false)
    }

    /// End the session and delete its state file
    pub fn release(&self) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(file) = state.take() {
                tracing::debug!(state = %file.path().display(), "fakeroot session released");
                drop(file);
            }
        }
    }
}
