// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! External command execution
//!
//! Every external program (archiver, VCS client, fakeroot, shell hooks) is
//! run through the [`CommandRunner`] trait so the pipeline can be driven
//! against a recording runner in tests.

mod fakeroot;
mod system;

pub use fakeroot::Fakeroot;
pub use system::SystemRunner;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{StowageError, StowageResult};

/// Exit status bash reports for an unknown command
pub const EXIT_NOT_FOUND: i32 = 127;

/// A command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub env: HashMap<String, String>,
    /// Program a wrapper such as fakeroot runs on the caller's behalf
    pub wraps: Option<String>,
}

impl CommandRequest {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            current_dir: None,
            env: HashMap::new(),
            wraps: None,
        }
    }

    /// Run in a specific directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Add environment variables
    pub fn envs(mut self, env: HashMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    /// Program and arguments as one line, for messages
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a successful command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit status (always 0 when returned from a runner)
    pub status: i32,

    /// Stdout followed by stderr
    pub output: String,

    /// Wall-clock time
    pub duration: Duration,
}

/// Runs external commands synchronously from the pipeline's point of view
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion
    ///
    /// Fails with `CommandNotFound` when the program is missing (or exits
    /// 127), `Command` on any other non-zero status, and `CommandTimeout`
    /// when the runner's time limit is hit.
    async fn run(&self, request: &CommandRequest) -> StowageResult<CommandOutput>;
}

/// Turn a finished process into a result
pub(crate) fn check_status(
    request: &CommandRequest,
    status: i32,
    output: String,
    duration: Duration,
) -> StowageResult<CommandOutput> {
    match status {
        0 => Ok(CommandOutput {
            status,
            output,
            duration,
        }),
        // A wrapper that started reports 127 for the program it could not run
        EXIT_NOT_FOUND => Err(StowageError::command_not_found(
            request.wraps.as_deref().unwrap_or(&request.program),
        )),
        exit_code => Err(StowageError::Command {
            command: request.display(),
            exit_code,
            output,
        }),
    }
}

/// Verify external tools are on PATH, returning the missing ones
pub fn missing_tools(tools: &[&str]) -> Vec<String> {
    tools
        .iter()
        .filter(|tool| which::which(tool).is_err())
        .map(|tool| tool.to_string())
        .collect()
}
