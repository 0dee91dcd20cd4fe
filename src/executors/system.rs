// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Process-backed command runner

use async_trait::async_trait;
use std::io::ErrorKind as IoErrorKind;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

use super::{check_status, CommandOutput, CommandRequest, CommandRunner};
use crate::errors::{StowageError, StowageResult};

/// Runs commands as child processes with a time limit
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    /// Create a runner that kills commands after `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(600))
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, request: &CommandRequest) -> StowageResult<CommandOutput> {
        let start = Instant::now();

        let mut cmd = Command::new(&request.program);
        cmd.args(&request.args);
        cmd.envs(&request.env);
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);
        if let Some(ref dir) = request.current_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(command = %request.display(), "running");

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                return Err(StowageError::CommandTimeout {
                    command: request.display(),
                    seconds: self.timeout.as_secs(),
                })
            }
            Ok(Err(e)) if e.kind() == IoErrorKind::NotFound => {
                return Err(StowageError::command_not_found(&request.program))
            }
            Ok(Err(e)) => {
                return Err(StowageError::Command {
                    command: request.display(),
                    exit_code: -1,
                    output: e.to_string(),
                })
            }
            Ok(Ok(output)) => output,
        };

        let duration = start.elapsed();
        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        let status = output.status.code().unwrap_or(-1);
        tracing::debug!(command = %request.program, status, ?duration, "finished");

        check_status(request, status, combined, duration)
    }
}
