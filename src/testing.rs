// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Shared fixtures for unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::{GlobalConfig, PackageAttributes, PackageConfig};
use crate::errors::{StowageError, StowageResult};
use crate::executors::{CommandOutput, CommandRequest, CommandRunner, Fakeroot};
use crate::hooks::HookRegistry;
use crate::pipeline::BuildContext;
use crate::utils::FixedAnswer;
use crate::vcs::RevisionResolver;

/// Records every request and succeeds
///
/// `dpkg -b <dir> <out>` (directly or under fakeroot) writes an empty file
/// at `<out>` so artifacts can be finalized. Programs listed in `failing`
/// exit with status 1.
#[derive(Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<CommandRequest>>,
    failing: Mutex<Vec<String>>,
    outputs: Mutex<HashMap<String, String>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<CommandRequest> {
        self.commands.lock().unwrap().clone()
    }

    /// Make a program fail wherever it appears in a command line
    pub fn fail(&self, program: &str) {
        self.failing.lock().unwrap().push(program.to_string());
    }

    /// Canned output for a program
    pub fn respond(&self, program: &str, output: &str) {
        self.outputs
            .lock()
            .unwrap()
            .insert(program.to_string(), output.to_string());
    }

    fn effective(request: &CommandRequest) -> (String, Vec<String>) {
        match request.args.iter().position(|a| a == "--") {
            Some(idx) if request.program == "fakeroot" && idx + 1 < request.args.len() => (
                request.args[idx + 1].clone(),
                request.args[idx + 2..].to_vec(),
            ),
            _ => (request.program.clone(), request.args.clone()),
        }
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, request: &CommandRequest) -> StowageResult<CommandOutput> {
        self.commands.lock().unwrap().push(request.clone());
        let (program, args) = Self::effective(request);

        if self.failing.lock().unwrap().contains(&program) {
            return Err(StowageError::Command {
                command: request.display(),
                exit_code: 1,
                output: format!("{} failed", program),
            });
        }

        if program == "dpkg" && args.first().map(String::as_str) == Some("-b") {
            if let Some(out) = args.last() {
                std::fs::write(out, b"")?;
            }
        }

        let output = self
            .outputs
            .lock()
            .unwrap()
            .get(&program)
            .cloned()
            .unwrap_or_default();

        Ok(CommandOutput {
            status: 0,
            output,
            duration: Duration::from_millis(1),
        })
    }
}

/// Resolver returning a fixed revision for every path
pub struct FixedRevision(pub &'static str);

#[async_trait]
impl RevisionResolver for FixedRevision {
    async fn revision(&self, _runner: &dyn CommandRunner, _path: &Path) -> StowageResult<String> {
        Ok(self.0.to_string())
    }
}

/// Everything a [`BuildContext`] borrows
pub struct TestHarness {
    pub global: GlobalConfig,
    pub runner: RecordingRunner,
    pub fakeroot: Fakeroot,
    pub confirm: FixedAnswer,
    pub abort: AtomicBool,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            global: GlobalConfig {
                quiet: true,
                ..Default::default()
            },
            runner: RecordingRunner::new(),
            fakeroot: Fakeroot::new(),
            confirm: FixedAnswer(true),
            abort: AtomicBool::new(false),
        }
    }

    pub fn context<'a>(&'a self, hooks: &'a HookRegistry) -> BuildContext<'a> {
        BuildContext {
            global: &self.global,
            runner: &self.runner,
            fakeroot: &self.fakeroot,
            hooks,
            confirm: &self.confirm,
            abort: &self.abort,
        }
    }

    pub fn package(&self, name: &str, path: PathBuf) -> PackageConfig {
        let mut package =
            PackageConfig::from_attributes(name.to_string(), path, PackageAttributes::default());
        package.version = "0.1".to_string();
        package.package_filename = format!("{}_0.1_all.deb", name);
        package
    }
}
