// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Pipeline executor
//!
//! Builds every package of a build set in order and collects the outcome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use colored::Colorize;

use super::{builder_for, BuildContext, PackageState, StateTracker};
use crate::artifact::FinalizeOutcome;
use crate::backend::PackageBackend;
use crate::config::{GlobalConfig, PackageConfig};
use crate::discovery::BuildSet;
use crate::errors::{StowageError, StowageResult};
use crate::executors::{CommandRunner, Fakeroot};
use crate::hooks::HookRegistry;
use crate::utils::Confirm;

/// A package that made it through the pipeline
#[derive(Debug, Clone)]
pub struct BuiltPackage {
    pub package: String,
    pub version: String,
    pub outcome: FinalizeOutcome,
}

/// A package that did not
#[derive(Debug)]
pub struct PackageFailure {
    pub package: String,
    /// Phase the failure happened in
    pub state: PackageState,
    pub error: StowageError,
}

/// Result of running a build set
#[derive(Debug, Default)]
pub struct BuildReport {
    pub built: Vec<BuiltPackage>,
    pub failed: Vec<PackageFailure>,
    pub duration: Duration,
}

impl BuildReport {
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Turn failures into an error for the process exit status
    pub fn into_result(self) -> StowageResult<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(StowageError::BuildFailed {
                failed: self.failed.len(),
                total: self.failed.len() + self.built.len(),
            })
        }
    }

    pub fn print_summary(&self) {
        println!();
        for built in &self.built {
            let note = match built.outcome {
                FinalizeOutcome::Moved(ref path) => path.display().to_string(),
                FinalizeOutcome::AlreadyPresent(_) => "already in repository".to_string(),
                FinalizeOutcome::Disabled => "left in build directory".to_string(),
            };
            println!(
                "  {} {} {} {}",
                "✓".green(),
                built.package.bold(),
                built.version,
                format!("({})", note).dimmed()
            );
        }
        for failure in &self.failed {
            println!(
                "  {} {} {}",
                "✗".red(),
                failure.package.bold(),
                format!("failed during {}: {}", failure.state, failure.error).red()
            );
        }

        println!();
        let secs = self.duration.as_secs_f64();
        if self.success() {
            println!(
                "{}",
                format!("Built {} package(s) in {:.2}s", self.built.len(), secs).green()
            );
        } else {
            println!(
                "{}",
                format!(
                    "{} of {} package(s) failed after {:.2}s",
                    self.failed.len(),
                    self.failed.len() + self.built.len(),
                    secs
                )
                .red()
            );
        }
    }
}

/// Pipeline executor
pub struct PipelineExecutor<'a> {
    global: &'a GlobalConfig,
    backend: &'a dyn PackageBackend,
    runner: &'a dyn CommandRunner,
    hooks: &'a HookRegistry,
    confirm: &'a dyn Confirm,
    abort: &'a AtomicBool,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(
        global: &'a GlobalConfig,
        backend: &'a dyn PackageBackend,
        runner: &'a dyn CommandRunner,
        hooks: &'a HookRegistry,
        confirm: &'a dyn Confirm,
        abort: &'a AtomicBool,
    ) -> Self {
        Self {
            global,
            backend,
            runner,
            hooks,
            confirm,
            abort,
        }
    }

    /// Build every package in the set
    ///
    /// Declining a confirmation or aborting ends the run with that error;
    /// any other failure is recorded in the report and the next package
    /// starts.
    pub async fn execute(&self, build_set: BuildSet) -> StowageResult<BuildReport> {
        let start = Instant::now();
        let mut report = BuildReport::default();

        for package in build_set.into_values() {
            if self.abort.load(Ordering::SeqCst) {
                return Err(StowageError::Aborted);
            }

            let name = package.package.clone();
            let version = package.version.clone();
            if !self.global.quiet {
                println!();
                println!("{} {}", name.bold(), version.dimmed());
            }

            let tracker = StateTracker::new(&name, self.global.quiet);
            match self.build_one(package, &tracker).await {
                Ok(outcome) => {
                    tracing::info!(package = %name, version = %version, "built");
                    report.built.push(BuiltPackage {
                        package: name,
                        version,
                        outcome,
                    });
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    let state = tracker.current();
                    tracker.enter(PackageState::Failed);
                    tracing::error!(package = %name, phase = %state, error = %error, "build failed");
                    if let Some(output) = error.command_output() {
                        tracing::debug!(package = %name, "{}", output);
                    }
                    report.failed.push(PackageFailure {
                        package: name,
                        state,
                        error,
                    });
                }
            }
        }

        report.duration = start.elapsed();
        Ok(report)
    }

    async fn build_one(
        &self,
        package: PackageConfig,
        tracker: &StateTracker,
    ) -> StowageResult<FinalizeOutcome> {
        let builder = builder_for(&package.builder)?;
        let fakeroot = Fakeroot::new();
        let ctx = BuildContext {
            global: self.global,
            runner: self.runner,
            fakeroot: &fakeroot,
            hooks: self.hooks,
            confirm: self.confirm,
            abort: self.abort,
        };

        let result = builder.build(&ctx, self.backend, package, tracker).await;
        fakeroot.release();
        result.map(|output| output.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DebianBackend;
    use crate::discovery::PackageDiscovery;
    use crate::hooks::HookPhase;
    use crate::testing::{FixedRevision, RecordingRunner};
    use crate::utils::FixedAnswer;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct Fixture {
        source: TempDir,
        build: TempDir,
        global: GlobalConfig,
        runner: RecordingRunner,
        hooks: HookRegistry,
        abort: AtomicBool,
    }

    impl Fixture {
        fn new() -> Self {
            let source = TempDir::new().unwrap();
            let build = TempDir::new().unwrap();
            let global = GlobalConfig {
                base_path: Some(source.path().to_path_buf()),
                build_directory: build.path().to_path_buf(),
                package_repo: Some(build.path().join("repo")),
                maintainer: Some("Ops <ops@example.com>".into()),
                quiet: true,
                ..Default::default()
            };
            Self {
                source,
                build,
                global,
                runner: RecordingRunner::new(),
                hooks: HookRegistry::with_builtins(),
                abort: AtomicBool::new(false),
            }
        }

        fn package(&self, name: &str) -> PackageConfig {
            let path = self.source.path().join(name);
            fs::create_dir_all(&path).unwrap();
            fs::write(path.join("index.html"), "hi").unwrap();

            let mut package = PackageConfig::from_attributes(
                name.to_string(),
                path,
                crate::config::PackageAttributes::default(),
            );
            package.version = "0.7".into();
            package.package_filename = format!("{}_0.7_all.deb", name);
            package
        }

        fn set(&self, packages: Vec<PackageConfig>) -> BuildSet {
            packages.into_iter().map(|p| (p.path.clone(), p)).collect()
        }

        async fn run(&self, set: BuildSet, confirm: bool) -> StowageResult<BuildReport> {
            let backend = DebianBackend::new();
            let confirm = FixedAnswer(confirm);
            PipelineExecutor::new(
                &self.global,
                &backend,
                &self.runner,
                &self.hooks,
                &confirm,
                &self.abort,
            )
            .execute(set)
            .await
        }

        fn repo(&self) -> PathBuf {
            self.build.path().join("repo")
        }
    }

    fn program_sequence(runner: &RecordingRunner) -> Vec<String> {
        runner
            .commands()
            .into_iter()
            .map(|c| match c.args.iter().position(|a| a == "--") {
                Some(idx) => c.args[idx + 1].clone(),
                None => c.program,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_builds_and_moves_artifact() {
        let fx = Fixture::new();
        let set = fx.set(vec![fx.package("web")]);

        let report = fx.run(set, true).await.unwrap();

        assert!(report.success());
        assert_eq!(report.built.len(), 1);
        assert!(fx.repo().join("web_0.7_all.deb").exists());
        assert!(!fx.build.path().join("temp/web").exists());
        assert_eq!(program_sequence(&fx.runner), vec!["chown", "chmod", "dpkg"]);
    }

    #[tokio::test]
    async fn test_hooks_run_in_phase_order() {
        let fx = Fixture::new();
        let mut package = fx.package("web");
        for phase in HookPhase::ALL {
            package
                .hooks
                .insert(phase, vec![format!("shell: echo {}", phase.key())]);
        }

        fx.run(fx.set(vec![package]), true).await.unwrap();

        let shell_lines: Vec<String> = fx
            .runner
            .commands()
            .into_iter()
            .filter(|c| c.program == "sh")
            .map(|c| c.args[1].clone())
            .collect();
        assert_eq!(
            shell_lines,
            vec![
                "echo pre_copy",
                "echo post_copy",
                "echo pre_conf",
                "echo post_conf",
                "echo post_permissions",
            ]
        );
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let fx = Fixture::new();
        let mut broken = fx.package("alpha");
        broken
            .hooks
            .insert(HookPhase::PostCopy, vec!["no.such.hook".into()]);
        let set = fx.set(vec![broken, fx.package("beta")]);

        let report = fx.run(set, true).await.unwrap();

        assert_eq!(report.built.len(), 1);
        assert_eq!(report.built[0].package, "beta");
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].package, "alpha");
        assert_eq!(report.failed[0].state, PackageState::PostCopy);
        assert!(matches!(report.failed[0].error, StowageError::Import { .. }));

        let err = report.into_result().unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_declined_stops_the_run() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.build.path().join("temp/alpha")).unwrap();
        let set = fx.set(vec![fx.package("alpha"), fx.package("beta")]);

        let err = fx.run(set, false).await.unwrap_err();

        assert!(matches!(err, StowageError::Declined { .. }));
        assert!(!fx.repo().join("beta_0.7_all.deb").exists());
    }

    #[tokio::test]
    async fn test_abort_flag_stops_before_next_package() {
        let fx = Fixture::new();
        fx.abort.store(true, Ordering::SeqCst);
        let set = fx.set(vec![fx.package("alpha")]);

        let err = fx.run(set, true).await.unwrap_err();
        assert!(matches!(err, StowageError::Aborted));
        assert!(fx.runner.commands().is_empty());
    }

    #[tokio::test]
    async fn test_skipped_package_never_reaches_the_backend() {
        let fx = Fixture::new();
        for name in ["alpha", "beta"] {
            let dir = fx.source.path().join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("debian.yml"), "architecture: all\n").unwrap();
            fs::write(dir.join("index.html"), "hi").unwrap();
        }
        fs::create_dir_all(fx.repo()).unwrap();
        fs::write(fx.repo().join("alpha_0.7_all.deb"), "old").unwrap();

        let backend = DebianBackend::new();
        let resolver = FixedRevision("7");
        let set = PackageDiscovery::new(&fx.global, &backend, &fx.runner, Some(&resolver))
            .discover(fx.source.path())
            .await
            .unwrap();
        assert_eq!(set.len(), 1);

        let report = fx.run(set, true).await.unwrap();

        assert_eq!(report.built.len(), 1);
        assert_eq!(report.built[0].package, "beta");
        let commands = fx.runner.commands();
        assert_eq!(commands.len(), 3);
        assert!(commands
            .iter()
            .all(|c| c.args.iter().all(|a| !a.contains("alpha"))));
        assert!(!fx.build.path().join("temp/alpha").exists());
        assert_eq!(fs::read_to_string(fx.repo().join("alpha_0.7_all.deb")).unwrap(), "old");
    }

    #[tokio::test]
    async fn test_archiver_failure_reports_build_phase() {
        let fx = Fixture::new();
        fx.runner.fail("dpkg");
        let set = fx.set(vec![fx.package("alpha")]);

        let report = fx.run(set, true).await.unwrap();
        assert_eq!(report.failed[0].state, PackageState::Build);
        assert_eq!(report.failed[0].error.command_output(), Some("dpkg failed"));
        assert!(!Path::new(&fx.repo().join("alpha_0.7_all.deb")).exists());
    }
}
