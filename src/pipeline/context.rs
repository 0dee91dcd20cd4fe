// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Per-package build context
//!
//! Bundles the collaborators a phase may need. Nothing here is global: the
//! executor builds one context per package and drops it afterwards.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{GlobalConfig, PackageConfig};
use crate::errors::{StowageError, StowageResult};
use crate::executors::{CommandOutput, CommandRequest, CommandRunner, Fakeroot};
use crate::hooks::{HookPhase, HookRegistry};
use crate::utils::Confirm;

/// Collaborators available to phases and hooks
pub struct BuildContext<'a> {
    pub global: &'a GlobalConfig,
    pub runner: &'a dyn CommandRunner,
    pub fakeroot: &'a Fakeroot,
    pub hooks: &'a HookRegistry,
    pub confirm: &'a dyn Confirm,
    pub abort: &'a AtomicBool,
}

impl<'a> BuildContext<'a> {
    /// Fail with `Aborted` once an interrupt has been requested
    pub fn checkpoint(&self) -> StowageResult<()> {
        if self.abort.load(Ordering::SeqCst) {
            Err(StowageError::Aborted)
        } else {
            Ok(())
        }
    }

    /// Run the hooks registered for a phase
    pub async fn run_hooks(
        &self,
        phase: HookPhase,
        package: PackageConfig,
    ) -> StowageResult<PackageConfig> {
        self.checkpoint()?;
        self.hooks.run(phase, self, package).await
    }

    /// Run a command in the package's fakeroot session
    pub async fn privileged(&self, request: &CommandRequest) -> StowageResult<CommandOutput> {
        self.fakeroot.run(self.runner, request).await
    }

    /// Run a command as the current user
    pub async fn run(&self, request: &CommandRequest) -> StowageResult<CommandOutput> {
        self.runner.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    #[test]
    fn test_checkpoint_observes_abort() {
        let harness = TestHarness::new();
        let registry = HookRegistry::new();
        let ctx = harness.context(&registry);

        assert!(ctx.checkpoint().is_ok());
        harness.abort.store(true, Ordering::SeqCst);
        assert!(matches!(ctx.checkpoint(), Err(StowageError::Aborted)));
    }

    #[tokio::test]
    async fn test_privileged_goes_through_fakeroot() {
        let harness = TestHarness::new();
        let registry = HookRegistry::new();
        let ctx = harness.context(&registry);

        ctx.privileged(&CommandRequest::new("chmod", ["-R", "a-s", "/x"]))
            .await
            .unwrap();
        ctx.run(&CommandRequest::new("true", Vec::<String>::new()))
            .await
            .unwrap();

        let commands = harness.runner.commands();
        assert_eq!(commands[0].program, "fakeroot");
        assert_eq!(commands[1].program, "true");
        assert!(harness.fakeroot.is_active());
    }
}
