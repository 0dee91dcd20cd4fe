// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Revision lookup
//!
//! Package versions come from the revision of the package's source
//! directory in version control. Each supported system is a
//! [`RevisionResolver`]; the configuration names one by [`VcsKind`].

mod bazaar;
mod git;
mod subversion;

pub use bazaar::Bazaar;
pub use git::Git;
pub use subversion::Subversion;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{StowageError, StowageResult};
use crate::executors::{CommandOutput, CommandRequest, CommandRunner};

/// Supported version control systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    Git,
    #[serde(alias = "svn")]
    Subversion,
    #[serde(alias = "bzr")]
    Bazaar,
}

impl VcsKind {
    /// Resolver for this system
    pub fn resolver(self) -> Box<dyn RevisionResolver> {
        match self {
            Self::Git => Box::new(Git),
            Self::Subversion => Box::new(Subversion),
            Self::Bazaar => Box::new(Bazaar),
        }
    }
}

impl std::fmt::Display for VcsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Git => write!(f, "git"),
            Self::Subversion => write!(f, "subversion"),
            Self::Bazaar => write!(f, "bazaar"),
        }
    }
}

/// Looks up the current revision of a directory
#[async_trait]
pub trait RevisionResolver: Send + Sync {
    /// Raw revision identifier (commit id or revision number)
    async fn revision(&self, runner: &dyn CommandRunner, path: &Path) -> StowageResult<String>;
}

/// Run a VCS command, reporting failures as VCS errors
///
/// A missing client keeps its install hint.
pub(crate) async fn query(
    runner: &dyn CommandRunner,
    request: CommandRequest,
    path: &Path,
) -> StowageResult<CommandOutput> {
    runner.run(&request).await.map_err(|e| match e {
        StowageError::CommandNotFound { .. } => e,
        StowageError::Command {
            exit_code, output, ..
        } => StowageError::vcs(format!(
            "Can't find revision for {}: '{}' exited with {}: {}",
            path.display(),
            request.display(),
            exit_code,
            output.trim()
        )),
        other => StowageError::vcs(format!(
            "Can't find revision for {}: {}",
            path.display(),
            other
        )),
    })
}

/// First capture group of `pattern` in `output`
pub(crate) fn capture(pattern: &Regex, output: &str, what: &str, path: &Path) -> StowageResult<String> {
    pattern
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| StowageError::vcs(format!("Can't find {} for {}", what, path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;

    #[test]
    fn test_kind_aliases() {
        let kind: VcsKind = serde_yaml::from_str("svn").unwrap();
        assert_eq!(kind, VcsKind::Subversion);
        let kind: VcsKind = serde_yaml::from_str("bazaar").unwrap();
        assert_eq!(kind, VcsKind::Bazaar);
        assert!(serde_yaml::from_str::<VcsKind>("cvs").is_err());
    }

    #[tokio::test]
    async fn test_resolver_reads_runner_output() {
        let runner = RecordingRunner::new();
        runner.respond("bzr", "revno: 12\ncommitter: Someone\n");

        let revision = VcsKind::Bazaar
            .resolver()
            .revision(&runner, Path::new("/src/app"))
            .await
            .unwrap();
        assert_eq!(revision, "12");
        assert_eq!(runner.commands()[0].args, vec!["log", "-q", "-l", "1", "/src/app"]);
    }

    #[tokio::test]
    async fn test_failed_client_is_vcs_error() {
        let runner = RecordingRunner::new();
        runner.fail("git");

        let err = VcsKind::Git
            .resolver()
            .revision(&runner, Path::new("/src/app"))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 6);
        assert!(err.to_string().contains("/src/app"));
    }
}
