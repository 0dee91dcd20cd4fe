// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Error types
//!
//! Every failure carries a kind that machine consumers can match on and an
//! exit code for the CLI. Human-readable rendering is left to miette.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for stowage operations
pub type StowageResult<T> = Result<T, StowageError>;

/// Coarse classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A hook, builder or backend could not be resolved
    Import,
    /// Structural build failure
    Packaging,
    /// An external command failed, timed out or was missing
    Command,
    /// Revision lookup failed
    Vcs,
    /// Staging copy precondition failed
    Copy,
    /// Descriptor or global configuration is invalid
    Configuration,
    /// The user declined a destructive action
    Declined,
    /// The run was interrupted
    Aborted,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Import => write!(f, "import"),
            Self::Packaging => write!(f, "packaging"),
            Self::Command => write!(f, "command"),
            Self::Vcs => write!(f, "vcs"),
            Self::Copy => write!(f, "copy"),
            Self::Configuration => write!(f, "configuration"),
            Self::Declined => write!(f, "declined"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Main error type for stowage
#[derive(Error, Debug, Diagnostic)]
pub enum StowageError {
    // ─────────────────────────────────────────────────────────────────────────
    // Resolution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Import error: {what} '{name}' cannot be resolved")]
    #[diagnostic(code(stowage::import))]
    Import {
        what: String,
        name: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Packaging Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Packaging error: {message}")]
    #[diagnostic(code(stowage::packaging))]
    Packaging {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("{failed} of {total} package(s) failed to build")]
    #[diagnostic(
        code(stowage::build_failed),
        help("Re-run with --verbose to see the full output of the failing phase")
    )]
    BuildFailed { failed: usize, total: usize },

    // ─────────────────────────────────────────────────────────────────────────
    // Command Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Command error: '{command}' exited with status {exit_code}")]
    #[diagnostic(code(stowage::command_failed))]
    Command {
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("Command error: {command} not found")]
    #[diagnostic(code(stowage::command_not_found), help("{suggestion}"))]
    CommandNotFound { command: String, suggestion: String },

    #[error("Command error: '{command}' did not finish within {seconds}s")]
    #[diagnostic(
        code(stowage::command_timeout),
        help("Raise command_timeout_secs in the configuration if the command is just slow")
    )]
    CommandTimeout { command: String, seconds: u64 },

    // ─────────────────────────────────────────────────────────────────────────
    // VCS / Copy / Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("VCS error: {message}")]
    #[diagnostic(code(stowage::vcs))]
    Vcs { message: String },

    #[error("File copy error: {message}")]
    #[diagnostic(code(stowage::copy))]
    Copy { message: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(stowage::configuration))]
    Configuration {
        message: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Run Control
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Declined to delete {path}")]
    #[diagnostic(code(stowage::declined))]
    Declined { path: PathBuf },

    #[error("Build aborted")]
    #[diagnostic(code(stowage::aborted))]
    Aborted,

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(stowage::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(stowage::yaml_error))]
    Yaml { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(stowage::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(stowage::toml_error))]
    Toml { message: String },

    #[error("Glob pattern error: {message}")]
    #[diagnostic(code(stowage::glob_error))]
    GlobPattern { message: String },
}

impl From<std::io::Error> for StowageError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for StowageError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for StowageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for StowageError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl From<glob::PatternError> for StowageError {
    fn from(e: glob::PatternError) -> Self {
        Self::GlobPattern { message: e.to_string() }
    }
}

impl StowageError {
    /// Create a packaging error without a hint
    pub fn packaging(message: impl Into<String>) -> Self {
        Self::Packaging {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error without a hint
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: None,
        }
    }

    /// Create a VCS error
    pub fn vcs(message: impl Into<String>) -> Self {
        Self::Vcs { message: message.into() }
    }

    /// Create a copy error
    pub fn copy(message: impl Into<String>) -> Self {
        Self::Copy { message: message.into() }
    }

    /// Create a command-not-found error with an installation hint
    pub fn command_not_found(command: &str) -> Self {
        let suggestion = RecoverySuggestion::install_tool(command).action;
        Self::CommandNotFound {
            command: command.to_string(),
            suggestion,
        }
    }

    /// Machine-readable classification
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Import { .. } => ErrorKind::Import,
            Self::Packaging { .. } | Self::BuildFailed { .. } => ErrorKind::Packaging,
            Self::Command { .. } | Self::CommandNotFound { .. } | Self::CommandTimeout { .. } => {
                ErrorKind::Command
            }
            Self::Vcs { .. } => ErrorKind::Vcs,
            Self::Copy { .. } => ErrorKind::Copy,
            Self::Configuration { .. }
            | Self::Yaml { .. }
            | Self::Json { .. }
            | Self::Toml { .. }
            | Self::GlobPattern { .. } => ErrorKind::Configuration,
            Self::Declined { .. } => ErrorKind::Declined,
            Self::Aborted => ErrorKind::Aborted,
            Self::Io { .. } => ErrorKind::Packaging,
        }
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Declined => 1,
            ErrorKind::Packaging => 2,
            ErrorKind::Configuration => 3,
            ErrorKind::Import => 4,
            ErrorKind::Command => 5,
            ErrorKind::Vcs => 6,
            ErrorKind::Copy => 7,
            ErrorKind::Aborted => 130,
        }
    }

    /// Whether this error must stop the whole run rather than a single package
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Declined | ErrorKind::Aborted)
    }

    /// Captured output of a failed external command, if any
    pub fn command_output(&self) -> Option<&str> {
        match self {
            Self::Command { output, .. } => Some(output),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declined_exits_with_one() {
        let err = StowageError::Declined {
            path: PathBuf::from("/tmp/build/temp/pkg"),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_command_errors_share_a_kind() {
        let failed = StowageError::Command {
            command: "dpkg -b".into(),
            exit_code: 2,
            output: "boom".into(),
        };
        let missing = StowageError::command_not_found("dpkg");

        assert_eq!(failed.kind(), ErrorKind::Command);
        assert_eq!(missing.kind(), ErrorKind::Command);
        assert_eq!(failed.command_output(), Some("boom"));
        assert!(!failed.is_fatal());
    }

    #[test]
    fn test_not_found_carries_install_hint() {
        match StowageError::command_not_found("fakeroot") {
            StowageError::CommandNotFound { suggestion, .. } => {
                assert!(suggestion.contains("fakeroot"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_display_prefixes_kind() {
        let err = StowageError::packaging("A duplicate package name exists");
        assert_eq!(
            err.to_string(),
            "Packaging error: A duplicate package name exists"
        );
    }
}
