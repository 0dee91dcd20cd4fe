// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from errors.

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Suggest installing a missing external tool
    pub fn install_tool(tool: &str) -> Self {
        let debian_package = match tool {
            "dpkg" | "dpkg-deb" => Some("dpkg"),
            "fakeroot" => Some("fakeroot"),
            "git" => Some("git"),
            "svn" => Some("subversion"),
            "bzr" => Some("bzr"),
            _ => None,
        };

        match debian_package {
            Some(package) => Self {
                action: format!("Install {} and ensure '{}' is in your PATH", package, tool),
                commands: vec![
                    "# Debian/Ubuntu:".into(),
                    format!("sudo apt-get install {}", package),
                ],
            },
            None => Self {
                action: format!("Install {} and ensure it's in your PATH", tool),
                commands: vec![],
            },
        }
    }

    /// Suggest fixing two descriptors that resolve to the same package name
    pub fn fix_duplicate_package(name: &str) -> Self {
        Self {
            action: format!(
                "Give one of the packages named '{}' an explicit 'package' key",
                name
            ),
            commands: vec![
                "# Inspect what would be built:".into(),
                "stowage plan <ROOT>".into(),
            ],
        }
    }

    /// Format the suggestion for terminal display
    pub fn format(&self) -> String {
        let mut out = self.action.clone();
        if !self.commands.is_empty() {
            out.push('\n');
            for command in &self.commands {
                out.push_str("\n  ");
                out.push_str(command);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_known_tool() {
        let suggestion = RecoverySuggestion::install_tool("svn");
        assert!(suggestion.action.contains("subversion"));
        assert!(suggestion.format().contains("apt-get install subversion"));
    }

    #[test]
    fn test_install_unknown_tool() {
        let suggestion = RecoverySuggestion::install_tool("mytool");
        assert!(suggestion.commands.is_empty());
        assert_eq!(suggestion.format(), suggestion.action);
    }
}
