// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Path helpers
//!
//! Mapping fragments are plain `/`-separated strings, not `Path`s, because
//! they describe locations inside a package that does not exist yet.

use std::path::{Path, PathBuf};

/// Expand a leading `~` to the current user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match directories::BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(rest),
        None => path.to_path_buf(),
    }
}

/// Trim whitespace and drop one leading `/`
pub fn strip_leading_slash(fragment: &str) -> &str {
    let fragment = fragment.trim();
    fragment.strip_prefix('/').unwrap_or(fragment)
}

/// Join two fragments the way POSIX path joining does
///
/// An absolute `tail` replaces `head`; empty parts are ignored.
pub fn join_fragment(head: &str, tail: &str) -> String {
    if tail.starts_with('/') || head.is_empty() {
        return tail.to_string();
    }
    if tail.is_empty() {
        return head.to_string();
    }
    if head.ends_with('/') {
        format!("{}{}", head, tail)
    } else {
        format!("{}/{}", head, tail)
    }
}

/// Express `path` relative to `base` as a `/`-separated string
///
/// Paths outside `base` are returned whole, minus the leading slash.
pub fn relative_to_base(base: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .filter(|c| c != "/")
        .collect::<Vec<_>>()
        .join("/");
    strip_leading_slash(&joined).to_string()
}
