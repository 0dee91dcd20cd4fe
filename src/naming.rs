// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Package naming
//!
//! Packages without an explicit name are named after their location:
//! `/base/apps/suitcase_test` with prefix `gcap` becomes
//! `gcap-apps-suitcase-test`.

use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::utils::relative_to_base;

fn separator_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s_.]+").expect("separator pattern is valid"))
}

fn valid_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9\-+]+$").expect("name pattern is valid"))
}

/// Derive a package name from a directory's position under `base_path`
pub fn derive_name(
    base_path: &Path,
    package_path: &Path,
    prefix: Option<&str>,
    filters: &BTreeMap<String, String>,
) -> String {
    let relative = relative_to_base(base_path, package_path);

    let parts: Vec<&str> = prefix
        .into_iter()
        .chain(relative.split('/'))
        .filter(|part| !part.is_empty())
        .collect();

    normalize(&parts.join("-"), filters)
}

/// Replace whitespace, underscore and period runs with `-`, then apply the
/// literal filters
pub fn normalize(name: &str, filters: &BTreeMap<String, String>) -> String {
    let mut name = separator_runs().replace_all(name, "-").into_owned();
    for (literal, replacement) in filters {
        name = name.replace(literal.as_str(), replacement);
    }
    name
}

/// Lowercase alphanumerics, `-` and `+` only
pub fn is_valid_name(name: &str) -> bool {
    valid_name().is_match(name)
}
