// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Destination mapping
//!
//! Decides where each part of a package's source tree lands inside the
//! staged package root.
//!
//! The global table maps base-relative source paths to staged fragments and
//! may carry a `root` entry that every fragment is joined under. A package
//! directory picks up the mapping of its nearest mapped ancestor, so with
//! `apps: /foo/bar/apps` the package at `apps/blah` stages into
//! `/foo/bar/apps/blah`. A package may add its own mapping on top: its
//! `root` is joined under the resolved root, and every other key sends that
//! source subdirectory to a separate destination.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{StowageError, StowageResult};
use crate::utils::{join_fragment, strip_leading_slash};

/// Key holding the fragment every other entry is joined under
pub const ROOT_KEY: &str = "root";

/// Logical name → path fragment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationMapping(BTreeMap<String, String>);

impl DestinationMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `root` fragment, empty when absent
    pub fn root(&self) -> &str {
        self.0.get(ROOT_KEY).map(String::as_str).unwrap_or("")
    }

    pub fn has_root(&self) -> bool {
        self.0.contains_key(ROOT_KEY)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, fragment: impl Into<String>) {
        self.0.insert(key.into(), fragment.into());
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.insert(key, fragment);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries other than `root`
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(k, _)| k.as_str() != ROOT_KEY)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Staged location → logical name
    ///
    /// Derived on demand from the mapping itself, so it always reflects the
    /// current entries.
    pub fn reverse(&self) -> BTreeMap<String, String> {
        let root = self.root();
        self.0
            .iter()
            .map(|(name, fragment)| (join_fragment(root, fragment), name.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DestinationMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Destination root for a package, from the global table alone
///
/// Walks from the full relative path upwards one segment at a time and uses
/// the first ancestor with an entry; the part of the path below that
/// ancestor is appended. Without a match the relative path itself is joined
/// under the table's root.
pub fn resolve_destination_root(global: &DestinationMapping, relative: &str) -> String {
    let global_root = global.root();
    let mut candidate = relative;

    while !candidate.is_empty() {
        if candidate != ROOT_KEY {
            if let Some(fragment) = global.get(candidate) {
                let remainder = strip_leading_slash(&relative[candidate.len()..]);
                return join_fragment(&join_fragment(global_root, fragment), remainder);
            }
        }
        candidate = match candidate.rfind('/') {
            Some(idx) => &candidate[..idx],
            None => "",
        };
    }

    join_fragment(global_root, relative)
}

/// One source subdirectory and where it is staged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTarget {
    /// Path relative to the package source directory
    pub source: String,
    /// Path relative to the staging root
    pub destination: String,
}

/// Where everything in one package goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPlan {
    /// Staging-relative directory receiving the unmapped remainder
    pub root: String,
    /// Independently mapped subdirectories
    pub targets: Vec<CopyTarget>,
    /// The package mapping as it stands after resolution
    pub mapping: DestinationMapping,
}

impl CopyPlan {
    /// Anchored exclusions keeping mapped subdirectories out of the root copy
    pub fn root_exclusions(&self) -> Vec<String> {
        self.targets
            .iter()
            .map(|t| format!("/{}", strip_leading_slash(&t.source)))
            .collect()
    }
}

/// Resolve a package's copy plan
///
/// `relative` is the package source directory relative to the base path.
pub fn plan_copy(
    global: &DestinationMapping,
    relative: &str,
    package: &DestinationMapping,
) -> StowageResult<CopyPlan> {
    if global.is_empty() && package.is_empty() {
        return Ok(CopyPlan {
            root: String::new(),
            targets: vec![],
            mapping: DestinationMapping::new().with(ROOT_KEY, ""),
        });
    }

    let mut mapping = package.clone();
    let root = if global.is_empty() {
        package.has_root().then(|| package.root().to_string())
    } else {
        let resolved = join_fragment(&resolve_destination_root(global, relative), package.root());
        mapping.insert(ROOT_KEY, resolved.clone());
        Some(resolved)
    };

    let mut targets = Vec::new();
    for (source, fragment) in package.entries() {
        let destination = if fragment.starts_with('/') {
            fragment.to_string()
        } else {
            let root = root.as_deref().ok_or_else(|| StowageError::Packaging {
                message: format!(
                    "Relative mapping '{}: {}' used without setting a root",
                    source, fragment
                ),
                help: Some("Add a 'root' entry to destination_mapping".into()),
            })?;
            join_fragment(root, fragment)
        };

        targets.push(CopyTarget {
            source: source.to_string(),
            destination: strip_leading_slash(&destination).to_string(),
        });
    }

    let root = strip_leading_slash(root.as_deref().unwrap_or("/")).to_string();
    mapping.insert(ROOT_KEY, root.clone());

    Ok(CopyPlan {
        root,
        targets,
        mapping,
    })
}
