// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Per-package build record

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::PackageAttributes;
use crate::hooks::HookPhase;
use crate::mapping::DestinationMapping;
use crate::pipeline::DEFAULT_BUILDER;

/// Everything the pipeline knows about one package
///
/// Created during discovery and owned by value from then on: every hook
/// receives the record and hands back the one later phases see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageConfig {
    pub package: String,

    /// Absolute source directory
    pub path: PathBuf,

    pub architecture: String,

    /// `0.<revision>`
    pub version: String,

    pub package_filename: String,

    /// Staging root, set once the pipeline creates it
    pub working_dir: Option<PathBuf>,

    /// Package-level mapping; carries a `root` key once staged
    pub destination_mapping: DestinationMapping,

    pub depends: Vec<String>,
    pub maintainer: Option<String>,
    pub description: Option<String>,
    pub conffiles: Vec<String>,
    pub build_exclusions: Vec<String>,
    pub path_exclusions: Vec<String>,

    /// Declared hooks per phase, collection defaults already merged in
    pub hooks: BTreeMap<HookPhase, Vec<String>>,

    pub builder: String,

    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl PackageConfig {
    /// Seed a record from merged attributes
    ///
    /// `version` and `package_filename` are filled in by discovery once the
    /// revision is known.
    pub fn from_attributes(name: String, path: PathBuf, attributes: PackageAttributes) -> Self {
        let hooks = HookPhase::ALL
            .iter()
            .map(|phase| (*phase, attributes.hooks(*phase)))
            .filter(|(_, hooks)| !hooks.is_empty())
            .collect();

        Self {
            package: name,
            path,
            architecture: attributes.architecture.unwrap_or_else(|| "all".to_string()),
            version: String::new(),
            package_filename: String::new(),
            working_dir: None,
            destination_mapping: attributes.destination_mapping.unwrap_or_default(),
            depends: attributes.depends.map(|d| d.to_vec()).unwrap_or_default(),
            maintainer: attributes.maintainer,
            description: attributes.description,
            conffiles: attributes.conffiles.unwrap_or_default(),
            build_exclusions: attributes.build_exclusions.unwrap_or_default(),
            path_exclusions: attributes.path_exclusions.unwrap_or_default(),
            hooks,
            builder: attributes
                .builder
                .unwrap_or_else(|| DEFAULT_BUILDER.to_string()),
            extra: attributes.extra,
        }
    }

    /// Hooks declared on the package for a phase
    pub fn hooks(&self, phase: HookPhase) -> &[String] {
        self.hooks.get(&phase).map(Vec::as_slice).unwrap_or(&[])
    }

    /// String value of a hook-specific setting
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}
