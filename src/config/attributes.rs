// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Descriptor and collection attributes
//!
//! A descriptor file and a collection bundle share one key vocabulary.
//! Unknown keys are kept in `extra` so hooks can read their own settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::{StowageError, StowageResult};
use crate::hooks::HookPhase;
use crate::mapping::DestinationMapping;

/// A value that may be written as a single string or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// Entries in declared order
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s.clone()],
            Self::Many(v) => v.clone(),
        }
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(v: Vec<String>) -> Self {
        Self::Many(v)
    }
}

/// Keys recognised in descriptor files and collection definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageAttributes {
    /// Explicit package name
    pub package: Option<String>,

    /// Accepted for compatibility; the version always comes from VCS
    #[serde(skip_serializing)]
    pub version: Option<serde_yaml::Value>,

    pub architecture: Option<String>,
    pub depends: Option<OneOrMany>,
    pub maintainer: Option<String>,
    pub description: Option<String>,

    /// Paths, relative to the staged root, to mark as configuration files
    pub conffiles: Option<Vec<String>>,

    pub destination_mapping: Option<DestinationMapping>,
    pub build_exclusions: Option<Vec<String>>,
    pub path_exclusions: Option<Vec<String>>,

    pub pre_copy: Option<OneOrMany>,
    pub post_copy: Option<OneOrMany>,
    pub pre_conf: Option<OneOrMany>,
    pub post_conf: Option<OneOrMany>,
    pub post_permissions: Option<OneOrMany>,

    /// Orchestration strategy
    pub builder: Option<String>,

    /// Everything else
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl PackageAttributes {
    /// Parse a descriptor file
    ///
    /// An empty or `null` document is rejected: a descriptor that exists
    /// must say something.
    pub fn from_file(path: &Path) -> StowageResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StowageError::configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;

        Self::from_yaml(&content).map_err(|e| match e {
            StowageError::Configuration { help, .. } => StowageError::Configuration {
                message: format!("Config file {} is invalid", path.display()),
                help,
            },
            other => other,
        })
    }

    /// Parse descriptor contents
    pub fn from_yaml(content: &str) -> StowageResult<Self> {
        let parsed: Option<Self> =
            serde_yaml::from_str(content).map_err(|e| StowageError::Configuration {
                message: "descriptor is not valid YAML".to_string(),
                help: Some(e.to_string()),
            })?;

        parsed.ok_or_else(|| StowageError::configuration("descriptor is empty"))
    }

    /// Hook identifiers declared for a phase
    pub fn hooks(&self, phase: HookPhase) -> Vec<String> {
        let declared = match phase {
            HookPhase::PreCopy => &self.pre_copy,
            HookPhase::PostCopy => &self.post_copy,
            HookPhase::PreConf => &self.pre_conf,
            HookPhase::PostConf => &self.post_conf,
            HookPhase::PostPermissions => &self.post_permissions,
        };
        declared.as_ref().map(OneOrMany::to_vec).unwrap_or_default()
    }

    /// Overlay `top` on `self`; keys set in `top` win
    pub fn overlay(self, top: PackageAttributes) -> PackageAttributes {
        let mut extra = self.extra;
        extra.extend(top.extra);

        PackageAttributes {
            package: top.package.or(self.package),
            version: top.version.or(self.version),
            architecture: top.architecture.or(self.architecture),
            depends: top.depends.or(self.depends),
            maintainer: top.maintainer.or(self.maintainer),
            description: top.description.or(self.description),
            conffiles: top.conffiles.or(self.conffiles),
            destination_mapping: top.destination_mapping.or(self.destination_mapping),
            build_exclusions: top.build_exclusions.or(self.build_exclusions),
            path_exclusions: top.path_exclusions.or(self.path_exclusions),
            pre_copy: top.pre_copy.or(self.pre_copy),
            post_copy: top.post_copy.or(self.post_copy),
            pre_conf: top.pre_conf.or(self.pre_conf),
            post_conf: top.post_conf.or(self.post_conf),
            post_permissions: top.post_permissions.or(self.post_permissions),
            builder: top.builder.or(self.builder),
            extra,
        }
    }
}
