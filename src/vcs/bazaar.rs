// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Bazaar revisions

use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use super::{capture, query, RevisionResolver};
use crate::errors::StowageResult;
use crate::executors::{CommandRequest, CommandRunner};

fn revno_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^revno: (\d+)$").expect("revno pattern is valid"))
}

/// Latest revno of the branch
pub struct Bazaar;

impl Bazaar {
    pub fn parse(output: &str, path: &Path) -> StowageResult<String> {
        capture(revno_line(), output, "bzr version", path)
    }
}

#[async_trait]
impl RevisionResolver for Bazaar {
    async fn revision(&self, runner: &dyn CommandRunner, path: &Path) -> StowageResult<String> {
        let target = path.to_string_lossy();
        let request = CommandRequest::new("bzr", ["log", "-q", "-l", "1", target.as_ref()]);
        let output = query(runner, request, path).await?;
        Self::parse(&output.output, path)
    }
}
