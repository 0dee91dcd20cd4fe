// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Git revisions

use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use super::{capture, query, RevisionResolver};
use crate::errors::StowageResult;
use crate::executors::{CommandRequest, CommandRunner};

fn commit_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^commit ([A-Za-z0-9_-]+)").expect("commit pattern is valid"))
}

/// Latest commit id touching the checkout
pub struct Git;

impl Git {
    pub fn parse(output: &str, path: &Path) -> StowageResult<String> {
        capture(commit_line(), output, "git version", path)
    }
}

#[async_trait]
impl RevisionResolver for Git {
    async fn revision(&self, runner: &dyn CommandRunner, path: &Path) -> StowageResult<String> {
        let request = CommandRequest::new("git", ["log", "-1"]).current_dir(path);
        let output = query(runner, request, path).await?;
        Self::parse(&output.output, path)
    }
}
