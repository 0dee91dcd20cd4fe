// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Subversion revisions
//!
//! The working copy's own revision can lag behind the branch, so the
//! remote URL is looked up first and the branch log queried directly.

use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use super::{capture, query, RevisionResolver};
use crate::errors::StowageResult;
use crate::executors::{CommandRequest, CommandRunner};

fn url_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^URL: (.*?)$").expect("url pattern is valid"))
}

fn revision_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^r(\d+) ").expect("revision pattern is valid"))
}

/// Latest revision of the remote branch
pub struct Subversion;

impl Subversion {
    pub fn parse_url(info: &str, path: &Path) -> StowageResult<String> {
        capture(url_line(), info, "svn url", path).map(|url| url.trim().to_string())
    }

    pub fn parse_revision(log: &str, path: &Path) -> StowageResult<String> {
        capture(revision_line(), log, "svn version", path)
    }
}

#[async_trait]
impl RevisionResolver for Subversion {
    async fn revision(&self, runner: &dyn CommandRunner, path: &Path) -> StowageResult<String> {
        let target = path.to_string_lossy();
        let info = query(runner, CommandRequest::new("svn", ["info", target.as_ref()]), path).await?;
        let url = Self::parse_url(&info.output, path)?;

        let log = query(
            runner,
            CommandRequest::new("svn", ["log", "-q", "--limit", "1", url.as_str()]),
            path,
        )
        .await?;
        Self::parse_revision(&log.output, path)
    }
}
