// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! `{{key}}` placeholder substitution for metadata templates

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::errors::{StowageError, StowageResult};

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Replace every placeholder with its value
///
/// A placeholder without a value fails with `<key> missing from config`.
pub fn render(template: &str, values: &BTreeMap<String, String>) -> StowageResult<String> {
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;

    for captures in placeholder().captures_iter(template) {
        let (Some(whole), Some(key)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let value = values.get(key.as_str()).ok_or_else(|| StowageError::Packaging {
            message: format!("{} missing from config", key.as_str()),
            help: Some(format!("Set '{}' in the package descriptor", key.as_str())),
        })?;

        rendered.push_str(&template[last..whole.start()]);
        rendered.push_str(value);
        last = whole.end();
    }

    rendered.push_str(&template[last..]);
    Ok(rendered)
}
