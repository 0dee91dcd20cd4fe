// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Utility modules
//!
//! Terminal styling, progress spinners, confirmation prompts and path helpers.

pub mod colors;
pub mod paths;
pub mod prompt;
pub mod spinner;

pub use colors::*;
pub use paths::*;
pub use prompt::*;
pub use spinner::*;

/// Concatenate lists keeping only the first occurrence of each entry
pub fn merge_unique(first: &[String], second: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(first.len() + second.len());
    for item in first.iter().chain(second) {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}
