// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Confirmation prompts

use console::Term;
use std::io::{BufRead, IsTerminal, Write};

/// Asks the user before a destructive action
pub trait Confirm: Send + Sync {
    /// Returns true when the action may go ahead
    fn confirm(&self, prompt: &str) -> bool;
}

/// Interpret one line of input; an empty line takes the default
fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "" | "yes" | "y" => Some(true),
        "no" | "n" => Some(false),
        _ => None,
    }
}

/// Ask on `output` and read answers line by line from `input`
///
/// End of input or a read error declines.
fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> bool {
    loop {
        if write!(output, "{} (yes, no) [yes]: ", prompt)
            .and_then(|_| output.flush())
            .is_err()
        {
            return false;
        }

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => return false,
            Ok(_) => {}
        }
        if let Some(answer) = parse_answer(&line) {
            return answer;
        }
    }
}

/// Interactive yes/no prompt, defaulting to yes
///
/// On a terminal the answer is read through the console; otherwise piped
/// stdin is read, and closed input counts as no.
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            return ask(&mut stdin.lock(), &mut std::io::stderr(), prompt);
        }

        let term = Term::stderr();
        loop {
            if term
                .write_str(&format!("{} (yes, no) [yes]: ", prompt))
                .is_err()
            {
                return false;
            }
            let Ok(answer) = term.read_line() else {
                return false;
            };
            if let Some(answer) = parse_answer(&answer) {
                return answer;
            }
        }
    }
}

/// Answers every prompt with a fixed value
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
