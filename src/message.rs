//! Single-line rendering of error messages.
//!
//! Regex and TOML parse errors render as multi-line caret diagrams, and the
//! crate's error types already embed their source in `Display`. Everything
//! printed for a failure goes through here so it stays on one line.

use std::fmt::Display;

/// Collapse a multi-line message onto one line.
pub fn one_line(message: &dyn Display) -> String {
    message
        .to_string()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render an error and its causes as `outer: cause: ...` on one line.
///
/// Causes whose text is already part of the message are skipped.
pub fn error_chain(error: &anyhow::Error) -> String {
    let mut message = String::new();
    for cause in error.chain() {
        let text = one_line(&cause);
        if text.is_empty() || message.contains(&text) {
            continue;
        }
        if !message.is_empty() {
            message.push_str(": ");
        }
        message.push_str(&text);
    }
    message
}
