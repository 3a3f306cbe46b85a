//! Message rules: what a stored message looks like and which bodies are
//! accepted.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ContentError;
use crate::role::Role;

/// Upper bound on normalized content, counted in Unicode scalar values.
pub const MAX_CONTENT_CHARS: usize = 240;

/// A stored message row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: i64,
    pub sender: Role,
    pub content: String,
    /// UTC, second precision, e.g. `2025-01-31T09:15:00Z`.
    pub created_at: String,
}

/// Message body that has passed normalization and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    /// Normalize `raw` and check the length rules.
    pub fn parse(raw: &str) -> Result<Self, ContentError> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Err(ContentError::Empty);
        }
        let len = normalized.chars().count();
        if len > MAX_CONTENT_CHARS {
            return Err(ContentError::TooLong {
                len,
                max: MAX_CONTENT_CHARS,
            });
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Trim, replace every line break with one space, trim again.
///
/// `\r\n` counts as a single break. Blank lines are not squeezed: `"a\n\nb"`
/// becomes `"a  b"`. Trimming also strips the C0 separators U+001C..=U+001F.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim_matches(is_space);
    let mut out = String::with_capacity(trimmed.len());
    let mut chars = trimmed.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push(' ');
        } else if is_line_break(c) {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out.trim_matches(is_space).to_owned()
}

fn is_space(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\u{0b}'
            | '\u{0c}'
            | '\u{1c}'
            | '\u{1d}'
            | '\u{1e}'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

/// Timestamp string written to `created_at`.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
