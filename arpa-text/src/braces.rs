//! Validation of brace-escaped regions in text.
//!
//! Text passed to the converter may already contain pronunciations wrapped in
//! braces, eg. `"I {R EH1 D} it"`. Braced regions are copied to the output
//! untouched, so they must be well formed: braces do not nest, and every
//! opening brace has a matching closing brace.

use std::error::Error;
use std::fmt;

/// Ways in which brace-escaped text can be malformed.
///
/// Each variant carries the full text that failed validation.
#[derive(Clone, Debug, PartialEq)]
pub enum BraceError {
    /// An opening brace was found inside a braced region.
    Nested(String),

    /// A closing brace was found outside of a braced region.
    UnmatchedClose(String),

    /// The text ended inside a braced region.
    UnmatchedOpen(String),
}

impl BraceError {
    /// Return the text that failed validation.
    pub fn text(&self) -> &str {
        match self {
            Self::Nested(text) | Self::UnmatchedClose(text) | Self::UnmatchedOpen(text) => text,
        }
    }
}

impl fmt::Display for BraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Nested(_) => "nested braces",
            Self::UnmatchedClose(_) => "closing brace without opening",
            Self::UnmatchedOpen(_) => "opening brace without closing",
        };
        write!(f, "invalid brace-marked text ({}) in \"{}\"", reason, self.text())
    }
}

impl Error for BraceError {}

/// Check that braces in `text` are balanced and not nested.
pub fn check_braces(text: &str) -> Result<(), BraceError> {
    let mut in_braces = false;
    for ch in text.chars() {
        match (ch, in_braces) {
            ('{', false) => in_braces = true,
            ('{', true) => return Err(BraceError::Nested(text.to_string())),
            ('}', true) => in_braces = false,
            ('}', false) => return Err(BraceError::UnmatchedClose(text.to_string())),
            _ => {}
        }
    }
    if in_braces {
        return Err(BraceError::UnmatchedOpen(text.to_string()));
    }
    Ok(())
}

/// Non-failing variant of [`check_braces`].
pub fn braces_balanced(text: &str) -> bool {
    check_braces(text).is_ok()
}

/// Return true if `word` is wrapped in a single pair of braces, eg. `{K AE1 T}`.
pub fn is_braced(word: &str) -> bool {
    word.len() >= 2 && word.starts_with('{') && word.ends_with('}')
}
