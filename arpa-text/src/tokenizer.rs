//! Tokenizers which split a line of text into words, punctuation and brace
//! markers prior to part-of-speech tagging and dictionary lookup.

use std::error::Error;
use std::fmt;

use fancy_regex::Regex;
use unicode_categories::UnicodeCategories;

/// Errors occuring while constructing a [`Tokenizer`] or splitting input
/// using one.
#[derive(Clone, Debug)]
pub enum TokenizeError {
    /// An error occurred while constructing a regex from a pattern or
    /// splitting a string using a regex.
    RegexError(Box<fancy_regex::Error>),
}

impl fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegexError(err) => write!(f, "regex failed {}", err),
        }
    }
}

impl Error for TokenizeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::RegexError(err) => Some(err),
        }
    }
}

impl From<fancy_regex::Error> for TokenizeError {
    fn from(val: fancy_regex::Error) -> Self {
        TokenizeError::RegexError(Box::new(val))
    }
}

/// A tokenizer splits a line of text into tokens.
///
/// Tokens are returned as sub-slices of the input so that callers can find
/// them again in the original text when substituting pronunciations.
pub trait Tokenizer: Send + Sync {
    /// Split `text` into tokens.
    fn tokenize<'a>(&self, text: &'a str) -> Result<Vec<&'a str>, TokenizeError>;
}

/// Pattern used by [`WordTokenizer`].
///
/// Alternatives, in order of priority:
///
/// - Brace markers, which open and close escaped regions
/// - Words, which may contain internal apostrophes and hyphens so that
///   possessives ("cat's"), contractions ("we'll") and hyphenated compounds
///   ("well-known") stay in one piece
/// - Any other single non-space character
pub const WORD_REGEX: &str = r"\{|\}|[\p{L}\p{N}]+(?:['\-][\p{L}\p{N}]+)*|[^\s\p{L}\p{N}]";

/// Tokenizer which emits the matches of a regex pattern. Text between
/// matches is discarded.
pub struct Split {
    regex: Regex,
}

impl Split {
    pub fn new(pattern: &str) -> Result<Self, TokenizeError> {
        let regex = Regex::new(pattern)?;
        Ok(Split { regex })
    }
}

impl Tokenizer for Split {
    fn tokenize<'a>(&self, text: &'a str) -> Result<Vec<&'a str>, TokenizeError> {
        let mut chunks = Vec::new();
        for match_ in self.regex.find_iter(text) {
            let match_ = match_?;
            if !match_.range().is_empty() {
                chunks.push(match_.as_str());
            }
        }
        Ok(chunks)
    }
}

/// Tokenizer for English text which splits on whitespace and punctuation,
/// using [`WORD_REGEX`].
pub struct WordTokenizer {
    split: Split,
}

impl WordTokenizer {
    pub fn new() -> WordTokenizer {
        WordTokenizer {
            split: Split::new(WORD_REGEX).expect("should be a valid pattern"),
        }
    }
}

impl Default for WordTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize<'a>(&self, text: &'a str) -> Result<Vec<&'a str>, TokenizeError> {
        self.split.tokenize(text)
    }
}

/// Return true if `token` contains at least one alphabetic character.
///
/// Tokens without letters (numbers, punctuation) are never looked up.
pub fn contains_alpha(token: &str) -> bool {
    token.chars().any(char::is_alphabetic)
}

/// Return true if every character of `token` is punctuation.
pub fn is_punctuation(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|ch| ch.is_ascii_punctuation() || ch.is_punctuation())
}
