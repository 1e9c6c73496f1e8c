//! Splitting of unhyphenated compound words.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::lexicon::Lexicon;

/// Error reported by a [`Segmenter`].
#[derive(Debug)]
pub enum SegmentError {
    Failed(Box<dyn Error + Send + Sync>),
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(err) => write!(f, "segmentation failed: {}", err),
        }
    }
}

impl Error for SegmentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Failed(err) => Some(err.as_ref()),
        }
    }
}

/// Splits a compound word such as "sunflower" into its parts.
pub trait Segmenter: Send + Sync {
    /// Return the parts of `word`, in order.
    ///
    /// A word that cannot be split is returned as a single part.
    fn segment(&self, word: &str) -> Result<Vec<String>, SegmentError>;
}

/// Segmenter which never splits words.
#[derive(Clone, Debug, Default)]
pub struct NoSegmentation;

impl Segmenter for NoSegmentation {
    fn segment(&self, word: &str) -> Result<Vec<String>, SegmentError> {
        Ok(vec![word.to_string()])
    }
}

/// Configuration for a [`LexiconSegmenter`].
#[derive(Clone, Debug)]
pub struct LexiconSegmenterOptions {
    /// Shortest part, in characters, that may be produced.
    ///
    /// Defaults to 3.
    pub min_part_len: usize,

    /// Words longer than this, in characters, are not segmented.
    ///
    /// Defaults to 100.
    pub max_word_len: usize,
}

impl Default for LexiconSegmenterOptions {
    fn default() -> Self {
        LexiconSegmenterOptions {
            min_part_len: 3,
            max_word_len: 100,
        }
    }
}

/// Segmenter which splits words into lexicon entries by repeatedly taking
/// the longest prefix of the remaining text that is in the lexicon.
#[derive(Clone, Debug)]
pub struct LexiconSegmenter {
    lexicon: Arc<Lexicon>,
    opts: LexiconSegmenterOptions,
}

impl LexiconSegmenter {
    pub fn new(lexicon: Arc<Lexicon>) -> LexiconSegmenter {
        Self::with_options(lexicon, LexiconSegmenterOptions::default())
    }

    pub fn with_options(lexicon: Arc<Lexicon>, opts: LexiconSegmenterOptions) -> LexiconSegmenter {
        LexiconSegmenter { lexicon, opts }
    }

    /// Find the longest prefix of `text` that is a known word of at least the
    /// minimum part length. Returns its length in bytes.
    fn longest_prefix(&self, text: &str) -> Option<usize> {
        let mut ends: Vec<usize> = text
            .char_indices()
            .map(|(i, ch)| i + ch.len_utf8())
            .collect();

        while let Some(end) = ends.pop() {
            let prefix = &text[..end];
            if prefix.chars().count() < self.opts.min_part_len {
                break;
            }
            if self.lexicon.contains(prefix) {
                return Some(end);
            }
        }
        None
    }
}

impl Segmenter for LexiconSegmenter {
    fn segment(&self, word: &str) -> Result<Vec<String>, SegmentError> {
        let unsegmented = || vec![word.to_string()];

        if word.chars().count() > self.opts.max_word_len {
            return Ok(unsegmented());
        }

        let mut parts = Vec::new();
        let mut remainder = word;
        while !remainder.is_empty() {
            let Some(len) = self.longest_prefix(remainder) else {
                return Ok(unsegmented());
            };
            let (part, rest) = remainder.split_at(len);
            parts.push(part.to_string());
            remainder = rest;
        }

        Ok(parts)
    }
}
