//! Words whose pronunciation depends on their part of speech.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::phoneme::{PhonemeError, Pronunciation};
use crate::pos::parent_pos;

/// Key used for the pronunciation chosen when no tag-specific entry matches.
pub const DEFAULT_KEY: &str = "DEFAULT";

/// Errors that occur when loading a [`HeteronymTable`].
#[derive(Debug)]
pub enum HeteronymError {
    IoError(io::Error),
    JsonError(serde_json::Error),

    /// A pronunciation contained a symbol outside the phoneme alphabet.
    InvalidPhoneme { word: String, error: PhonemeError },
}

impl fmt::Display for HeteronymError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError(err) => write!(f, "failed to read heteronym table: {}", err),
            Self::JsonError(err) => write!(f, "JSON error {}", err),
            Self::InvalidPhoneme { word, error } => {
                write!(f, "heteronym \"{}\": {}", word, error)
            }
        }
    }
}

impl Error for HeteronymError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            Self::JsonError(err) => Some(err),
            Self::InvalidPhoneme { error, .. } => Some(error),
        }
    }
}

impl From<io::Error> for HeteronymError {
    fn from(val: io::Error) -> Self {
        HeteronymError::IoError(val)
    }
}

impl From<serde_json::Error> for HeteronymError {
    fn from(val: serde_json::Error) -> Self {
        HeteronymError::JsonError(val)
    }
}

/// Pronunciations of a single heteronym, keyed by POS tag (eg. `VBD`),
/// POS category (eg. `VERB`) or [`DEFAULT_KEY`].
pub type HeteronymEntry = FxHashMap<String, Pronunciation>;

/// Table of heteronyms, loaded from JSON of the form:
///
/// ```json
/// {
///   "read": { "VBD": "R EH1 D", "VBN": "R EH1 D", "DEFAULT": "R IY1 D" }
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct HeteronymTable {
    entries: FxHashMap<String, HeteronymEntry>,
}

impl HeteronymTable {
    pub fn new() -> HeteronymTable {
        HeteronymTable::default()
    }

    /// Add or replace the pronunciation of `word` for the tag or category
    /// `key`.
    pub fn insert(&mut self, word: &str, key: &str, pron: Pronunciation) {
        self.entries
            .entry(word.to_lowercase())
            .or_default()
            .insert(key.to_string(), pron);
    }

    /// Parse a table from a JSON string.
    pub fn from_json(json: &str) -> Result<HeteronymTable, HeteronymError> {
        let raw: FxHashMap<String, FxHashMap<String, String>> = serde_json::from_str(json)?;

        let mut table = HeteronymTable::new();
        for (word, keys) in raw {
            for (key, pron) in keys {
                let pron = pron
                    .parse()
                    .map_err(|error| HeteronymError::InvalidPhoneme {
                        word: word.clone(),
                        error,
                    })?;
                table.insert(&word, &key, pron);
            }
        }

        tracing::info!(entries = table.len(), "loaded heteronym table");

        Ok(table)
    }

    /// Load a table from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<HeteronymTable, HeteronymError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return true if `word` (case-insensitive) is a heteronym.
    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(&word.to_lowercase())
    }

    /// Return true if any whitespace-separated word of `text` is a
    /// heteronym. Surrounding punctuation is ignored.
    pub fn contains_any(&self, text: &str) -> bool {
        text.split_whitespace()
            .map(|word| word.trim_matches(|ch: char| !ch.is_alphanumeric()))
            .any(|word| !word.is_empty() && self.contains(word))
    }

    /// Return the entry for `word`, case-insensitive.
    pub fn entry(&self, word: &str) -> Option<&HeteronymEntry> {
        self.entries.get(&word.to_lowercase())
    }

    /// Return the pronunciation of `word` for the part-of-speech `pos`.
    ///
    /// The exact tag is tried first, then its category (see [`parent_pos`]),
    /// then [`DEFAULT_KEY`]. Returns `None` if the word is not a heteronym or
    /// none of these keys are present.
    pub fn get(&self, word: &str, pos: Option<&str>) -> Option<&Pronunciation> {
        let entry = self.entry(word)?;
        pos.and_then(|tag| entry.get(tag))
            .or_else(|| {
                pos.and_then(parent_pos)
                    .and_then(|parent| entry.get(parent))
            })
            .or_else(|| entry.get(DEFAULT_KEY))
    }
}
