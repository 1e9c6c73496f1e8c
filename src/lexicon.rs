//! The static pronunciation dictionary.
//!
//! A [`Lexicon`] maps lowercase words to one or more pronunciation variants.
//! It is loaded once and is read-only afterwards, so it can be shared between
//! threads (eg. in an `Arc`) without locking.
//!
//! ## File formats
//!
//! Text dictionaries in the style of the CMU Pronouncing Dictionary are
//! supported in three layouts, detected automatically:
//!
//! - Double-space delimited: `WORD  W ER1 D`
//! - Tab delimited: `WORD\tW ER1 D`
//! - Single-space delimited, with an optional trailing comment:
//!   `word W ER1 D # comment`
//!
//! Lines starting with `;;;` are comments. Alternative pronunciations are
//! written with a parenthesized 1-based index, eg. `READ(2)  R EH1 D`.
//!
//! JSON dictionaries map words to either a pronunciation string or a list of
//! them.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::phoneme::{PhonemeError, Pronunciation};

/// Number of non-blank lines inspected by [`LexiconFormat::detect`].
const FORMAT_SNIFF_LINES: usize = 10;

/// Errors that occur when loading a [`Lexicon`].
#[derive(Debug)]
pub enum LexiconError {
    /// The dictionary file could not be read.
    IoError(io::Error),

    /// The JSON dictionary could not be decoded.
    JsonError(serde_json::Error),

    /// A line did not contain a word and pronunciation separated by the
    /// detected delimiter.
    MalformedLine { line: usize, text: String },

    /// A pronunciation contained a symbol outside the phoneme alphabet.
    InvalidPhoneme {
        word: String,
        line: Option<usize>,
        error: PhonemeError,
    },
}

impl fmt::Display for LexiconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError(err) => write!(f, "failed to read lexicon: {}", err),
            Self::JsonError(err) => write!(f, "JSON error {}", err),
            Self::MalformedLine { line, text } => {
                write!(f, "malformed lexicon entry on line {}: \"{}\"", line, text)
            }
            Self::InvalidPhoneme {
                word,
                line: Some(line),
                error,
            } => write!(f, "entry \"{}\" on line {}: {}", word, line, error),
            Self::InvalidPhoneme {
                word,
                line: None,
                error,
            } => write!(f, "entry \"{}\": {}", word, error),
        }
    }
}

impl Error for LexiconError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            Self::JsonError(err) => Some(err),
            Self::MalformedLine { .. } => None,
            Self::InvalidPhoneme { error, .. } => Some(error),
        }
    }
}

impl From<io::Error> for LexiconError {
    fn from(val: io::Error) -> Self {
        LexiconError::IoError(val)
    }
}

/// Line layout of a text dictionary.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LexiconFormat {
    /// Word and pronunciation separated by two spaces.
    DoubleSpace,

    /// Word and pronunciation separated by a tab.
    Tab,

    /// Word and pronunciation separated by one space. Text after `#` is a
    /// comment.
    #[default]
    SingleSpace,
}

impl LexiconFormat {
    /// Detect the layout from the first few non-blank lines.
    ///
    /// The first line containing a double space or a tab decides the format.
    /// If neither is found, the format is [`LexiconFormat::SingleSpace`].
    pub fn detect<'a>(lines: impl IntoIterator<Item = &'a str>) -> LexiconFormat {
        lines
            .into_iter()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(FORMAT_SNIFF_LINES)
            .find_map(|line| {
                if line.contains("  ") {
                    Some(LexiconFormat::DoubleSpace)
                } else if line.contains('\t') {
                    Some(LexiconFormat::Tab)
                } else {
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Split a trimmed, non-blank line into `(word, pronunciation)`.
    fn split_line(self, line: &str) -> Option<(&str, &str)> {
        let (word, phonemes) = match self {
            LexiconFormat::DoubleSpace => line.split_once("  ")?,
            LexiconFormat::Tab => line.split_once('\t')?,
            LexiconFormat::SingleSpace => {
                let (word, rest) = line.split_once(' ')?;
                let phonemes = rest.split_once('#').map_or(rest, |(ph, _comment)| ph);
                (word, phonemes)
            }
        };
        Some((word.trim(), phonemes.trim()))
    }
}

/// Split a query such as `"console(2)"` into the base word and 1-based
/// variant index.
///
/// Returns `None` if the word has no index suffix.
pub fn split_variant_index(word: &str) -> Option<(&str, usize)> {
    let inner = word.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let digits = &inner[open + 1..];
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    let index = digits.parse().ok()?;
    Some((&inner[..open], index))
}

/// Static dictionary mapping words to pronunciations.
#[derive(Clone, Debug, Default)]
pub struct Lexicon {
    entries: FxHashMap<String, Vec<Pronunciation>>,
}

impl Lexicon {
    /// Create an empty lexicon.
    pub fn new() -> Lexicon {
        Lexicon::default()
    }

    /// Add a pronunciation variant for `word`.
    ///
    /// Variants are numbered in the order they are added.
    pub fn insert(&mut self, word: &str, pron: Pronunciation) {
        self.entries
            .entry(word.to_lowercase())
            .or_default()
            .push(pron);
    }

    /// Parse a text dictionary, detecting its layout.
    pub fn parse(text: &str) -> Result<Lexicon, LexiconError> {
        let lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line))
            .filter(|(_, line)| !line.starts_with(";;;"))
            .collect();
        let format = LexiconFormat::detect(lines.iter().map(|(_, line)| *line));
        Self::parse_lines(&lines, format)
    }

    /// Parse a text dictionary with a known layout.
    pub fn parse_with_format(text: &str, format: LexiconFormat) -> Result<Lexicon, LexiconError> {
        let lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line))
            .filter(|(_, line)| !line.starts_with(";;;"))
            .collect();
        Self::parse_lines(&lines, format)
    }

    fn parse_lines(lines: &[(usize, &str)], format: LexiconFormat) -> Result<Lexicon, LexiconError> {
        // Variants are collected with their declared index and sorted
        // afterwards, so `WORD(2)` lines may precede `WORD`.
        let mut variants: FxHashMap<String, Vec<(usize, Pronunciation)>> = FxHashMap::default();

        for &(line_num, line) in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (word, phonemes) =
                format
                    .split_line(line)
                    .ok_or_else(|| LexiconError::MalformedLine {
                        line: line_num,
                        text: line.to_string(),
                    })?;

            if phonemes.is_empty() {
                tracing::warn!(line = line_num, word, "skipping entry with no phonemes");
                continue;
            }

            let pron: Pronunciation =
                phonemes
                    .parse()
                    .map_err(|error| LexiconError::InvalidPhoneme {
                        word: word.to_string(),
                        line: Some(line_num),
                        error,
                    })?;

            let word = word.to_lowercase();
            let (base, index) = match split_variant_index(&word) {
                Some((base, index)) => (base.to_string(), index),
                None => (word, 1),
            };
            variants.entry(base).or_default().push((index, pron));
        }

        let entries = variants
            .into_iter()
            .map(|(word, mut prons)| {
                prons.sort_by_key(|(index, _)| *index);
                (word, prons.into_iter().map(|(_, pron)| pron).collect())
            })
            .collect();
        let lexicon = Lexicon { entries };

        tracing::info!(entries = lexicon.len(), ?format, "parsed lexicon");

        Ok(lexicon)
    }

    /// Parse a JSON dictionary of the form `{"word": "PH ON EMES"}` or
    /// `{"word": ["VARIANT ONE", "VARIANT TWO"]}`.
    pub fn from_json(json: &str) -> Result<Lexicon, LexiconError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum JsonEntry {
            Single(String),
            Variants(Vec<String>),
        }

        let parsed: FxHashMap<String, JsonEntry> =
            serde_json::from_str(json).map_err(LexiconError::JsonError)?;

        let mut lexicon = Lexicon::new();
        for (word, entry) in parsed {
            let prons = match entry {
                JsonEntry::Single(pron) => vec![pron],
                JsonEntry::Variants(prons) => prons,
            };
            for pron in prons {
                let pron = pron.parse().map_err(|error| LexiconError::InvalidPhoneme {
                    word: word.clone(),
                    line: None,
                    error,
                })?;
                lexicon.insert(&word, pron);
            }
        }

        tracing::info!(entries = lexicon.len(), "parsed JSON lexicon");

        Ok(lexicon)
    }

    /// Load a dictionary from a file. Files with a `.json` extension are
    /// parsed as JSON, anything else as a text dictionary.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Lexicon, LexiconError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&text)
        } else {
            Self::parse(&text)
        }
    }

    /// Return the number of distinct words.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the words in the lexicon, in no particular order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// Return all pronunciation variants of `word`.
    ///
    /// `word` must not contain a variant index.
    pub fn variants(&self, word: &str) -> Option<&[Pronunciation]> {
        self.get_lower(&word.to_lowercase())
    }

    fn get_lower(&self, word: &str) -> Option<&[Pronunciation]> {
        self.entries.get(word).map(|v| v.as_slice())
    }

    /// Look up the pronunciation of `word`, ignoring case.
    ///
    /// A trailing index such as `"console(2)"` selects the n-th variant. An
    /// index of 1 or less selects the first variant and an index past the
    /// last variant selects the last one.
    pub fn lookup_exact(&self, word: &str) -> Option<&Pronunciation> {
        let word = word.to_lowercase();
        if let Some(variants) = self.get_lower(&word) {
            return variants.first();
        }
        let (base, index) = split_variant_index(&word)?;
        let variants = self.get_lower(base)?;
        let index = index.saturating_sub(1).min(variants.len().saturating_sub(1));
        variants.get(index)
    }

    /// Return true if [`lookup_exact`](Self::lookup_exact) would find `word`.
    pub fn contains(&self, word: &str) -> bool {
        self.lookup_exact(word).is_some()
    }
}

#[cfg(test)]
mod tests {
    use arpa_testing::TestCases;

    use super::{split_variant_index, Lexicon, LexiconError, LexiconFormat};
    use crate::phoneme::pron;

    fn console_lexicon() -> Lexicon {
        Lexicon::parse(
            ";;; test dictionary
CONSOLE  K AA1 N S OW0 L
CONSOLE(2)  K AH0 N S OW1 L
CAT  K AE1 T
",
        )
        .unwrap()
    }

    #[test]
    fn test_detect_format() {
        #[derive(Debug)]
        struct Case<'a> {
            text: &'a str,
            expected: LexiconFormat,
        }

        let cases = [
            Case {
                text: "CAT  K AE1 T\nDOG  D AO1 G",
                expected: LexiconFormat::DoubleSpace,
            },
            Case {
                text: "\n\ncat\tK AE1 T",
                expected: LexiconFormat::Tab,
            },
            Case {
                text: "cat K AE1 T # noun\ndog D AO1 G",
                expected: LexiconFormat::SingleSpace,
            },
            Case {
                text: "",
                expected: LexiconFormat::SingleSpace,
            },
        ];

        cases.test_each(|case| {
            assert_eq!(LexiconFormat::detect(case.text.lines()), case.expected);
        })
    }

    #[test]
    fn test_detect_format_only_inspects_first_lines() {
        let mut text = "cat K AE1 T\n".repeat(10);
        text.push_str("dog  D AO1 G\n");
        assert_eq!(
            LexiconFormat::detect(text.lines()),
            LexiconFormat::SingleSpace
        );
    }

    #[test]
    fn test_parse_formats() {
        #[derive(Debug)]
        struct Case<'a> {
            text: &'a str,
        }

        let cases = [
            Case {
                text: "CAT  K AE1 T\nRead  R IY1 D",
            },
            Case {
                text: "cat\tK AE1 T\nread\tR IY1 D\n",
            },
            Case {
                text: "cat K AE1 T # a comment\n\nread R IY1 D",
            },
        ];

        cases.test_each(|case| {
            let lexicon = Lexicon::parse(case.text).unwrap();
            assert_eq!(lexicon.len(), 2);
            assert_eq!(lexicon.lookup_exact("cat"), Some(&pron("K AE1 T")));
            assert_eq!(lexicon.lookup_exact("read"), Some(&pron("R IY1 D")));
        })
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let lexicon = console_lexicon();
        for word in ["cat", "CAT", "Cat"] {
            assert_eq!(lexicon.lookup_exact(word), Some(&pron("K AE1 T")));
            assert!(lexicon.contains(word));
        }
        assert_eq!(lexicon.lookup_exact("dog"), None);
        assert!(!lexicon.contains("dog"));
    }

    #[test]
    fn test_lookup_variant_index() {
        #[derive(Debug)]
        struct Case<'a> {
            word: &'a str,
            expected: Option<&'a str>,
        }

        let cases = [
            Case {
                word: "console",
                expected: Some("K AA1 N S OW0 L"),
            },
            Case {
                word: "console(1)",
                expected: Some("K AA1 N S OW0 L"),
            },
            Case {
                word: "console(0)",
                expected: Some("K AA1 N S OW0 L"),
            },
            Case {
                word: "Console(2)",
                expected: Some("K AH0 N S OW1 L"),
            },
            // Out of range indices select the last variant
            Case {
                word: "console(9)",
                expected: Some("K AH0 N S OW1 L"),
            },
            Case {
                word: "cat(3)",
                expected: Some("K AE1 T"),
            },
            Case {
                word: "dog(2)",
                expected: None,
            },
            Case {
                word: "console()",
                expected: None,
            },
        ];

        let lexicon = console_lexicon();
        cases.test_each(|case| {
            assert_eq!(
                lexicon.lookup_exact(case.word),
                case.expected.map(pron).as_ref()
            );
        })
    }

    #[test]
    fn test_variant_order_follows_index() {
        let lexicon = Lexicon::parse("READ(2)  R EH1 D\nREAD  R IY1 D").unwrap();
        assert_eq!(
            lexicon.variants("read"),
            Some(&[pron("R IY1 D"), pron("R EH1 D")][..])
        );
    }

    #[test]
    fn test_split_variant_index() {
        assert_eq!(split_variant_index("read(2)"), Some(("read", 2)));
        assert_eq!(split_variant_index("read(12)"), Some(("read", 12)));
        assert_eq!(split_variant_index("read"), None);
        assert_eq!(split_variant_index("read(x)"), None);
        assert_eq!(split_variant_index("read()"), None);
    }

    #[test]
    fn test_parse_errors() {
        let err = Lexicon::parse_with_format("cat K AE1 T\ndog", LexiconFormat::SingleSpace)
            .unwrap_err();
        assert!(matches!(err, LexiconError::MalformedLine { line: 2, .. }));

        let err = Lexicon::parse("cat  K AE1 Q").unwrap_err();
        assert_eq!(
            err.to_string(),
            "entry \"cat\" on line 1: unknown phoneme symbol \"Q\""
        );
    }

    #[test]
    fn test_from_json() {
        let lexicon =
            Lexicon::from_json(r#"{"cat": "K AE1 T", "read": ["R IY1 D", "R EH1 D"]}"#).unwrap();
        assert_eq!(lexicon.lookup_exact("cat"), Some(&pron("K AE1 T")));
        assert_eq!(lexicon.lookup_exact("read(2)"), Some(&pron("R EH1 D")));

        assert!(matches!(
            Lexicon::from_json("[1, 2]"),
            Err(LexiconError::JsonError(_))
        ));
        assert!(matches!(
            Lexicon::from_json(r#"{"cat": "K AE1 XT"}"#),
            Err(LexiconError::InvalidPhoneme { line: None, .. })
        ));
    }
}
