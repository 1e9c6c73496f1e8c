//! Part-of-speech tags and the tagging capability.
//!
//! Tags follow the Penn Treebank tag set. Heteronym tables may be keyed
//! either by an exact tag (`VBD`) or by a coarser "type" tag (`VERB`), which
//! is derived from the tag prefix by [`parent_pos`].

use std::error::Error;
use std::fmt;

use rustc_hash::FxHashMap;

/// Penn Treebank part-of-speech tags.
pub const POS_TAGS: [&str; 35] = [
    "CC", "CD", "DT", "EX", "FW", "IN", "JJ", "JJR", "JJS", "LS", "MD", "NN", "NNS", "NNP", "NNPS",
    "PDT", "POS", "PRP", "PRP$", "RB", "RBR", "RBS", "RP", "TO", "UH", "VB", "VBD", "VBG", "VBN",
    "VBP", "VBZ", "WDT", "WP", "WP$", "WRB",
];

/// Return the coarse category of a tag: `VERB` for `VB*`, `NOUN` for `NN*`
/// and `ADVERB` for `RB*`.
pub fn parent_pos(tag: &str) -> Option<&'static str> {
    if tag.starts_with("VB") {
        Some("VERB")
    } else if tag.starts_with("NN") {
        Some("NOUN")
    } else if tag.starts_with("RB") {
        Some("ADVERB")
    } else {
        None
    }
}

/// Expand a one-letter type tag (`V`, `N`, `P`, `A`, `R`) to its full form.
pub fn to_full_type_tag(short_tag: &str) -> Option<&'static str> {
    match short_tag {
        "V" => Some("VERB"),
        "N" => Some("NOUN"),
        "P" => Some("PRON"),
        "A" => Some("ADJ"),
        "R" => Some("ADV"),
        _ => None,
    }
}

/// Return true if `tag` marks a plural noun.
pub fn is_plural_noun(tag: &str) -> bool {
    tag == "NNS" || tag == "NNPS"
}

/// Errors reported by a [`Tagger`].
#[derive(Debug)]
pub enum TagError {
    /// The tagger returned a different number of tags than it was given
    /// tokens.
    LengthMismatch { tokens: usize, tags: usize },

    /// The tagger failed.
    Failed(Box<dyn Error + Send + Sync>),
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { tokens, tags } => write!(
                f,
                "tagger returned {} tags for {} tokens",
                tags, tokens
            ),
            Self::Failed(err) => write!(f, "tagging failed: {}", err),
        }
    }
}

impl Error for TagError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LengthMismatch { .. } => None,
            Self::Failed(err) => Some(err.as_ref()),
        }
    }
}

/// Part-of-speech tagger.
///
/// Implementations return one tag per input token, in order.
pub trait Tagger: Send + Sync {
    /// Tag a single sentence.
    fn tag(&self, tokens: &[&str]) -> Result<Vec<String>, TagError>;

    /// Tag a batch of sentences.
    ///
    /// Taggers backed by a model should override this to amortize the cost
    /// of running it.
    fn tag_batch(&self, sentences: &[Vec<&str>]) -> Result<Vec<Vec<String>>, TagError> {
        sentences.iter().map(|tokens| self.tag(tokens)).collect()
    }
}

/// Call `tagger` and check that it returned a tag for every token.
pub(crate) fn tag_checked(tagger: &dyn Tagger, tokens: &[&str]) -> Result<Vec<String>, TagError> {
    let tags = tagger.tag(tokens)?;
    if tags.len() != tokens.len() {
        return Err(TagError::LengthMismatch {
            tokens: tokens.len(),
            tags: tags.len(),
        });
    }
    Ok(tags)
}

/// Closed-class words and their tags, used by [`SuffixTagger`].
const CLOSED_CLASS: &[(&str, &str)] = &[
    ("a", "DT"),
    ("an", "DT"),
    ("the", "DT"),
    ("this", "DT"),
    ("that", "DT"),
    ("these", "DT"),
    ("those", "DT"),
    ("and", "CC"),
    ("or", "CC"),
    ("but", "CC"),
    ("in", "IN"),
    ("on", "IN"),
    ("at", "IN"),
    ("of", "IN"),
    ("for", "IN"),
    ("with", "IN"),
    ("from", "IN"),
    ("by", "IN"),
    ("to", "TO"),
    ("i", "PRP"),
    ("you", "PRP"),
    ("he", "PRP"),
    ("she", "PRP"),
    ("it", "PRP"),
    ("we", "PRP"),
    ("they", "PRP"),
    ("my", "PRP$"),
    ("his", "PRP$"),
    ("her", "PRP$"),
    ("their", "PRP$"),
    ("is", "VBZ"),
    ("was", "VBD"),
    ("are", "VBP"),
    ("were", "VBD"),
    ("will", "MD"),
    ("can", "MD"),
    ("could", "MD"),
    ("would", "MD"),
    ("should", "MD"),
    ("not", "RB"),
    ("very", "RB"),
];

/// Rule-based tagger using a closed-class word list and suffix heuristics.
///
/// This is far less accurate than a statistical tagger, but lets the crate
/// be used without one. Tags for specific words can be pinned using
/// [`with_word`](Self::with_word).
#[derive(Clone, Debug)]
pub struct SuffixTagger {
    words: FxHashMap<String, String>,
}

impl SuffixTagger {
    pub fn new() -> SuffixTagger {
        let words = CLOSED_CLASS
            .iter()
            .map(|(word, tag)| (word.to_string(), tag.to_string()))
            .collect();
        SuffixTagger { words }
    }

    /// Always tag `word` (case-insensitive) as `tag`.
    pub fn with_word(mut self, word: &str, tag: &str) -> Self {
        self.words.insert(word.to_lowercase(), tag.to_string());
        self
    }

    fn tag_word(&self, token: &str) -> String {
        let lower = token.to_lowercase();
        if let Some(tag) = self.words.get(&lower) {
            return tag.clone();
        }

        let tag = if !lower.chars().any(char::is_alphanumeric) {
            // Penn Treebank tags punctuation with the punctuation itself.
            return token.to_string();
        } else if lower.chars().all(|ch| ch.is_ascii_digit()) {
            "CD"
        } else if lower.ends_with("ing") {
            "VBG"
        } else if lower.ends_with("ed") {
            "VBD"
        } else if lower.ends_with("ly") {
            "RB"
        } else if ["tion", "ness", "ment"].iter().any(|s| lower.ends_with(s)) {
            "NN"
        } else if ["ful", "less", "ous"].iter().any(|s| lower.ends_with(s)) {
            "JJ"
        } else if lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("'s") {
            "NNS"
        } else {
            "NN"
        };
        tag.to_string()
    }
}

impl Default for SuffixTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl Tagger for SuffixTagger {
    fn tag(&self, tokens: &[&str]) -> Result<Vec<String>, TagError> {
        Ok(tokens.iter().map(|tok| self.tag_word(tok)).collect())
    }
}

#[cfg(test)]
mod tests {
    use arpa_testing::TestCases;

    use super::{is_plural_noun, parent_pos, tag_checked, to_full_type_tag, SuffixTagger, Tagger};
    use super::{TagError, POS_TAGS};

    #[test]
    fn test_parent_pos() {
        #[derive(Debug)]
        struct Case<'a> {
            tag: &'a str,
            parent: Option<&'a str>,
        }

        let cases = [
            Case {
                tag: "VBD",
                parent: Some("VERB"),
            },
            Case {
                tag: "VB",
                parent: Some("VERB"),
            },
            Case {
                tag: "NNPS",
                parent: Some("NOUN"),
            },
            Case {
                tag: "RBR",
                parent: Some("ADVERB"),
            },
            Case {
                tag: "JJ",
                parent: None,
            },
            Case {
                tag: "DEFAULT",
                parent: None,
            },
        ];

        cases.test_each(|case| assert_eq!(parent_pos(case.tag), case.parent));
    }

    #[test]
    fn test_tag_helpers() {
        assert_eq!(to_full_type_tag("V"), Some("VERB"));
        assert_eq!(to_full_type_tag("R"), Some("ADV"));
        assert_eq!(to_full_type_tag("X"), None);
        assert!(is_plural_noun("NNS"));
        assert!(is_plural_noun("NNPS"));
        assert!(!is_plural_noun("NN"));
        assert!(POS_TAGS.iter().all(|tag| !tag.is_empty()));
    }

    #[test]
    fn test_suffix_tagger() {
        let tagger = SuffixTagger::new().with_word("Read", "VBD");
        let tokens = [
            "The", "cats", "read", "quickly", "running", "kindness", "123", ".", "glass", "cat's",
        ];
        let tags = tagger.tag(&tokens).unwrap();
        assert_eq!(
            tags,
            ["DT", "NNS", "VBD", "RB", "VBG", "NN", "CD", ".", "NN", "NN"]
        );
    }

    #[test]
    fn test_tag_checked_length_mismatch() {
        struct Broken;

        impl Tagger for Broken {
            fn tag(&self, _tokens: &[&str]) -> Result<Vec<String>, TagError> {
                Ok(vec!["NN".to_string()])
            }
        }

        let err = tag_checked(&Broken, &["a", "b"]).unwrap_err();
        assert!(matches!(
            err,
            TagError::LengthMismatch { tokens: 2, tags: 1 }
        ));
    }
}
