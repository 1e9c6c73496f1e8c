//! Character-level normalization applied to text before tokenization.

use unicode_categories::UnicodeCategories;
use unicode_normalization::char::decompose_canonical;

/// Map typographic quotes and dashes to their ASCII equivalents, so that eg.
/// "don’t" tokenizes the same way as "don't".
fn fold_punctuation(ch: char) -> char {
    match ch {
        '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{2032}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201F}' | '\u{2033}' => '"',
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' => '-',
        _ => ch,
    }
}

/// Normalizer prepares raw text for tokenization and dictionary lookup.
///
/// Dictionaries are keyed by plain ASCII spellings, so "café" and "naïve"
/// need their accents removed and "it’s" needs a plain apostrophe before
/// they can be found.
#[derive(Clone, Debug)]
pub struct Normalizer {
    lowercase: bool,
    strip_accents: bool,
    fold_punctuation: bool,
}

/// Configuration for a [Normalizer].
#[derive(Clone, Debug)]
pub struct NormalizerOptions {
    /// If true, convert all text to lowercase using [char::to_lowercase].
    ///
    /// The text converter keeps this off, since replacements are matched
    /// against the original casing of each word.
    pub lowercase: bool,

    /// Whether to strip accents. An "accent" is defined as any unicode
    /// character in the Nonspacing Mark ("Mn") category.
    pub strip_accents: bool,

    /// Whether to replace curly quotes, primes and dashes with ASCII
    /// apostrophes, double quotes and hyphens.
    pub fold_punctuation: bool,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        NormalizerOptions {
            lowercase: false,
            strip_accents: true,
            fold_punctuation: true,
        }
    }
}

impl Normalizer {
    pub fn new(opts: NormalizerOptions) -> Normalizer {
        Normalizer {
            lowercase: opts.lowercase,
            strip_accents: opts.strip_accents,
            fold_punctuation: opts.fold_punctuation,
        }
    }

    /// Apply normalization to a string.
    pub fn normalize(&self, text: &str) -> String {
        if self.is_noop() || (text.is_ascii() && !self.lowercase) {
            return text.to_string();
        }

        let mut normalized = String::with_capacity(text.len());
        for ch in text.chars() {
            let ch = if self.fold_punctuation {
                fold_punctuation(ch)
            } else {
                ch
            };
            if self.strip_accents {
                // Accents are the non-spacing marks ("Mn") of the NFD form.
                decompose_canonical(ch, |part| {
                    if !part.is_mark_nonspacing() {
                        self.push_cased(part, &mut normalized);
                    }
                });
            } else {
                self.push_cased(ch, &mut normalized);
            }
        }
        normalized
    }

    fn push_cased(&self, ch: char, out: &mut String) {
        if self.lowercase {
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }

    fn is_noop(&self) -> bool {
        !self.lowercase && !self.strip_accents && !self.fold_punctuation
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::new(NormalizerOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use arpa_testing::TestCases;

    use super::{Normalizer, NormalizerOptions};

    #[test]
    fn test_normalizer_noop() {
        let normalizer = Normalizer::new(NormalizerOptions {
            lowercase: false,
            strip_accents: false,
            fold_punctuation: false,
        });
        for input in ["Hello world!", "Motörhead", "it’s"] {
            assert_eq!(normalizer.normalize(input), input);
        }
    }

    #[test]
    fn test_normalizer_default() {
        #[derive(Debug)]
        struct Case<'a> {
            input: &'a str,
            expected: &'a str,
        }

        let cases = [
            // ASCII text is returned unchanged, including case
            Case {
                input: "The cat read the book.",
                expected: "The cat read the book.",
            },
            Case {
                input: "Motörhead café",
                expected: "Motorhead cafe",
            },
            Case {
                input: "It’s a “well‐known” fact",
                expected: "It's a \"well-known\" fact",
            },
            Case {
                input: "rock ’n’ roll",
                expected: "rock 'n' roll",
            },
        ];

        let normalizer = Normalizer::default();
        cases.test_each(|case| {
            assert_eq!(normalizer.normalize(case.input), case.expected);
        });
    }

    #[test]
    fn test_normalizer_lowercase() {
        let normalizer = Normalizer::new(NormalizerOptions {
            lowercase: true,
            ..Default::default()
        });
        assert_eq!(normalizer.normalize("Naïve READER"), "naive reader");
    }
}
