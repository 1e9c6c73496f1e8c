//! Conversion between [`Pronunciation`]s and their text representations.
//!
//! Three representations are supported, selected by [`PhonemeFormat`]:
//!
//! - Space-delimited string (SDS), eg. `R EH1 D`
//! - SDS wrapped in braces, eg. `{R EH1 D}`. This is the form embedded in
//!   converted text.
//! - A list of phoneme symbols, eg. `["R", "EH1", "D"]`
//!
//! The brace-balance checks used to validate text containing braced
//! pronunciations are re-exported here from `arpa_text`.

use std::fmt;
use std::str::FromStr;

pub use arpa_text::braces::{braces_balanced, check_braces, is_braced, BraceError};

use crate::config::ConfigError;
use crate::phoneme::{PhonemeError, Pronunciation};

/// Output representation for pronunciations.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PhonemeFormat {
    /// Space-delimited string.
    Sds,

    /// Space-delimited string wrapped in braces.
    #[default]
    SdsBracketed,

    /// List of phoneme symbols.
    TokenList,
}

impl FromStr for PhonemeFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sds" => Ok(PhonemeFormat::Sds),
            "sds_b" | "sds_bracketed" => Ok(PhonemeFormat::SdsBracketed),
            "list" | "token_list" => Ok(PhonemeFormat::TokenList),
            _ => Err(ConfigError::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for PhonemeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhonemeFormat::Sds => "sds",
            PhonemeFormat::SdsBracketed => "sds_bracketed",
            PhonemeFormat::TokenList => "token_list",
        };
        f.write_str(name)
    }
}

/// A pronunciation rendered in one of the [`PhonemeFormat`]s.
#[derive(Clone, Debug, PartialEq)]
pub enum Formatted {
    Text(String),
    Tokens(Vec<&'static str>),
}

impl Formatted {
    /// Return the text form, or `None` for [`PhonemeFormat::TokenList`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Formatted::Text(text) => Some(text),
            Formatted::Tokens(_) => None,
        }
    }
}

/// Format `pron` as a space-delimited string.
pub fn to_sds(pron: &Pronunciation) -> String {
    pron.to_string()
}

/// Format `pron` as a space-delimited string wrapped in braces.
pub fn to_bracketed(pron: &Pronunciation) -> String {
    format!("{{{}}}", pron)
}

/// Return the symbols of `pron` as a list of strings.
pub fn to_tokens(pron: &Pronunciation) -> Vec<&'static str> {
    pron.phonemes().iter().map(|ph| ph.as_str()).collect()
}

/// Render `pron` in the representation selected by `format`.
pub fn format_as(pron: &Pronunciation, format: PhonemeFormat) -> Formatted {
    match format {
        PhonemeFormat::Sds => Formatted::Text(to_sds(pron)),
        PhonemeFormat::SdsBracketed => Formatted::Text(to_bracketed(pron)),
        PhonemeFormat::TokenList => Formatted::Tokens(to_tokens(pron)),
    }
}

/// Parse a space-delimited pronunciation string.
pub fn from_sds(text: &str) -> Result<Pronunciation, PhonemeError> {
    text.parse()
}

/// Parse a pronunciation which may be wrapped in braces.
pub fn from_bracketed(text: &str) -> Result<Pronunciation, PhonemeError> {
    let text = text.trim();
    let inner = if is_braced(text) {
        &text[1..text.len() - 1]
    } else {
        text
    };
    from_sds(inner)
}

/// Parse a pronunciation from a list of symbols.
pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Pronunciation, PhonemeError> {
    tokens.iter().map(|tok| tok.as_ref().parse()).collect()
}

#[cfg(test)]
mod tests {
    use arpa_testing::TestCases;

    use super::{
        format_as, from_bracketed, from_sds, from_tokens, to_bracketed, to_sds, to_tokens,
        Formatted, PhonemeFormat,
    };
    use crate::config::ConfigError;
    use crate::phoneme::pron;

    #[test]
    fn test_format_as() {
        let read = pron("R EH1 D");
        assert_eq!(
            format_as(&read, PhonemeFormat::Sds),
            Formatted::Text("R EH1 D".into())
        );
        assert_eq!(
            format_as(&read, PhonemeFormat::SdsBracketed),
            Formatted::Text("{R EH1 D}".into())
        );
        assert_eq!(
            format_as(&read, PhonemeFormat::TokenList),
            Formatted::Tokens(vec!["R", "EH1", "D"])
        );
        assert_eq!(
            format_as(&read, PhonemeFormat::Sds).as_text(),
            Some("R EH1 D")
        );
    }

    #[test]
    fn test_bracketed_round_trip() {
        #[derive(Debug)]
        struct Case<'a> {
            sds: &'a str,
        }

        let cases = [
            Case { sds: "R EH1 D" },
            Case {
                sds: "K AH0 N S OW1 L",
            },
            Case { sds: "AH0" },
        ];

        cases.test_each(|case| {
            let original = pron(case.sds);
            assert_eq!(from_bracketed(&to_bracketed(&original)), Ok(original.clone()));
            assert_eq!(from_sds(&to_sds(&original)), Ok(original.clone()));
            assert_eq!(from_tokens(&to_tokens(&original)), Ok(original));
        })
    }

    #[test]
    fn test_from_bracketed_without_braces() {
        assert_eq!(from_bracketed("R EH1 D"), Ok(pron("R EH1 D")));
        assert_eq!(from_bracketed(" {R EH1 D} "), Ok(pron("R EH1 D")));
        assert!(from_bracketed("{R XX D}").is_err());
    }

    #[test]
    fn test_parse_format() {
        #[derive(Debug)]
        struct Case<'a> {
            name: &'a str,
            expected: Result<PhonemeFormat, ConfigError>,
        }

        let cases = [
            Case {
                name: "sds",
                expected: Ok(PhonemeFormat::Sds),
            },
            Case {
                name: "sds_b",
                expected: Ok(PhonemeFormat::SdsBracketed),
            },
            Case {
                name: "token_list",
                expected: Ok(PhonemeFormat::TokenList),
            },
            Case {
                name: "list",
                expected: Ok(PhonemeFormat::TokenList),
            },
            Case {
                name: "ipa",
                expected: Err(ConfigError::InvalidFormat("ipa".into())),
            },
        ];

        cases.test_each(|case| assert_eq!(case.name.parse::<PhonemeFormat>(), case.expected))
    }
}
