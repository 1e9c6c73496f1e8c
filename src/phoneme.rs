//! ARPAbet phoneme symbols and pronunciations.

use std::error::Error;
use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

/// Error returned when a string is not a member of the phoneme alphabet.
#[derive(Clone, Debug, PartialEq)]
pub struct PhonemeError {
    symbol: String,
}

impl PhonemeError {
    /// The symbol that failed to parse.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl fmt::Display for PhonemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown phoneme symbol \"{}\"", self.symbol)
    }
}

impl Error for PhonemeError {}

macro_rules! phonemes {
    ($($name:ident),* $(,)?) => {
        /// A symbol from the ARPAbet phoneme alphabet used by the CMU
        /// Pronouncing Dictionary.
        ///
        /// Vowels carry a stress digit: `0` (unstressed), `1` (primary) or `2`
        /// (secondary). Consonants have no digit.
        #[allow(clippy::upper_case_acronyms)]
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Phoneme {
            $($name),*
        }

        impl Phoneme {
            /// Every symbol in the alphabet, in lexical order.
            pub const ALL: &'static [Phoneme] = &[$(Phoneme::$name),*];

            /// Return the ARPAbet spelling of this symbol, eg. `"EH1"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Phoneme::$name => stringify!($name)),*
                }
            }
        }

        impl FromStr for Phoneme {
            type Err = PhonemeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($name) => Ok(Phoneme::$name),)*
                    _ => Err(PhonemeError { symbol: s.to_string() }),
                }
            }
        }
    };
}

phonemes!(
    AA0, AA1, AA2, AE0, AE1, AE2, AH0, AH1, AH2, AO0, AO1, AO2, AW0, AW1, AW2, AY0, AY1, AY2, B,
    CH, D, DH, EH0, EH1, EH2, ER0, ER1, ER2, EY0, EY1, EY2, F, G, HH, IH0, IH1, IH2, IY0, IY1, IY2,
    JH, K, L, M, N, NG, OW0, OW1, OW2, OY0, OY1, OY2, P, R, S, SH, T, TH, UH0, UH1, UH2, UW, UW0,
    UW1, UW2, V, W, Y, Z, ZH,
);

impl Phoneme {
    /// Return true if the symbol carries a stress digit.
    ///
    /// In this alphabet only vowels carry stress digits, so this doubles as a
    /// test for "is a vowel nucleus". Code that relies on that (eg. the
    /// possessive suffix rule) must keep this alphabet, where the unstressed
    /// bare `UW` is the only vowel without a digit.
    pub fn is_stressed(self) -> bool {
        self.as_str().ends_with(|ch: char| ch.is_ascii_digit())
    }

    /// Return true if this is one of the 24 consonants.
    pub fn is_consonant(self) -> bool {
        CONSONANTS.contains(&self)
    }
}

/// Consonant symbols of the alphabet.
pub const CONSONANTS: [Phoneme; 24] = [
    Phoneme::B,
    Phoneme::CH,
    Phoneme::D,
    Phoneme::DH,
    Phoneme::F,
    Phoneme::G,
    Phoneme::HH,
    Phoneme::JH,
    Phoneme::K,
    Phoneme::L,
    Phoneme::M,
    Phoneme::N,
    Phoneme::NG,
    Phoneme::P,
    Phoneme::R,
    Phoneme::S,
    Phoneme::SH,
    Phoneme::T,
    Phoneme::TH,
    Phoneme::V,
    Phoneme::W,
    Phoneme::Y,
    Phoneme::Z,
    Phoneme::ZH,
];

impl fmt::Display for Phoneme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered sequence of phonemes for one word.
///
/// String forms (see [`format`](crate::format)) are derived from this, never
/// stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Pronunciation {
    phonemes: SmallVec<[Phoneme; 8]>,
}

impl Pronunciation {
    pub fn new() -> Pronunciation {
        Pronunciation::default()
    }

    /// Return the phonemes in this pronunciation.
    pub fn phonemes(&self) -> &[Phoneme] {
        &self.phonemes
    }

    pub fn len(&self) -> usize {
        self.phonemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phonemes.is_empty()
    }

    /// Return the final phoneme, if any.
    pub fn last(&self) -> Option<Phoneme> {
        self.phonemes.last().copied()
    }

    /// Return a copy of this pronunciation with `suffix` appended.
    pub fn with_suffix(&self, suffix: &[Phoneme]) -> Pronunciation {
        let mut phonemes = self.phonemes.clone();
        phonemes.extend_from_slice(suffix);
        Pronunciation { phonemes }
    }

    /// Concatenate pronunciations of word parts into one pronunciation.
    pub fn join<'a>(parts: impl IntoIterator<Item = &'a Pronunciation>) -> Pronunciation {
        let mut phonemes = SmallVec::new();
        for part in parts {
            phonemes.extend_from_slice(&part.phonemes);
        }
        Pronunciation { phonemes }
    }
}

impl From<&[Phoneme]> for Pronunciation {
    fn from(val: &[Phoneme]) -> Pronunciation {
        Pronunciation {
            phonemes: SmallVec::from_slice(val),
        }
    }
}

impl<const N: usize> From<[Phoneme; N]> for Pronunciation {
    fn from(val: [Phoneme; N]) -> Pronunciation {
        Pronunciation::from(&val[..])
    }
}

impl FromIterator<Phoneme> for Pronunciation {
    fn from_iter<I: IntoIterator<Item = Phoneme>>(iter: I) -> Self {
        Pronunciation {
            phonemes: iter.into_iter().collect(),
        }
    }
}

/// Parse a whitespace-delimited pronunciation, eg. `"R EH1 D"`.
impl FromStr for Pronunciation {
    type Err = PhonemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace().map(Phoneme::from_str).collect()
    }
}

/// Format as a space-delimited string, eg. `"R EH1 D"`.
impl fmt::Display for Pronunciation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, phoneme) in self.phonemes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(phoneme.as_str())?;
        }
        Ok(())
    }
}

/// Parse a pronunciation from a string literal in tests.
#[cfg(test)]
pub(crate) fn pron(s: &str) -> Pronunciation {
    s.parse().expect("should be a valid pronunciation")
}
