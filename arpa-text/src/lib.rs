//! This crate provides the text handling used by the arpa grapheme-to-phoneme
//! converter: normalizing raw input, splitting it into word tokens,
//! validating brace-escaped pronunciation regions and substituting
//! pronunciations back into the text.
//!
//! It knows nothing about pronunciations themselves. Dictionary lookup and
//! the resolution cascade live in the `arpa` crate.

pub mod braces;
pub mod normalizer;
pub mod replace;
pub mod tokenizer;

pub use braces::{braces_balanced, check_braces, is_braced, BraceError};
pub use normalizer::{Normalizer, NormalizerOptions};
pub use replace::{find_first, remove_first, replace_first};
pub use tokenizer::{contains_alpha, is_punctuation, TokenizeError, Tokenizer, WordTokenizer};
