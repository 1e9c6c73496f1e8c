//! Configuration values for resolution and text conversion.

use std::error::Error;
use std::fmt;
use std::str::FromStr;

use crate::env::{env_flag, env_number};
use crate::format::PhonemeFormat;

/// Errors for invalid configuration values.
///
/// These are reported when options are parsed, before any text is processed.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The phoneme output format name is not recognized.
    InvalidFormat(String),

    /// The unresolved-word policy name is not recognized.
    InvalidPolicy(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat(name) => write!(
                f,
                "invalid phoneme format \"{}\" (expected sds, sds_bracketed or token_list)",
                name
            ),
            Self::InvalidPolicy(name) => write!(
                f,
                "invalid unresolved policy \"{}\" (expected keep, remove or drop)",
                name
            ),
        }
    }
}

impl Error for ConfigError {}

/// What the text converter does with words that cannot be resolved.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum UnresolvedPolicy {
    /// Keep the word as written.
    #[default]
    Keep,

    /// Remove the word from the output.
    Remove,

    /// Discard the whole line.
    Drop,
}

impl FromStr for UnresolvedPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep" => Ok(UnresolvedPolicy::Keep),
            "remove" => Ok(UnresolvedPolicy::Remove),
            "drop" => Ok(UnresolvedPolicy::Drop),
            _ => Err(ConfigError::InvalidPolicy(s.to_string())),
        }
    }
}

/// Options for a text conversion call.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ConvertOptions {
    /// Format of pronunciations returned by word lookups.
    ///
    /// Converted text always embeds pronunciations in braces, regardless of
    /// this setting.
    pub format: PhonemeFormat,

    /// Handling of words that cannot be resolved.
    pub unresolved: UnresolvedPolicy,
}

impl ConvertOptions {
    /// Parse options from their string names, eg. `("sds_b", "keep")`.
    pub fn parse(format: &str, unresolved: &str) -> Result<ConvertOptions, ConfigError> {
        Ok(ConvertOptions {
            format: format.parse()?,
            unresolved: unresolved.parse()?,
        })
    }
}

/// Default limit on how deeply the cascade may recurse into sub-words.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Enables or disables individual stages of the resolver.
#[derive(Clone, Debug, PartialEq)]
pub struct CascadeOptions {
    /// Split hyphenated words and resolve each part.
    pub hyphenated: bool,

    /// Derive possessives ("cat's") from the core word.
    pub possessive: bool,

    /// Derive "'ll" and "'d" contractions from the core word.
    pub contraction: bool,

    /// Split unhyphenated compounds using the segmenter.
    pub compound: bool,

    /// Derive plurals from the singular form.
    pub plural: bool,

    /// Derive "-ly" and "-ing" forms from the stem.
    pub stem: bool,

    /// Remember cascade and inference results for the rest of the session.
    pub use_cache: bool,

    /// Fall back to the out-of-vocabulary model.
    pub use_inference: bool,

    /// Maximum recursion depth for sub-word lookups. Lookups beyond this
    /// depth resolve to nothing.
    pub max_depth: usize,
}

impl Default for CascadeOptions {
    fn default() -> Self {
        CascadeOptions {
            hyphenated: true,
            possessive: true,
            contraction: true,
            compound: true,
            plural: true,
            stem: true,
            use_cache: true,
            use_inference: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CascadeOptions {
    /// Return the default options, overridden by environment variables.
    ///
    /// - `ARPA_USE_CACHE` - boolean, enables the resolution cache
    /// - `ARPA_USE_INFERENCE` - boolean, enables the OOV model
    /// - `ARPA_MAX_DEPTH` - recursion limit for sub-word lookups
    pub fn from_env() -> CascadeOptions {
        let defaults = CascadeOptions::default();
        CascadeOptions {
            use_cache: env_flag("ARPA_USE_CACHE", defaults.use_cache),
            use_inference: env_flag("ARPA_USE_INFERENCE", defaults.use_inference),
            max_depth: env_number("ARPA_MAX_DEPTH").unwrap_or(defaults.max_depth),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ConvertOptions, UnresolvedPolicy};
    use crate::format::PhonemeFormat;

    #[test]
    fn test_parse_policy() {
        assert_eq!("keep".parse(), Ok(UnresolvedPolicy::Keep));
        assert_eq!("remove".parse(), Ok(UnresolvedPolicy::Remove));
        assert_eq!("drop".parse(), Ok(UnresolvedPolicy::Drop));
        assert_eq!(
            "skip".parse::<UnresolvedPolicy>(),
            Err(ConfigError::InvalidPolicy("skip".into()))
        );
    }

    #[test]
    fn test_parse_convert_options() {
        let opts = ConvertOptions::parse("sds", "drop").unwrap();
        assert_eq!(opts.format, PhonemeFormat::Sds);
        assert_eq!(opts.unresolved, UnresolvedPolicy::Drop);

        let err = ConvertOptions::parse("sds", "discard").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid unresolved policy \"discard\" (expected keep, remove or drop)"
        );
        assert!(ConvertOptions::parse("arpa", "keep").is_err());
    }
}
