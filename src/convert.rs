//! Conversion of lines of text into text with embedded pronunciations.
//!
//! [`Converter::convert`] replaces each resolvable word of a line with its
//! pronunciation wrapped in braces:
//!
//! ```text
//! The cat read the book.  =>  {DH AH0} {K AE1 T} {R EH1 D} {DH AH0} {B UH1 K}.
//! ```
//!
//! Regions which are already braced are passed through untouched.

use std::error::Error;
use std::fmt;

use arpa_text::{
    check_braces, contains_alpha, remove_first, replace_first, BraceError, Normalizer,
    NormalizerOptions, TokenizeError, Tokenizer, WordTokenizer,
};

use crate::config::{ConvertOptions, UnresolvedPolicy};
use crate::format::{format_as, to_bracketed, Formatted};
use crate::pos::{tag_checked, TagError};
use crate::resolver::{OovMode, ResolveError, Resolver};

/// Errors that occur when converting a line of text.
#[derive(Debug)]
pub enum ConvertError {
    /// The line contains malformed brace-escaped regions.
    BraceError(BraceError),

    TokenizeError(TokenizeError),

    TagError(TagError),

    /// A capability failed while resolving a word.
    ResolveError(ResolveError),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BraceError(err) => write!(f, "{}", err),
            Self::TokenizeError(err) => write!(f, "tokenization failed: {}", err),
            Self::TagError(err) => write!(f, "{}", err),
            Self::ResolveError(err) => write!(f, "{}", err),
        }
    }
}

impl Error for ConvertError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::BraceError(err) => Some(err),
            Self::TokenizeError(err) => Some(err),
            Self::TagError(err) => Some(err),
            Self::ResolveError(err) => Some(err),
        }
    }
}

impl From<BraceError> for ConvertError {
    fn from(val: BraceError) -> Self {
        ConvertError::BraceError(val)
    }
}

impl From<TokenizeError> for ConvertError {
    fn from(val: TokenizeError) -> Self {
        ConvertError::TokenizeError(val)
    }
}

impl From<TagError> for ConvertError {
    fn from(val: TagError) -> Self {
        ConvertError::TagError(val)
    }
}

impl From<ResolveError> for ConvertError {
    fn from(val: ResolveError) -> Self {
        ConvertError::ResolveError(val)
    }
}

/// A line which has been validated, normalized and tokenized.
pub(crate) struct PreparedLine {
    pub text: String,
    pub tokens: Vec<String>,
}

impl PreparedLine {
    pub fn token_refs(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.as_str()).collect()
    }

    /// Iterate over the tokens which are looked up: those outside braced
    /// regions which contain a letter.
    ///
    /// Assumes braces were validated when the line was prepared.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        let mut in_escaped = false;
        self.tokens.iter().filter_map(move |token| match token.as_str() {
            "{" => {
                in_escaped = true;
                None
            }
            "}" => {
                in_escaped = false;
                None
            }
            word if !in_escaped && contains_alpha(word) => Some(word),
            _ => None,
        })
    }
}

/// Which words a pass over a line replaces.
#[derive(Copy, Clone, Debug, PartialEq)]
enum Replace {
    AllWords(UnresolvedPolicy),
    HeteronymsOnly,
}

/// Converts lines of text, replacing words with their pronunciations.
pub struct Converter {
    resolver: Resolver,
    tokenizer: Box<dyn Tokenizer>,
    normalizer: Normalizer,
    opts: ConvertOptions,
}

impl Converter {
    /// Create a converter which tokenizes text with [`WordTokenizer`] and
    /// uses default options.
    pub fn new(resolver: Resolver) -> Converter {
        Converter {
            resolver,
            tokenizer: Box::new(WordTokenizer::new()),
            normalizer: Normalizer::new(NormalizerOptions::default()),
            opts: ConvertOptions::default(),
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_options(mut self, opts: ConvertOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.opts
    }

    /// Look up a single word and render it in the configured
    /// [`PhonemeFormat`](crate::PhonemeFormat).
    pub fn lookup(&self, word: &str, pos: Option<&str>) -> Result<Option<Formatted>, ResolveError> {
        Ok(self
            .resolver
            .resolve(word, pos)?
            .map(|pron| format_as(&pron, self.opts.format)))
    }

    /// Convert a line using the converter's options.
    ///
    /// Returns `Ok(None)` if the line contains an unresolved word and the
    /// unresolved policy is [`UnresolvedPolicy::Drop`].
    pub fn convert(&self, text: &str) -> Result<Option<String>, ConvertError> {
        self.convert_with(text, &self.opts)
    }

    /// Convert a line with options that override the converter's own.
    pub fn convert_with(
        &self,
        text: &str,
        opts: &ConvertOptions,
    ) -> Result<Option<String>, ConvertError> {
        let line = self.prepare(text)?;
        let tags = self.tag(&line)?;
        self.replace_words(
            &line,
            Some(tags.as_slice()),
            Replace::AllWords(opts.unresolved),
            OovMode::Live,
        )
    }

    /// Replace only the heteronyms in a line, leaving other words as they
    /// are.
    pub fn replace_heteronyms(&self, text: &str) -> Result<String, ConvertError> {
        if !self.resolver.heteronyms().contains_any(text) {
            return Ok(text.to_string());
        }
        let line = self.prepare(text)?;
        let tags = self.tag(&line)?;
        let replaced = self.replace_words(
            &line,
            Some(tags.as_slice()),
            Replace::HeteronymsOnly,
            OovMode::Live,
        )?;
        Ok(replaced.unwrap_or(line.text))
    }

    /// Validate braces, normalize and tokenize a line.
    pub(crate) fn prepare(&self, text: &str) -> Result<PreparedLine, ConvertError> {
        check_braces(text)?;
        let text = self.normalizer.normalize(text);
        let tokens = self
            .tokenizer
            .tokenize(&text)?
            .into_iter()
            .map(|t| t.to_string())
            .collect();
        Ok(PreparedLine { text, tokens })
    }

    fn tag(&self, line: &PreparedLine) -> Result<Vec<String>, TagError> {
        tag_checked(self.resolver.tagger(), &line.token_refs())
    }

    /// Convert a prepared line using the unresolved policy `policy`.
    ///
    /// `tags` may be omitted if no word of the line is a heteronym or needs
    /// resolving beyond the lexicon.
    pub(crate) fn convert_prepared(
        &self,
        line: &PreparedLine,
        tags: Option<&[String]>,
        policy: UnresolvedPolicy,
        oov: OovMode,
    ) -> Result<Option<String>, ConvertError> {
        self.replace_words(line, tags, Replace::AllWords(policy), oov)
    }

    fn replace_words(
        &self,
        line: &PreparedLine,
        tags: Option<&[String]>,
        mode: Replace,
        oov: OovMode,
    ) -> Result<Option<String>, ConvertError> {
        let heteronyms = self.resolver.heteronyms();
        let mut output = line.text.clone();
        let mut in_escaped = false;

        for (i, token) in line.tokens.iter().enumerate() {
            match token.as_str() {
                "{" if in_escaped => return Err(BraceError::Nested(line.text.clone()).into()),
                "{" => {
                    in_escaped = true;
                    continue;
                }
                "}" if !in_escaped => {
                    return Err(BraceError::UnmatchedClose(line.text.clone()).into())
                }
                "}" => {
                    in_escaped = false;
                    continue;
                }
                _ if in_escaped => continue,
                word if !contains_alpha(word) => continue,
                _ => {}
            }

            let pos = tags.and_then(|tags| tags.get(i)).map(|t| t.as_str());

            // Heteronym entries are authoritative. If none of a heteronym's
            // keys match, the word is unresolved.
            let pron = if heteronyms.contains(token) {
                heteronyms.get(token, pos).cloned()
            } else if mode == Replace::HeteronymsOnly {
                continue;
            } else {
                self.resolver
                    .resolve_in(token, pos, oov)?
                    .map(|res| res.pron)
            };

            match (pron, mode) {
                (Some(pron), _) => {
                    match replace_first(&output, token, &to_bracketed(&pron)) {
                        Some(replaced) => output = replaced,
                        None => tracing::warn!(word = %token, "token not found in line"),
                    }
                }
                (None, Replace::HeteronymsOnly) => {}
                (None, Replace::AllWords(UnresolvedPolicy::Keep)) => {}
                (None, Replace::AllWords(UnresolvedPolicy::Remove)) => {
                    match remove_first(&output, token) {
                        Some(removed) => output = removed,
                        None => tracing::warn!(word = %token, "token not found in line"),
                    }
                }
                (None, Replace::AllWords(UnresolvedPolicy::Drop)) => {
                    tracing::debug!(word = %token, "dropping line with unresolved word");
                    return Ok(None);
                }
            }
        }

        if in_escaped {
            return Err(BraceError::UnmatchedOpen(line.text.clone()).into());
        }

        Ok(Some(output))
    }
}
