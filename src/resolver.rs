//! Top-level word lookup.

use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::cache::ResolutionCache;
use crate::cascade::{CascadeStats, Source, Strategy, SubwordLookup};
use crate::config::CascadeOptions;
use crate::format::{format_as, Formatted, PhonemeFormat};
use crate::heteronyms::HeteronymTable;
use crate::infer::{infer_checked, Infer, InferError, InferOptions, NoInference};
use crate::lexicon::Lexicon;
use crate::phoneme::Pronunciation;
use crate::pos::{tag_checked, SuffixTagger, TagError, Tagger};
use crate::segment::{LexiconSegmenter, SegmentError, Segmenter};

/// Errors from the capabilities a [`Resolver`] calls while resolving a word.
///
/// A word that cannot be resolved is not an error.
#[derive(Debug)]
pub enum ResolveError {
    TagError(TagError),
    SegmentError(SegmentError),
    InferError(InferError),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TagError(err) => write!(f, "{}", err),
            Self::SegmentError(err) => write!(f, "{}", err),
            Self::InferError(err) => write!(f, "{}", err),
        }
    }
}

impl Error for ResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::TagError(err) => Some(err),
            Self::SegmentError(err) => Some(err),
            Self::InferError(err) => Some(err),
        }
    }
}

impl From<TagError> for ResolveError {
    fn from(val: TagError) -> Self {
        ResolveError::TagError(val)
    }
}

impl From<SegmentError> for ResolveError {
    fn from(val: SegmentError) -> Self {
        ResolveError::SegmentError(val)
    }
}

impl From<InferError> for ResolveError {
    fn from(val: InferError) -> Self {
        ResolveError::InferError(val)
    }
}

/// Where a resolved pronunciation came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Origin {
    Lexicon,
    Heteronym,
    /// Served from the resolution cache. The value is the stage which
    /// originally derived it.
    Cache(Source),
    Derived(Source),
}

/// A pronunciation and where it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub pron: Pronunciation,
    pub origin: Origin,
}

/// How out-of-vocabulary words are sent to the inference model.
///
/// The batch resolver first runs with [`OovMode::Record`] to collect the
/// words that need inference, sends them to the model in one call, and then
/// resolves again with [`OovMode::Prefetched`].
#[derive(Copy, Clone)]
pub(crate) enum OovMode<'a> {
    /// Call the model for each word as it is encountered.
    Live,

    /// Record words which need inference and treat them as unresolved.
    /// Nothing is cached in this mode.
    Record(&'a Mutex<FxHashSet<String>>),

    /// Use previously inferred results, falling back to calling the model
    /// for words that were not prefetched.
    Prefetched(&'a FxHashMap<String, Option<Pronunciation>>),
}

impl OovMode<'_> {
    fn is_recording(&self) -> bool {
        matches!(self, OovMode::Record(_))
    }
}

/// Resolves words to pronunciations.
///
/// Resolution tries, in order:
///
/// 1. The lexicon
/// 2. The heteronym table, using the part-of-speech tag
/// 3. The resolution cache, if enabled
/// 4. Each enabled [`Strategy`], in priority order
/// 5. The inference model, if enabled
///
/// Strategies resolve sub-words by re-entering this sequence, up to
/// [`CascadeOptions::max_depth`] levels deep.
///
/// A resolver is `Sync` and can be shared between threads. The lexicon and
/// heteronym tables are immutable. The cache and statistics use interior
/// synchronization.
pub struct Resolver {
    lexicon: Arc<Lexicon>,
    heteronyms: Arc<HeteronymTable>,
    tagger: Box<dyn Tagger>,
    segmenter: Box<dyn Segmenter>,
    model: Box<dyn Infer>,
    infer_opts: InferOptions,
    opts: CascadeOptions,
    cache: ResolutionCache,
    stats: CascadeStats,
}

impl Resolver {
    /// Create a resolver for a lexicon.
    ///
    /// The resolver initially has an empty heteronym table, tags words with
    /// [`SuffixTagger`], segments compounds with a [`LexiconSegmenter`] over
    /// `lexicon` and has no inference model.
    pub fn new(lexicon: Arc<Lexicon>) -> Resolver {
        Resolver {
            segmenter: Box::new(LexiconSegmenter::new(lexicon.clone())),
            lexicon,
            heteronyms: Arc::new(HeteronymTable::new()),
            tagger: Box::new(SuffixTagger::new()),
            model: Box::new(NoInference),
            infer_opts: InferOptions::default(),
            opts: CascadeOptions::default(),
            cache: ResolutionCache::new(),
            stats: CascadeStats::new(),
        }
    }

    pub fn with_heteronyms(mut self, heteronyms: Arc<HeteronymTable>) -> Self {
        self.heteronyms = heteronyms;
        self
    }

    pub fn with_tagger(mut self, tagger: Box<dyn Tagger>) -> Self {
        self.tagger = tagger;
        self
    }

    pub fn with_segmenter(mut self, segmenter: Box<dyn Segmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn with_inference(mut self, model: Box<dyn Infer>) -> Self {
        self.model = model;
        self
    }

    /// Set the deadline and cancellation hooks passed to the inference
    /// model.
    pub fn with_infer_options(mut self, opts: InferOptions) -> Self {
        self.infer_opts = opts;
        self
    }

    pub fn with_options(mut self, opts: CascadeOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn heteronyms(&self) -> &HeteronymTable {
        &self.heteronyms
    }

    pub fn tagger(&self) -> &dyn Tagger {
        self.tagger.as_ref()
    }

    pub fn options(&self) -> &CascadeOptions {
        &self.opts
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Return the per-stage attempt and success counters.
    pub fn stats(&self) -> &CascadeStats {
        &self.stats
    }

    /// Resolve `word`, optionally using its part-of-speech tag.
    ///
    /// Returns `Ok(None)` if no stage can resolve the word.
    pub fn resolve(
        &self,
        word: &str,
        pos: Option<&str>,
    ) -> Result<Option<Pronunciation>, ResolveError> {
        Ok(self.resolve_with_origin(word, pos)?.map(|res| res.pron))
    }

    /// Resolve `word` and report which stage produced the result.
    pub fn resolve_with_origin(
        &self,
        word: &str,
        pos: Option<&str>,
    ) -> Result<Option<Resolution>, ResolveError> {
        self.resolve_in(word, pos, OovMode::Live)
    }

    /// Resolve `word` and render the result in `format`.
    pub fn lookup(
        &self,
        word: &str,
        pos: Option<&str>,
        format: PhonemeFormat,
    ) -> Result<Option<Formatted>, ResolveError> {
        Ok(self
            .resolve(word, pos)?
            .map(|pron| format_as(&pron, format)))
    }

    pub(crate) fn resolve_in(
        &self,
        word: &str,
        pos: Option<&str>,
        oov: OovMode,
    ) -> Result<Option<Resolution>, ResolveError> {
        // Dry runs must not skew the statistics.
        let scratch_stats;
        let stats = if oov.is_recording() {
            scratch_stats = CascadeStats::new();
            &scratch_stats
        } else {
            &self.stats
        };

        let ctx = Context {
            resolver: self,
            depth: 0,
            oov,
            stats,
        };
        ctx.resolve(word, pos)
    }

    /// Tag a single word in isolation.
    fn tag_word(&self, word: &str) -> Result<Option<String>, TagError> {
        let mut tags = tag_checked(self.tagger.as_ref(), &[word])?;
        Ok(tags.pop())
    }

    fn infer_one(&self, word: &str) -> Result<Option<Pronunciation>, InferError> {
        let mut results = infer_checked(self.model.as_ref(), &[word], &self.infer_opts)?;
        Ok(results.pop().flatten())
    }

    /// Run the inference model on a batch of words, in one call.
    pub(crate) fn infer_batch(
        &self,
        words: &[&str],
    ) -> Result<Vec<Option<Pronunciation>>, InferError> {
        infer_checked(self.model.as_ref(), words, &self.infer_opts)
    }
}

/// State of one resolution, including any recursive sub-word lookups.
struct Context<'a> {
    resolver: &'a Resolver,
    depth: usize,
    oov: OovMode<'a>,
    stats: &'a CascadeStats,
}

impl Context<'_> {
    fn resolve(&self, word: &str, pos: Option<&str>) -> Result<Option<Resolution>, ResolveError> {
        if word.is_empty() {
            return Ok(None);
        }

        let resolver = self.resolver;
        let opts = &resolver.opts;

        if self.depth > opts.max_depth {
            tracing::debug!(word, depth = self.depth, "recursion limit reached");
            return Ok(None);
        }

        let word = word.to_lowercase();

        if let Some(pron) = resolver.lexicon.lookup_exact(&word) {
            return Ok(Some(Resolution {
                pron: pron.clone(),
                origin: Origin::Lexicon,
            }));
        }

        if let Some(pron) = resolver.heteronyms.get(&word, pos) {
            return Ok(Some(Resolution {
                pron: pron.clone(),
                origin: Origin::Heteronym,
            }));
        }

        if opts.use_cache {
            if let Some(entry) = resolver.cache.get(&word) {
                tracing::debug!(word, source = %entry.source, "cache hit");
                self.stats.record_cache_hit(entry.source);
                return Ok(Some(Resolution {
                    pron: entry.pron,
                    origin: Origin::Cache(entry.source),
                }));
            }
        }

        let sub_lookup = Context {
            depth: self.depth + 1,
            ..*self
        };
        for strategy in Strategy::ALL {
            if !strategy.enabled(opts) {
                continue;
            }
            if let Some(pron) = strategy.apply(&word, pos, &sub_lookup, self.stats)? {
                tracing::debug!(word, %strategy, pron = %pron, "resolved by strategy");
                return Ok(Some(self.derived(&word, pron, Source::Strategy(strategy))));
            }
        }

        if opts.use_inference {
            if let Some(pron) = self.infer(&word)? {
                return Ok(Some(self.derived(&word, pron, Source::Inference)));
            }
        }

        Ok(None)
    }

    /// Record a pronunciation derived by a cascade stage.
    fn derived(&self, word: &str, pron: Pronunciation, source: Source) -> Resolution {
        if self.resolver.opts.use_cache && !self.oov.is_recording() {
            self.resolver.cache.insert(word, pron.clone(), source);
        }
        Resolution {
            pron,
            origin: Origin::Derived(source),
        }
    }

    fn infer(&self, word: &str) -> Result<Option<Pronunciation>, InferError> {
        let source = Source::Inference;
        self.stats.record_attempt(source);

        let result = match self.oov {
            OovMode::Live => self.resolver.infer_one(word)?,
            OovMode::Record(requests) => {
                requests.lock().unwrap().insert(word.to_string());
                None
            }
            OovMode::Prefetched(results) => match results.get(word) {
                Some(pron) => pron.clone(),
                None => self.resolver.infer_one(word)?,
            },
        };

        if result.is_some() {
            self.stats.record_success(source);
        }
        Ok(result)
    }
}

impl SubwordLookup for Context<'_> {
    fn lookup(
        &self,
        word: &str,
        pos: Option<&str>,
    ) -> Result<Option<Pronunciation>, ResolveError> {
        Ok(self.resolve(word, pos)?.map(|res| res.pron))
    }

    fn segment(&self, word: &str) -> Result<Vec<String>, ResolveError> {
        Ok(self.resolver.segmenter.segment(word)?)
    }

    fn tag_word(&self, word: &str) -> Result<Option<String>, ResolveError> {
        Ok(self.resolver.tag_word(word)?)
    }
}
