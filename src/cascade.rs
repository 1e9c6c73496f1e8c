//! Morphological strategies for deriving pronunciations of unknown words.
//!
//! Each [`Strategy`] recognizes a surface pattern (a hyphen, a possessive
//! `'s`, an `-ing` suffix ...), splits the word into pieces, looks the pieces
//! up and reassembles the result. Pieces are looked up through a
//! [`SubwordLookup`], which for a [`Resolver`](crate::Resolver) re-enters the
//! full resolution process, so strategies compose: "sunflowers'" may resolve
//! via plural, then compound, then the lexicon.
//!
//! Strategies never fail because a word does not match their pattern. They
//! return `Ok(None)`, and only report errors from the capabilities they call
//! (tagging, segmentation or inference of a sub-word).

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::CascadeOptions;
use crate::phoneme::{Phoneme, Pronunciation};
use crate::pos::is_plural_noun;
use crate::resolver::ResolveError;

/// A decomposition strategy. Strategies are tried in the order of
/// [`Strategy::ALL`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    Hyphenated,
    Possessive,
    Contraction,
    Compound,
    Plural,
    Stem,
}

impl Strategy {
    /// All strategies, in priority order.
    pub const ALL: [Strategy; 6] = [
        Strategy::Hyphenated,
        Strategy::Possessive,
        Strategy::Contraction,
        Strategy::Compound,
        Strategy::Plural,
        Strategy::Stem,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Hyphenated => "hyphenated",
            Strategy::Possessive => "possessive",
            Strategy::Contraction => "contraction",
            Strategy::Compound => "compound",
            Strategy::Plural => "plural",
            Strategy::Stem => "stem",
        }
    }

    /// Return true if this strategy is enabled in `opts`.
    pub fn enabled(self, opts: &CascadeOptions) -> bool {
        match self {
            Strategy::Hyphenated => opts.hyphenated,
            Strategy::Possessive => opts.possessive,
            Strategy::Contraction => opts.contraction,
            Strategy::Compound => opts.compound,
            Strategy::Plural => opts.plural,
            Strategy::Stem => opts.stem,
        }
    }

    /// Try to derive the pronunciation of a lowercase `word`.
    pub fn apply(
        self,
        word: &str,
        pos: Option<&str>,
        lookup: &dyn SubwordLookup,
        stats: &CascadeStats,
    ) -> Result<Option<Pronunciation>, ResolveError> {
        match self {
            Strategy::Hyphenated => hyphenated(word, lookup, stats),
            Strategy::Possessive => possessive(word, lookup, stats),
            Strategy::Contraction => contraction(word, lookup, stats),
            Strategy::Compound => compound(word, lookup, stats),
            Strategy::Plural => plural(word, pos, lookup, stats),
            Strategy::Stem => stem(word, lookup, stats),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The stage of resolution which produced a derived pronunciation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    Strategy(Strategy),
    Inference,
}

impl Source {
    /// All sources, in the order they are tried.
    pub const ALL: [Source; 7] = [
        Source::Strategy(Strategy::Hyphenated),
        Source::Strategy(Strategy::Possessive),
        Source::Strategy(Strategy::Contraction),
        Source::Strategy(Strategy::Compound),
        Source::Strategy(Strategy::Plural),
        Source::Strategy(Strategy::Stem),
        Source::Inference,
    ];

    fn index(self) -> usize {
        match self {
            Source::Strategy(strategy) => strategy as usize,
            Source::Inference => Strategy::ALL.len(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Source::Strategy(strategy) => strategy.name(),
            Source::Inference => "inference",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lookup of the pieces a strategy splits a word into.
pub trait SubwordLookup {
    /// Resolve a lowercase sub-word.
    fn lookup(
        &self,
        word: &str,
        pos: Option<&str>,
    ) -> Result<Option<Pronunciation>, ResolveError>;

    /// Split a compound word into parts.
    fn segment(&self, word: &str) -> Result<Vec<String>, ResolveError>;

    /// Return the part-of-speech tag of a word seen in isolation.
    fn tag_word(&self, word: &str) -> Result<Option<String>, ResolveError>;
}

/// Number of times a stage was attempted and how often it succeeded.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceCounts {
    /// Times the stage's pattern matched and it tried to resolve the word.
    pub attempts: usize,

    /// Times the stage produced a pronunciation.
    pub successes: usize,
}

/// Counters of attempts and successes per stage.
///
/// These are for observability only. Cache hits are credited to the stage
/// that originally produced the cached entry.
#[derive(Debug, Default)]
pub struct CascadeStats {
    attempts: [AtomicUsize; 7],
    successes: [AtomicUsize; 7],
}

impl CascadeStats {
    pub fn new() -> CascadeStats {
        CascadeStats::default()
    }

    pub fn record_attempt(&self, source: Source) {
        self.attempts[source.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, source: Source) {
        self.successes[source.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Count a cached result as an attempt and success of its source.
    pub fn record_cache_hit(&self, source: Source) {
        self.record_attempt(source);
        self.record_success(source);
    }

    pub fn get(&self, source: Source) -> SourceCounts {
        SourceCounts {
            attempts: self.attempts[source.index()].load(Ordering::Relaxed),
            successes: self.successes[source.index()].load(Ordering::Relaxed),
        }
    }

    /// Return the counts of every source, in priority order.
    pub fn snapshot(&self) -> Vec<(Source, SourceCounts)> {
        Source::ALL
            .iter()
            .map(|&source| (source, self.get(source)))
            .collect()
    }
}

const POSSESSIVE_SIBILANT: [Phoneme; 6] = [
    Phoneme::S,
    Phoneme::Z,
    Phoneme::CH,
    Phoneme::JH,
    Phoneme::SH,
    Phoneme::ZH,
];

const POSSESSIVE_VOICED: [Phoneme; 8] = [
    Phoneme::B,
    Phoneme::D,
    Phoneme::G,
    Phoneme::M,
    Phoneme::N,
    Phoneme::R,
    Phoneme::L,
    Phoneme::NG,
];

const POSSESSIVE_VOICELESS: [Phoneme; 4] = [Phoneme::P, Phoneme::T, Phoneme::K, Phoneme::TH];

/// Return the suffix of the possessive form of a word ending in `last`.
///
/// Words ending in a vowel take `Z`. Vowels are recognized by their stress
/// digit (see [`Phoneme::is_stressed`]).
fn possessive_suffix(last: Phoneme) -> Option<&'static [Phoneme]> {
    if POSSESSIVE_SIBILANT.contains(&last) {
        Some(&[Phoneme::IH0, Phoneme::Z])
    } else if POSSESSIVE_VOICED.contains(&last) || last.is_stressed() {
        Some(&[Phoneme::Z])
    } else if POSSESSIVE_VOICELESS.contains(&last) {
        Some(&[Phoneme::S])
    } else {
        None
    }
}

/// Resolve each part and concatenate them. Returns `None` if any part is
/// unresolved.
fn join_parts<'a>(
    parts: impl IntoIterator<Item = &'a str>,
    lookup: &dyn SubwordLookup,
) -> Result<Option<Pronunciation>, ResolveError> {
    let mut prons = Vec::new();
    for part in parts {
        match lookup.lookup(part, None)? {
            Some(pron) => prons.push(pron),
            None => return Ok(None),
        }
    }
    Ok(Some(Pronunciation::join(&prons)))
}

/// Record the outcome of a stage and pass the result through.
fn record(
    stats: &CascadeStats,
    strategy: Strategy,
    result: Option<Pronunciation>,
) -> Option<Pronunciation> {
    if result.is_some() {
        stats.record_success(Source::Strategy(strategy));
    }
    result
}

/// "well-known" => "well" + "known".
fn hyphenated(
    word: &str,
    lookup: &dyn SubwordLookup,
    stats: &CascadeStats,
) -> Result<Option<Pronunciation>, ResolveError> {
    if !word.contains('-') {
        return Ok(None);
    }
    stats.record_attempt(Source::Strategy(Strategy::Hyphenated));
    let pron = join_parts(word.split('-'), lookup)?;
    Ok(record(stats, Strategy::Hyphenated, pron))
}

/// "cat's" => "cat" + `S`.
fn possessive(
    word: &str,
    lookup: &dyn SubwordLookup,
    stats: &CascadeStats,
) -> Result<Option<Pronunciation>, ResolveError> {
    let Some(core) = word.strip_suffix("'s") else {
        return Ok(None);
    };
    stats.record_attempt(Source::Strategy(Strategy::Possessive));

    let Some(core_pron) = lookup.lookup(core, None)? else {
        return Ok(None);
    };
    let pron = core_pron
        .last()
        .and_then(possessive_suffix)
        .map(|suffix| core_pron.with_suffix(suffix));
    Ok(record(stats, Strategy::Possessive, pron))
}

/// "they'll" => "they" + `AH0 L`, "she'd" => "she" + `D`.
fn contraction(
    word: &str,
    lookup: &dyn SubwordLookup,
    stats: &CascadeStats,
) -> Result<Option<Pronunciation>, ResolveError> {
    let mut parts = word.split('\'');
    let (Some(core), Some(ending), None) = (parts.next(), parts.next(), parts.next()) else {
        return Ok(None);
    };
    let suffix: &[Phoneme] = match ending {
        "ll" => &[Phoneme::AH0, Phoneme::L],
        "d" => &[Phoneme::D],
        _ => return Ok(None),
    };
    stats.record_attempt(Source::Strategy(Strategy::Contraction));

    let pron = lookup
        .lookup(core, None)?
        .map(|core_pron| core_pron.with_suffix(suffix));
    Ok(record(stats, Strategy::Contraction, pron))
}

/// Shortest compound part, in characters.
const MIN_COMPOUND_PART_LEN: usize = 3;

/// "sunflower" => "sun" + "flower".
fn compound(
    word: &str,
    lookup: &dyn SubwordLookup,
    stats: &CascadeStats,
) -> Result<Option<Pronunciation>, ResolveError> {
    let parts = lookup.segment(word)?;
    if parts.len() < 2
        || parts
            .iter()
            .any(|part| part.chars().count() < MIN_COMPOUND_PART_LEN)
    {
        return Ok(None);
    }
    stats.record_attempt(Source::Strategy(Strategy::Compound));
    let pron = join_parts(parts.iter().map(|p| p.as_str()), lookup)?;
    Ok(record(stats, Strategy::Compound, pron))
}

/// "cats" => "cat's", "potatoes" => "potato's".
///
/// Plurals are pronounced like possessives of the singular, so the
/// possessive rule does the work.
fn plural(
    word: &str,
    pos: Option<&str>,
    lookup: &dyn SubwordLookup,
    stats: &CascadeStats,
) -> Result<Option<Pronunciation>, ResolveError> {
    if !word.ends_with('s') {
        return Ok(None);
    }
    let tag = match pos {
        Some(tag) => Some(tag.to_string()),
        None => lookup.tag_word(word)?,
    };
    if !tag.as_deref().is_some_and(is_plural_noun) {
        return Ok(None);
    }
    stats.record_attempt(Source::Strategy(Strategy::Plural));

    let mut singulars = Vec::with_capacity(2);
    if word.len() > 3 && word.ends_with("oes") {
        singulars.push(&word[..word.len() - 2]);
    }
    if word.len() > 1 {
        singulars.push(&word[..word.len() - 1]);
    }

    for singular in singulars {
        let pron = possessive(&format!("{}'s", singular), lookup, stats)?;
        if pron.is_some() {
            return Ok(record(stats, Strategy::Plural, pron));
        }
    }
    Ok(None)
}

/// "quickly" => "quick" + `L IY0`, "taking" => "take" + `IH0 NG`.
fn stem(
    word: &str,
    lookup: &dyn SubwordLookup,
    stats: &CascadeStats,
) -> Result<Option<Pronunciation>, ResolveError> {
    if word.chars().count() < 3 || !(word.ends_with("ly") || word.ends_with("ing")) {
        return Ok(None);
    }
    stats.record_attempt(Source::Strategy(Strategy::Stem));

    if let Some(root) = word.strip_suffix("ly") {
        if let Some(root_pron) = lookup.lookup(root, None)? {
            let pron = root_pron.with_suffix(&[Phoneme::L, Phoneme::IY0]);
            return Ok(record(stats, Strategy::Stem, Some(pron)));
        }
    }

    if let Some(root) = word.strip_suffix("ing") {
        for root in [root.to_string(), format!("{}e", root)] {
            if let Some(root_pron) = lookup.lookup(&root, None)? {
                let pron = root_pron.with_suffix(&[Phoneme::IH0, Phoneme::NG]);
                return Ok(record(stats, Strategy::Stem, Some(pron)));
            }
        }
    }

    Ok(None)
}
