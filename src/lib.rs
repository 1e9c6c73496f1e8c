//! arpa converts English text into ARPAbet pronunciations for speech
//! synthesis.
//!
//! # Resolving words
//!
//! A [`Resolver`] finds the pronunciation of a word by trying, in order:
//!
//! 1. A static [`Lexicon`], such as the CMU Pronouncing Dictionary.
//! 2. A [`HeteronymTable`] of words whose pronunciation depends on their part
//!    of speech, eg. "read" (present) vs. "read" (past).
//! 3. A session cache of earlier results.
//! 4. A cascade of morphological [strategies](cascade::Strategy) which split
//!    an unknown word into pieces, resolve the pieces and reassemble them:
//!    hyphenated words, possessives, contractions, compounds, plurals and
//!    "-ly" / "-ing" forms.
//! 5. An out-of-vocabulary model implementing [`Infer`].
//!
//! Part-of-speech tagging, compound segmentation and inference are
//! capabilities supplied through the [`Tagger`](pos::Tagger),
//! [`Segmenter`] and [`Infer`] traits. Simple rule-based implementations are
//! provided so the crate works without external models.
//!
//! # Converting text
//!
//! A [`Converter`] replaces each word of a line with its pronunciation,
//! wrapped in braces. Text that is already in braces is left as is.
//!
//! ```
//! use std::sync::Arc;
//!
//! use arpa::pos::SuffixTagger;
//! use arpa::{Converter, HeteronymTable, Lexicon, Resolver};
//!
//! let lexicon = Lexicon::parse("CAT  K AE1 T\nBOOK  B UH1 K")?;
//! let heteronyms =
//!     HeteronymTable::from_json(r#"{"read": {"VBD": "R EH1 D", "DEFAULT": "R IY1 D"}}"#)?;
//!
//! let resolver = Resolver::new(Arc::new(lexicon))
//!     .with_heteronyms(Arc::new(heteronyms))
//!     .with_tagger(Box::new(SuffixTagger::new().with_word("read", "VBD")));
//! let converter = Converter::new(resolver);
//!
//! let output = converter.convert("The cat read the book.")?;
//! assert_eq!(
//!     output.as_deref(),
//!     Some("The {K AE1 T} {R EH1 D} the {B UH1 K}.")
//! );
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```
//!
//! Words that cannot be resolved are kept, removed or cause the whole line to
//! be dropped, depending on the [`UnresolvedPolicy`].
//!
//! ## Batches
//!
//! [`BatchResolver`] converts many lines at once with the same results as
//! converting them one by one, while tagging and running inference in as few
//! calls as possible.
//!
//! ## Threading
//!
//! The batch resolver partitions lines using a Rayon
//! [ThreadPool](https://docs.rs/rayon/latest/rayon/struct.ThreadPool.html)
//! sized to match the number of physical cores. See [`thread_pool`].

mod batch;
mod cache;
mod config;
mod convert;
mod env;
mod heteronyms;
mod infer;
mod lexicon;
mod phoneme;
mod resolver;
mod segment;
mod threading;

pub mod cascade;
pub mod format;
pub mod pos;

pub use arpa_text::{BraceError, Normalizer, NormalizerOptions, TokenizeError, Tokenizer};
pub use batch::{BatchResolver, BatchStats, LineResult, Tier};
pub use cache::{CacheEntry, ResolutionCache};
pub use config::{CascadeOptions, ConfigError, ConvertOptions, UnresolvedPolicy, DEFAULT_MAX_DEPTH};
pub use convert::{ConvertError, Converter};
pub use env::str_as_bool;
pub use format::{Formatted, PhonemeFormat};
pub use heteronyms::{HeteronymEntry, HeteronymError, HeteronymTable, DEFAULT_KEY};
pub use infer::{Infer, InferError, InferOptions, NoInference, TableInference};
pub use lexicon::{split_variant_index, Lexicon, LexiconError, LexiconFormat};
pub use phoneme::{Phoneme, PhonemeError, Pronunciation, CONSONANTS};
pub use resolver::{Origin, Resolution, ResolveError, Resolver};
pub use segment::{
    LexiconSegmenter, LexiconSegmenterOptions, NoSegmentation, SegmentError, Segmenter,
};
pub use threading::{thread_pool, ThreadPool};
