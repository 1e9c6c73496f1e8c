//! Conversion of many lines at once.
//!
//! [`BatchResolver`] produces the same output as calling
//! [`Converter::convert`] on each line, but amortizes the cost of the
//! part-of-speech tagger and the inference model. Lines are deduplicated and
//! sorted into tiers:
//!
//! 1. Every word is in the lexicon and none is a heteronym. These lines are
//!    not tagged.
//! 2. Every word is in the lexicon or is a heteronym. These lines are tagged,
//!    in one batch together with tier 3 lines.
//! 3. Some words are unknown. The words which need inference are collected
//!    from all tier 3 lines and sent to the model in one call.
//!
//! Each line gets its own result. A line which fails to convert, for example
//! because of malformed braces, is reported in its slot and takes no part in
//! tiering, tagging or inference for the rest of the batch.

use std::sync::Mutex;

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::UnresolvedPolicy;
use crate::convert::{ConvertError, Converter, PreparedLine};
use crate::phoneme::Pronunciation;
use crate::pos::{tag_checked, TagError};
use crate::resolver::OovMode;
use crate::threading::thread_pool;

/// Resolvability tier of a line. See the [module docs](self).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Lexicon,
    Heteronym,
    Inference,
}

/// Counts of lines in each tier from the last batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchStats {
    /// Number of input lines.
    pub lines: usize,

    /// Number of distinct lines.
    pub unique_lines: usize,

    /// Number of distinct lines in each [`Tier`].
    pub tiers: [usize; 3],

    /// Number of distinct lines which failed before tiering.
    pub rejected: usize,

    /// Number of words sent to the inference model in the bulk call.
    pub inferred_words: usize,
}

/// Result of converting one line.
pub type LineResult = Result<Option<String>, ConvertError>;

/// Converts batches of lines with a [`Converter`].
pub struct BatchResolver<'a> {
    converter: &'a Converter,
}

struct Line {
    prepared: PreparedLine,
    tier: Tier,
    tags: Option<Vec<String>>,
}

impl<'a> BatchResolver<'a> {
    pub fn new(converter: &'a Converter) -> BatchResolver<'a> {
        BatchResolver { converter }
    }

    /// Return the tier of a prepared line.
    fn classify(&self, line: &PreparedLine) -> Tier {
        let resolver = self.converter.resolver();
        let lexicon = resolver.lexicon();
        let heteronyms = resolver.heteronyms();

        let mut tier = Tier::Lexicon;
        for word in line.candidates() {
            if heteronyms.contains(word) {
                tier = Tier::Heteronym;
            } else if !lexicon.contains(word) {
                return Tier::Inference;
            }
        }
        tier
    }

    /// Convert `lines` using the converter's unresolved policy.
    ///
    /// Returns one result per input line, in order. A failing line does not
    /// affect the results of the others.
    pub fn convert_lines<S: AsRef<str> + Sync>(&self, lines: &[S]) -> Vec<LineResult> {
        self.convert_lines_with_stats(lines).0
    }

    /// Variant of [`convert_lines`](Self::convert_lines) which also returns
    /// the tier counts.
    pub fn convert_lines_with_stats<S: AsRef<str> + Sync>(
        &self,
        lines: &[S],
    ) -> (Vec<LineResult>, BatchStats) {
        let converter = self.converter;
        let resolver = converter.resolver();
        let policy = converter.options().unresolved;

        // Deduplicate, keeping the first occurrence of each line.
        let mut unique: Vec<&str> = Vec::new();
        let mut unique_index: FxHashMap<&str, usize> = FxHashMap::default();
        let line_to_unique: Vec<usize> = lines
            .iter()
            .map(|line| {
                let line = line.as_ref();
                *unique_index.entry(line).or_insert_with(|| {
                    unique.push(line);
                    unique.len() - 1
                })
            })
            .collect();

        let mut prepared: Vec<Result<Line, ConvertError>> = thread_pool().run(|| {
            unique
                .par_iter()
                .map(|text| {
                    let prepared = converter.prepare(text)?;
                    let tier = self.classify(&prepared);
                    Ok(Line {
                        prepared,
                        tier,
                        tags: None,
                    })
                })
                .collect()
        });

        let mut stats = BatchStats {
            lines: lines.len(),
            unique_lines: unique.len(),
            ..Default::default()
        };
        for line in &prepared {
            match line {
                Ok(line) => stats.tiers[line.tier as usize] += 1,
                Err(_) => stats.rejected += 1,
            }
        }

        self.tag_lines(&mut prepared);

        let inferred = if resolver.options().use_inference {
            self.prefetch_inference(&prepared)
        } else {
            FxHashMap::default()
        };
        stats.inferred_words = inferred.len();

        tracing::info!(
            lines = stats.lines,
            unique = stats.unique_lines,
            lexicon = stats.tiers[Tier::Lexicon as usize],
            heteronym = stats.tiers[Tier::Heteronym as usize],
            inference = stats.tiers[Tier::Inference as usize],
            rejected = stats.rejected,
            inferred_words = stats.inferred_words,
            "partitioned batch"
        );

        let converted: Vec<LineResult> = thread_pool().run(|| {
            prepared
                .into_par_iter()
                .map(|line| {
                    let line = line?;
                    let oov = match line.tier {
                        Tier::Inference => OovMode::Prefetched(&inferred),
                        Tier::Lexicon | Tier::Heteronym => OovMode::Live,
                    };
                    converter.convert_prepared(
                        &line.prepared,
                        line.tags.as_deref(),
                        policy,
                        oov,
                    )
                })
                .collect()
        });

        // The first occurrence of a line takes its result. Later occurrences
        // copy successful results and convert again to reproduce errors.
        let mut converted: Vec<Option<LineResult>> = converted.into_iter().map(Some).collect();
        let results = line_to_unique
            .into_iter()
            .map(|idx| match converted[idx].take() {
                Some(Ok(output)) => {
                    converted[idx] = Some(Ok(output.clone()));
                    Ok(output)
                }
                Some(Err(err)) => Err(err),
                None => converter.convert(unique[idx]),
            })
            .collect();
        (results, stats)
    }

    /// Tag all tier 2 and 3 lines. Lines whose tagging fails are replaced by
    /// the error.
    fn tag_lines(&self, lines: &mut [Result<Line, ConvertError>]) {
        let needs_tags: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| matches!(line, Ok(line) if line.tier != Tier::Lexicon))
            .map(|(i, _)| i)
            .collect();
        if needs_tags.is_empty() {
            return;
        }

        let tagged = {
            let sentences: Vec<Vec<&str>> = needs_tags
                .iter()
                .filter_map(|&i| lines[i].as_ref().ok())
                .map(|line| line.prepared.token_refs())
                .collect();
            self.tag_sentences(&sentences)
        };

        for (i, tags) in needs_tags.into_iter().zip(tagged) {
            match tags {
                Ok(tags) => {
                    if let Ok(line) = &mut lines[i] {
                        line.tags = Some(tags);
                    }
                }
                Err(err) => lines[i] = Err(err.into()),
            }
        }
    }

    /// Tag `sentences` in one call to the tagger. If the batch call fails,
    /// fall back to tagging each sentence on its own so that the error is
    /// attributed to the sentences which cause it.
    fn tag_sentences(&self, sentences: &[Vec<&str>]) -> Vec<Result<Vec<String>, TagError>> {
        let tagger = self.converter.resolver().tagger();
        let batch = tagger.tag_batch(sentences).and_then(|tagged| {
            if tagged.len() != sentences.len() {
                return Err(TagError::LengthMismatch {
                    tokens: sentences.len(),
                    tags: tagged.len(),
                });
            }
            for (tokens, tags) in sentences.iter().zip(&tagged) {
                if tokens.len() != tags.len() {
                    return Err(TagError::LengthMismatch {
                        tokens: tokens.len(),
                        tags: tags.len(),
                    });
                }
            }
            Ok(tagged)
        });

        match batch {
            Ok(tagged) => tagged.into_iter().map(Ok).collect(),
            Err(err) => {
                tracing::warn!(%err, "batch tagging failed, tagging lines separately");
                sentences
                    .iter()
                    .map(|tokens| tag_checked(tagger, tokens))
                    .collect()
            }
        }
    }

    /// Find the words of tier 3 lines which reach the inference model and
    /// infer them in one call.
    ///
    /// If the bulk call fails, an empty map is returned and each line queries
    /// the model itself, so that errors are reported per line.
    fn prefetch_inference(
        &self,
        lines: &[Result<Line, ConvertError>],
    ) -> FxHashMap<String, Option<Pronunciation>> {
        let converter = self.converter;
        let requests = Mutex::new(FxHashSet::default());

        thread_pool().run(|| {
            lines
                .par_iter()
                .filter_map(|line| line.as_ref().ok())
                .filter(|line| line.tier == Tier::Inference)
                .for_each(|line| {
                    // Unresolved words are kept so that every word of the line
                    // is visited. Errors are reported by the final pass.
                    let _ = converter.convert_prepared(
                        &line.prepared,
                        line.tags.as_deref(),
                        UnresolvedPolicy::Keep,
                        OovMode::Record(&requests),
                    );
                });
        });

        let mut words: Vec<String> = requests.into_inner().unwrap().into_iter().collect();
        words.sort();
        let word_refs: Vec<&str> = words.iter().map(|w| w.as_str()).collect();
        match converter.resolver().infer_batch(&word_refs) {
            Ok(results) => words.into_iter().zip(results).collect(),
            Err(err) => {
                tracing::warn!(%err, words = words.len(), "bulk inference failed");
                FxHashMap::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use arpa_text::BraceError;

    use super::{BatchResolver, Tier};
    use crate::config::{ConvertOptions, UnresolvedPolicy};
    use crate::convert::{ConvertError, Converter};
    use crate::heteronyms::HeteronymTable;
    use crate::infer::{Infer, InferError, InferOptions};
    use crate::lexicon::Lexicon;
    use crate::phoneme::Pronunciation;
    use crate::pos::{SuffixTagger, TagError, Tagger};
    use crate::resolver::Resolver;

    /// Tagger which counts calls.
    struct CountingTagger {
        inner: SuffixTagger,
        calls: Arc<AtomicUsize>,
    }

    impl Tagger for CountingTagger {
        fn tag(&self, tokens: &[&str]) -> Result<Vec<String>, TagError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.tag(tokens)
        }

        fn tag_batch(&self, sentences: &[Vec<&str>]) -> Result<Vec<Vec<String>>, TagError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            sentences.iter().map(|s| self.inner.tag(s)).collect()
        }
    }

    /// Inference model which counts calls and knows a few words.
    struct CountingModel {
        table: Lexicon,
        calls: Arc<AtomicUsize>,
    }

    impl Infer for CountingModel {
        fn infer(
            &self,
            words: &[&str],
            _opts: &InferOptions,
        ) -> Result<Vec<Option<Pronunciation>>, InferError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(words
                .iter()
                .map(|w| self.table.lookup_exact(w).cloned())
                .collect())
        }
    }

    struct Fixture {
        converter: Converter,
        tag_calls: Arc<AtomicUsize>,
        infer_calls: Arc<AtomicUsize>,
    }

    fn fixture(unresolved: UnresolvedPolicy) -> Fixture {
        let lexicon = Lexicon::parse(
            "THE  DH AH0
CAT  K AE1 T
SAT  S AE1 T
BOOK  B UH1 K
",
        )
        .unwrap();
        let heteronyms =
            HeteronymTable::from_json(r#"{"read": {"VBD": "R EH1 D", "DEFAULT": "R IY1 D"}}"#)
                .unwrap();
        let tag_calls = Arc::new(AtomicUsize::new(0));
        let infer_calls = Arc::new(AtomicUsize::new(0));
        let tagger = CountingTagger {
            inner: SuffixTagger::new().with_word("read", "VBD"),
            calls: tag_calls.clone(),
        };
        let model = CountingModel {
            table: Lexicon::parse("ZORP  Z AO1 R P\nBLICK  B L IH1 K").unwrap(),
            calls: infer_calls.clone(),
        };
        let resolver = Resolver::new(Arc::new(lexicon))
            .with_heteronyms(Arc::new(heteronyms))
            .with_tagger(Box::new(tagger))
            .with_inference(Box::new(model));
        let converter = Converter::new(resolver).with_options(ConvertOptions {
            unresolved,
            ..Default::default()
        });
        Fixture {
            converter,
            tag_calls,
            infer_calls,
        }
    }

    const LINES: [&str; 8] = [
        "The cat sat.",
        "The cat read the book.",
        "The zorp sat.",
        "The cat sat.",
        "A blick and a zorp-cat.",
        "The {K AE1 T} sat.",
        "The cat's book.",
        "Unknown words here.",
    ];

    #[test]
    fn test_batch_matches_per_line() {
        for policy in [
            UnresolvedPolicy::Keep,
            UnresolvedPolicy::Remove,
            UnresolvedPolicy::Drop,
        ] {
            let expected: Vec<Option<String>> = {
                let fixture = fixture(policy);
                LINES
                    .iter()
                    .map(|line| fixture.converter.convert(line).unwrap())
                    .collect()
            };

            let fixture = fixture(policy);
            let batch = BatchResolver::new(&fixture.converter);
            let results: Vec<Option<String>> = batch
                .convert_lines(&LINES)
                .into_iter()
                .map(|result| result.unwrap())
                .collect();
            assert_eq!(results, expected, "policy {:?}", policy);
        }
    }

    #[test]
    fn test_batch_amortizes_calls() {
        let fixture = fixture(UnresolvedPolicy::Keep);
        let batch = BatchResolver::new(&fixture.converter);
        let (results, stats) = batch.convert_lines_with_stats(&LINES);
        let results: Vec<Option<String>> = results.into_iter().map(|r| r.unwrap()).collect();

        assert_eq!(results.len(), LINES.len());
        assert_eq!(results[0], results[3]);
        assert_eq!(stats.lines, 8);
        assert_eq!(stats.unique_lines, 7);
        assert_eq!(stats.tiers[Tier::Lexicon as usize], 2);
        assert_eq!(stats.tiers[Tier::Heteronym as usize], 1);
        assert_eq!(stats.tiers[Tier::Inference as usize], 4);
        assert_eq!(stats.rejected, 0);

        // The sentence tagger is called once. Further calls tag single words
        // for the plural strategy.
        assert!(fixture.tag_calls.load(Ordering::SeqCst) >= 1);
        assert_eq!(fixture.infer_calls.load(Ordering::SeqCst), 1);

        assert_eq!(results[2].as_deref(), Some("{DH AH0} {Z AO1 R P} {S AE1 T}."));
        assert_eq!(
            results[4].as_deref(),
            Some("A {B L IH1 K} and a {Z AO1 R P K AE1 T}.")
        );
    }

    #[test]
    fn test_lexicon_only_lines_are_not_tagged() {
        let fixture = fixture(UnresolvedPolicy::Keep);
        let batch = BatchResolver::new(&fixture.converter);
        let results: Vec<Option<String>> = batch
            .convert_lines(&["The cat sat.", "The book."])
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(
            results,
            [
                Some("{DH AH0} {K AE1 T} {S AE1 T}.".to_string()),
                Some("{DH AH0} {B UH1 K}.".to_string()),
            ]
        );
        assert_eq!(fixture.tag_calls.load(Ordering::SeqCst), 0);
        assert_eq!(fixture.infer_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_malformed_lines_fail_alone() {
        let fixture = fixture(UnresolvedPolicy::Keep);
        let batch = BatchResolver::new(&fixture.converter);
        let lines = [
            "The cat.",
            "bad {brace",
            "The zorp read the book.",
            "bad {brace",
            "bad} brace",
        ];
        let (results, stats) = batch.convert_lines_with_stats(&lines);

        assert_eq!(results.len(), lines.len());
        assert_eq!(
            results[0].as_ref().unwrap().as_deref(),
            Some("{DH AH0} {K AE1 T}.")
        );
        assert_eq!(
            results[2].as_ref().unwrap().as_deref(),
            Some("{DH AH0} {Z AO1 R P} {R EH1 D} {DH AH0} {B UH1 K}.")
        );

        // Repeated malformed lines each get their own error.
        for idx in [1, 3] {
            assert!(matches!(
                results[idx],
                Err(ConvertError::BraceError(BraceError::UnmatchedOpen(_)))
            ));
        }
        assert!(matches!(
            results[4],
            Err(ConvertError::BraceError(BraceError::UnmatchedClose(_)))
        ));

        assert_eq!(stats.unique_lines, 4);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.tiers.iter().sum::<usize>(), 2);
        assert_eq!(fixture.infer_calls.load(Ordering::SeqCst), 1);
    }

    /// Tagger which fails on any sentence containing "glorp".
    struct GlorpTagger(SuffixTagger);

    impl Tagger for GlorpTagger {
        fn tag(&self, tokens: &[&str]) -> Result<Vec<String>, TagError> {
            if tokens.contains(&"glorp") {
                return Err(TagError::Failed("unsupported word".into()));
            }
            self.0.tag(tokens)
        }
    }

    #[test]
    fn test_tagger_errors_fail_alone() {
        let lexicon = Lexicon::parse("THE  DH AH0\nCAT  K AE1 T\nBOOK  B UH1 K").unwrap();
        let heteronyms =
            HeteronymTable::from_json(r#"{"read": {"VBD": "R EH1 D", "DEFAULT": "R IY1 D"}}"#)
                .unwrap();
        let resolver = Resolver::new(Arc::new(lexicon))
            .with_heteronyms(Arc::new(heteronyms))
            .with_tagger(Box::new(GlorpTagger(
                SuffixTagger::new().with_word("read", "VBD"),
            )));
        let converter = Converter::new(resolver);
        let batch = BatchResolver::new(&converter);

        let results = batch.convert_lines(&["The cat read the book.", "glorp read", "The cat."]);
        assert_eq!(
            results[0].as_ref().unwrap().as_deref(),
            Some("{DH AH0} {K AE1 T} {R EH1 D} {DH AH0} {B UH1 K}.")
        );
        assert!(matches!(
            results[1],
            Err(ConvertError::TagError(TagError::Failed(_)))
        ));
        assert_eq!(
            results[2].as_ref().unwrap().as_deref(),
            Some("{DH AH0} {K AE1 T}.")
        );
    }
}
