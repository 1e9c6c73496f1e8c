//! The out-of-vocabulary inference boundary.
//!
//! Words that neither the lexicon nor the cascade can resolve are sent to an
//! [`Infer`] implementation, usually a neural grapheme-to-phoneme model. The
//! crate does not ship a model. [`TableInference`] serves pronunciations from
//! a fixed table instead, which is useful for tests and for supplementary
//! dictionaries of generated pronunciations.

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::lexicon::Lexicon;
use crate::phoneme::Pronunciation;

/// Errors reported by an [`Infer`] implementation.
#[derive(Debug)]
pub enum InferError {
    /// The deadline in [`InferOptions`] passed before inference finished.
    DeadlineExceeded,

    /// Inference was cancelled via [`InferOptions::cancel`].
    Cancelled,

    /// The model returned a different number of results than it was given
    /// words.
    LengthMismatch { words: usize, results: usize },

    /// The model failed.
    Other(Box<dyn Error + Send + Sync>),
}

impl fmt::Display for InferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadlineExceeded => write!(f, "inference deadline exceeded"),
            Self::Cancelled => write!(f, "inference cancelled"),
            Self::LengthMismatch { words, results } => write!(
                f,
                "inference returned {} results for {} words",
                results, words
            ),
            Self::Other(err) => write!(f, "inference failed: {}", err),
        }
    }
}

impl Error for InferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Deadline and cancellation hooks passed to each inference call.
#[derive(Clone, Debug, Default)]
pub struct InferOptions {
    /// Time by which inference should finish.
    pub deadline: Option<Instant>,

    /// Flag which the caller sets to abandon inference.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl InferOptions {
    /// Return an error if the deadline has passed or cancellation was
    /// requested.
    ///
    /// Implementations should call this before starting work and, for long
    /// batches, periodically while working.
    pub fn check(&self) -> Result<(), InferError> {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
        {
            return Err(InferError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(InferError::DeadlineExceeded);
        }
        Ok(())
    }
}

/// Pronunciation model for out-of-vocabulary words.
pub trait Infer: Send + Sync {
    /// Predict a pronunciation for each word.
    ///
    /// Must return one result per input word, in the same order. `None`
    /// means the model has no prediction for that word.
    fn infer(
        &self,
        words: &[&str],
        opts: &InferOptions,
    ) -> Result<Vec<Option<Pronunciation>>, InferError>;
}

/// Call `model` and check that it returned one result per word.
pub(crate) fn infer_checked(
    model: &dyn Infer,
    words: &[&str],
    opts: &InferOptions,
) -> Result<Vec<Option<Pronunciation>>, InferError> {
    if words.is_empty() {
        return Ok(Vec::new());
    }
    let results = model.infer(words, opts)?;
    if results.len() != words.len() {
        return Err(InferError::LengthMismatch {
            words: words.len(),
            results: results.len(),
        });
    }
    Ok(results)
}

/// Inference backend which never predicts anything.
#[derive(Clone, Debug, Default)]
pub struct NoInference;

impl Infer for NoInference {
    fn infer(
        &self,
        words: &[&str],
        _opts: &InferOptions,
    ) -> Result<Vec<Option<Pronunciation>>, InferError> {
        Ok(vec![None; words.len()])
    }
}

/// Inference backend which looks words up in a fixed table.
#[derive(Clone, Debug)]
pub struct TableInference {
    table: Lexicon,
}

impl TableInference {
    pub fn new(table: Lexicon) -> TableInference {
        TableInference { table }
    }
}

impl Infer for TableInference {
    fn infer(
        &self,
        words: &[&str],
        opts: &InferOptions,
    ) -> Result<Vec<Option<Pronunciation>>, InferError> {
        opts.check()?;
        Ok(words
            .iter()
            .map(|word| self.table.lookup_exact(word).cloned())
            .collect())
    }
}
