//! Session cache of pronunciations derived by the resolver.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rustc_hash::FxHashMap;

use crate::cascade::Source;
use crate::phoneme::Pronunciation;

/// A cached resolution and the stage which produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
    pub pron: Pronunciation,
    pub source: Source,
}

/// Session cache of pronunciations derived by the cascade or by inference.
///
/// The cache only grows. It is shared by all threads using a resolver, and
/// is not authoritative: lexicon and heteronym hits never consult it.
///
/// Entries are keyed by the word alone, not by its part-of-speech tag. Some
/// stages depend on the tag (a plural is only derived for a plural noun
/// tag), so once a word is cached the entry is served for every later tag.
/// In a batch, lines resolve concurrently and which line first populates an
/// entry is not fixed.
pub struct ResolutionCache {
    entries: Mutex<FxHashMap<String, CacheEntry>>,

    /// Number of lookups.
    lookup_count: AtomicUsize,

    /// Number of lookups which found an entry.
    hit_count: AtomicUsize,
}

impl ResolutionCache {
    pub fn new() -> ResolutionCache {
        ResolutionCache {
            entries: Mutex::new(FxHashMap::default()),
            lookup_count: AtomicUsize::new(0),
            hit_count: AtomicUsize::new(0),
        }
    }

    /// Look up a lowercase word.
    pub fn get(&self, word: &str) -> Option<CacheEntry> {
        self.lookup_count.fetch_add(1, Ordering::AcqRel);
        let entry = self.entries.lock().unwrap().get(word).cloned();
        if entry.is_some() {
            self.hit_count.fetch_add(1, Ordering::AcqRel);
        }
        entry
    }

    /// Record the resolution of a lowercase word.
    ///
    /// If two threads resolve the same word concurrently, the last write
    /// wins.
    pub fn insert(&self, word: &str, pron: Pronunciation, source: Source) {
        self.entries
            .lock()
            .unwrap()
            .insert(word.to_string(), CacheEntry { pron, source });
    }

    pub fn lookup_count(&self) -> usize {
        self.lookup_count.load(Ordering::Acquire)
    }

    pub fn hit_count(&self) -> usize {
        self.hit_count.load(Ordering::Acquire)
    }

    /// Return the number of cached words.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::ResolutionCache;
    use crate::cascade::{Source, Strategy};
    use crate::phoneme::pron;

    #[test]
    fn test_cache() {
        let cache = ResolutionCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.get("cats"), None);

        cache.insert("cats", pron("K AE1 T S"), Source::Strategy(Strategy::Plural));
        let entry = cache.get("cats").unwrap();
        assert_eq!(entry.pron, pron("K AE1 T S"));
        assert_eq!(entry.source, Source::Strategy(Strategy::Plural));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup_count(), 2);
        assert_eq!(cache.hit_count(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_inserts() {
        let cache = Arc::new(ResolutionCache::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for j in 0..50 {
                        cache.insert(&format!("w{}", i * 50 + j), pron("W"), Source::Inference);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 200);
    }
}
