use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use unicode_segmentation::UnicodeSegmentation;

/// Counts tokens in a piece of text.
///
/// Implementations are opaque to the chunker: any failure is wrapped into
/// [`crate::ChunkerError::TokenCounter`] together with a prefix of the text.
pub trait TokenCounter {
    fn count_tokens(&self, text: &str) -> anyhow::Result<usize>;
}

impl<F> TokenCounter for F
where
    F: Fn(&str) -> usize,
{
    fn count_tokens(&self, text: &str) -> anyhow::Result<usize> {
        Ok(self(text))
    }
}

/// Adapter for counters that can fail (remote tokenizers, model vocabularies)
pub struct FallibleCounter<F>(pub F);

impl<F> TokenCounter for FallibleCounter<F>
where
    F: Fn(&str) -> anyhow::Result<usize>,
{
    fn count_tokens(&self, text: &str) -> anyhow::Result<usize> {
        (self.0)(text)
    }
}

/// Word-boundary tokenizer: every Unicode word and every punctuation mark
/// counts as one token, whitespace counts as nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCounter;

impl WordCounter {
    #[must_use]
    pub fn count(text: &str) -> usize {
        text.split_word_bounds()
            .filter(|segment| !segment.trim().is_empty())
            .count()
    }
}

impl TokenCounter for WordCounter {
    fn count_tokens(&self, text: &str) -> anyhow::Result<usize> {
        Ok(Self::count(text))
    }
}

/// Memoizes another counter, keyed by the exact text
pub struct CachedCounter<C> {
    inner: C,
    cache: Mutex<LruCache<String, usize>>,
}

impl<C: TokenCounter> CachedCounter<C> {
    pub const DEFAULT_CAPACITY: usize = 4096;

    pub fn new(inner: C) -> Self {
        Self::with_capacity(inner, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: C, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: TokenCounter> TokenCounter for CachedCounter<C> {
    fn count_tokens(&self, text: &str) -> anyhow::Result<usize> {
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(count) = cache.get(text) {
                return Ok(*count);
            }
        }

        let count = self.inner.count_tokens(text)?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(text.to_string(), count);
        }
        Ok(count)
    }
}
