//! Per-language replacements for the built-in structural scanner.

use crate::types::StructuralBlock;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Custom block extractor for one language.
///
/// Blocks must come back in source order with 1-indexed line numbers. They
/// still go through namespace attachment and chunk assembly.
pub trait BlockExtractor: Send + Sync {
    fn extract(&self, text: &str) -> anyhow::Result<Vec<StructuralBlock>>;
}

impl<F> BlockExtractor for F
where
    F: Fn(&str) -> anyhow::Result<Vec<StructuralBlock>> + Send + Sync,
{
    fn extract(&self, text: &str) -> anyhow::Result<Vec<StructuralBlock>> {
        self(text)
    }
}

/// Language name → custom extractor
#[derive(Default, Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn BlockExtractor>>,
}

static GLOBAL: Lazy<RwLock<ExtractorRegistry>> =
    Lazy::new(|| RwLock::new(ExtractorRegistry::default()));

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `extractor` for `language` (case-insensitive), replacing any
    /// previous one
    pub fn register(&mut self, language: &str, extractor: Arc<dyn BlockExtractor>) {
        log::debug!("Registering custom extractor for '{language}'");
        self.extractors.insert(language.to_lowercase(), extractor);
    }

    pub fn unregister(&mut self, language: &str) -> Option<Arc<dyn BlockExtractor>> {
        self.extractors.remove(&language.to_lowercase())
    }

    pub fn get(&self, language: &str) -> Option<Arc<dyn BlockExtractor>> {
        self.extractors.get(&language.to_lowercase()).cloned()
    }

    pub fn clear(&mut self) {
        self.extractors.clear();
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Registered language names, sorted
    pub fn languages(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Process-wide default used by chunkers built without their own registry
    pub fn global() -> &'static RwLock<ExtractorRegistry> {
        &GLOBAL
    }

    /// Snapshot of the global registry
    pub fn global_snapshot() -> ExtractorRegistry {
        GLOBAL
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Register into the global registry
    pub fn register_global(language: &str, extractor: Arc<dyn BlockExtractor>) {
        GLOBAL
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(language, extractor);
    }

    /// Empty the global registry
    pub fn reset() {
        GLOBAL.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("languages", &self.languages())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whole_file(text: &str) -> anyhow::Result<Vec<StructuralBlock>> {
        Ok(vec![StructuralBlock::new(text, 1, text.lines().count().max(1))])
    }

    #[test]
    fn register_and_lookup_is_case_insensitive() {
        let mut registry = ExtractorRegistry::new();
        registry.register("Python", Arc::new(whole_file));

        let extractor = registry.get("python").unwrap();
        let blocks = extractor.extract("a\nb").unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].end_line, 2);
        assert_eq!(registry.languages(), vec!["python"]);

        assert!(registry.unregister("PYTHON").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn global_registry_register_and_remove() {
        ExtractorRegistry::register_global("registry-test-lang", Arc::new(whole_file));
        assert!(ExtractorRegistry::global_snapshot()
            .get("registry-test-lang")
            .is_some());

        ExtractorRegistry::global()
            .write()
            .unwrap()
            .unregister("registry-test-lang");
        assert!(ExtractorRegistry::global_snapshot()
            .get("registry-test-lang")
            .is_none());
    }
}
