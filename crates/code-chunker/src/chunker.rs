use crate::assembler::ChunkAssembler;
use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use crate::extractor::StructuralExtractor;
use crate::language::{DefaultClassifier, IndentationClassifier, Language};
use crate::namespace::attach_namespaces;
use crate::preprocess::{Preprocessor, TaggedSource};
use crate::registry::ExtractorRegistry;
use crate::token::TokenCounter;
use crate::types::{Chunk, StructuralBlock};
use std::path::Path;
use std::sync::Arc;

/// Main chunker interface for processing code
pub struct CodeChunker {
    config: ChunkerConfig,
    classifier: Box<dyn IndentationClassifier>,
    /// `None` means the process-wide registry
    registry: Option<Arc<ExtractorRegistry>>,
}

impl CodeChunker {
    /// Create a new chunker with a validated configuration
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate().map_err(ChunkerError::invalid_config)?;
        Ok(Self {
            config,
            classifier: Box::new(DefaultClassifier),
            registry: None,
        })
    }

    /// Builder: decide indentation discipline with `classifier`
    #[must_use]
    pub fn with_classifier(mut self, classifier: Box<dyn IndentationClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Builder: look custom extractors up in `registry` instead of the global one
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<ExtractorRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk code from a string.
    ///
    /// `source` is a path or id: it selects the language (for custom
    /// extractors and indentation discipline) and is copied into every chunk.
    /// A token counter is required when `max_tokens` is set.
    pub fn chunk_str(
        &self,
        text: &str,
        source: Option<&str>,
        counter: Option<&dyn TokenCounter>,
    ) -> Result<Vec<Chunk>> {
        if self.config.max_tokens.is_some() && counter.is_none() {
            return Err(ChunkerError::invalid_config(
                "max_tokens is set but no token counter was supplied",
            ));
        }
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let tagged = self.preprocessor().process(text);
        let blocks = self.blocks(text, &tagged, source)?;

        let mut assembler = ChunkAssembler::new(self.config.budget(), &tagged.lengths)
            .strict(self.config.strict)
            .with_source(source.unwrap_or("N/A"));
        if let Some(counter) = counter {
            assembler = assembler.with_counter(counter);
        }
        let chunks = assembler.assemble(&blocks)?;

        log::debug!(
            "{}: {} blocks -> {} chunks",
            source.unwrap_or("N/A"),
            blocks.len(),
            chunks.len()
        );
        Ok(chunks)
    }

    /// Chunk code from a file
    pub fn chunk_file(
        &self,
        path: impl AsRef<Path>,
        counter: Option<&dyn TokenCounter>,
    ) -> Result<Vec<Chunk>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let source = path.to_string_lossy();

        self.chunk_str(&content, Some(&source), counter)
    }

    /// Structural blocks of `text` with their namespace paths attached,
    /// before any budget is applied
    pub fn extract_blocks(&self, text: &str, path: Option<&str>) -> Result<Vec<StructuralBlock>> {
        let tagged = self.preprocessor().process(text);
        self.blocks(text, &tagged, path)
    }

    fn preprocessor(&self) -> Preprocessor {
        Preprocessor::new(self.config.include_comments, self.config.docstring_mode)
    }

    fn blocks(
        &self,
        text: &str,
        tagged: &TaggedSource,
        path: Option<&str>,
    ) -> Result<Vec<StructuralBlock>> {
        let mut blocks = match self.custom_blocks(text, path)? {
            Some(blocks) => blocks,
            None => {
                let discipline = self.classifier.classify(text, path);
                StructuralExtractor::new(discipline).extract(&tagged.lines)
            }
        };
        attach_namespaces(&mut blocks);
        Ok(blocks)
    }

    fn custom_blocks(&self, text: &str, path: Option<&str>) -> Result<Option<Vec<StructuralBlock>>> {
        let language = path.map_or(Language::Unknown, Language::from_path);
        if language == Language::Unknown {
            return Ok(None);
        }

        let extractor = match &self.registry {
            Some(registry) => registry.get(language.as_str()),
            None => ExtractorRegistry::global_snapshot().get(language.as_str()),
        };
        let Some(extractor) = extractor else {
            return Ok(None);
        };

        log::debug!("Using custom extractor for {}", language.as_str());
        extractor
            .extract(text)
            .map(Some)
            .map_err(|e| ChunkerError::CustomExtractor {
                language: language.as_str().to_string(),
                message: format!("{e:#}"),
            })
    }

    /// Get statistics about chunking
    #[must_use]
    pub fn get_stats(chunks: &[Chunk]) -> ChunkingStats {
        let lines = || chunks.iter().map(Chunk::line_count);
        let total_lines: usize = lines().sum();
        ChunkingStats {
            total_chunks: chunks.len(),
            total_lines,
            avg_lines_per_chunk: total_lines.checked_div(chunks.len()).unwrap_or(0),
            min_lines: lines().min().unwrap_or(0),
            max_lines: lines().max().unwrap_or(0),
        }
    }
}

/// Statistics about chunking results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingStats {
    pub total_chunks: usize,
    pub total_lines: usize,
    pub avg_lines_per_chunk: usize,
    pub min_lines: usize,
    pub max_lines: usize,
}

impl std::fmt::Display for ChunkingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunks: {} | Lines: {} | Avg: {} | Range: {}-{}",
            self.total_chunks,
            self.total_lines,
            self.avg_lines_per_chunk,
            self.min_lines,
            self.max_lines
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{FixedClassifier, IndentationDiscipline};
    use crate::token::WordCounter;

    const RUST_CODE: &str = r#"use std::collections::HashMap;

/// Main function
fn main() {
    println!("Hello, world!");
}

struct Point {
    x: i32,
    y: i32,
}

impl Point {
    fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}
"#;

    fn line_chunker(max_lines: usize) -> CodeChunker {
        CodeChunker::new(ChunkerConfig {
            max_lines: Some(max_lines),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_new_rejects_missing_budget() {
        let err = CodeChunker::new(ChunkerConfig::default()).err().unwrap();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn test_max_tokens_requires_counter() {
        let chunker = CodeChunker::new(ChunkerConfig::for_embeddings()).unwrap();
        let err = chunker.chunk_str(RUST_CODE, Some("main.rs"), None).unwrap_err();
        assert!(matches!(err, ChunkerError::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_content_yields_no_chunks() {
        let chunker = line_chunker(10);
        assert!(chunker.chunk_str("", Some("a.rs"), None).unwrap().is_empty());
        assert!(chunker.chunk_str(" \n\n\t\n", None, None).unwrap().is_empty());
    }

    #[test]
    fn test_chunk_str() {
        let chunker = line_chunker(8);
        let chunks = chunker.chunk_str(RUST_CODE, Some("test.rs"), None).unwrap();

        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|c| c.line_count() <= 8));
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks.last().unwrap().end_line, RUST_CODE.lines().count());
        assert!(chunks.iter().all(|c| c.source == "test.rs"));
    }

    #[test]
    fn test_extract_blocks() {
        let chunker = line_chunker(100);
        let blocks = chunker.extract_blocks(RUST_CODE, Some("test.rs")).unwrap();
        let signatures: Vec<_> = blocks
            .iter()
            .filter_map(|b| b.function_signature.as_deref())
            .collect();

        assert_eq!(signatures, vec!["fn main", "fn new"]);
        let new_fn = blocks.iter().find(|b| b.is_function() && b.head.contains("new")).unwrap();
        assert_eq!(new_fn.relations.scopes().collect::<Vec<_>>(), vec!["impl Point", "fn new"]);
    }

    #[test]
    fn test_token_budget_with_counter() {
        let chunker = CodeChunker::new(ChunkerConfig {
            max_tokens: Some(30),
            ..Default::default()
        })
        .unwrap();
        let chunks = chunker
            .chunk_str(RUST_CODE, Some("test.rs"), Some(&WordCounter))
            .unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(WordCounter::count(&chunk.content) <= 30, "{}", chunk.content);
        }
    }

    #[test]
    fn test_custom_extractor_from_owned_registry() {
        let mut registry = ExtractorRegistry::new();
        registry.register(
            "rust",
            Arc::new(|text: &str| -> anyhow::Result<Vec<StructuralBlock>> {
                Ok(vec![StructuralBlock::new(text.trim_end(), 1, text.lines().count())])
            }),
        );
        let chunker = line_chunker(100).with_registry(Arc::new(registry));

        let chunks = chunker.chunk_str(RUST_CODE, Some("lib.rs"), None).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, RUST_CODE.trim_end());
    }

    #[test]
    fn test_custom_extractor_failure_is_wrapped() {
        let mut registry = ExtractorRegistry::new();
        registry.register(
            "python",
            Arc::new(|_: &str| -> anyhow::Result<Vec<StructuralBlock>> {
                anyhow::bail!("grammar missing")
            }),
        );
        let chunker = line_chunker(100).with_registry(Arc::new(registry));

        let err = chunker.chunk_str("x = 1\n", Some("a.py"), None).unwrap_err();
        match err {
            ChunkerError::CustomExtractor { language, message } => {
                assert_eq!(language, "python");
                assert!(message.contains("grammar missing"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fixed_classifier_overrides_detection() {
        // a docstring above a function moves down only for brace discipline
        let code = "x = 1\n## Doc for f.\ndef f():\n    pass\n";
        let free = line_chunker(100)
            .with_classifier(Box::new(FixedClassifier(IndentationDiscipline::Free)))
            .extract_blocks(code, None)
            .unwrap();
        let significant = line_chunker(100)
            .with_classifier(Box::new(FixedClassifier(IndentationDiscipline::Significant)))
            .extract_blocks(code, None)
            .unwrap();

        assert_eq!((free[1].start_line, free[1].end_line), (2, 4));
        assert_eq!((significant[0].start_line, significant[0].end_line), (1, 2));
    }

    #[test]
    fn test_chunk_file_and_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("point.rs");
        std::fs::write(&path, RUST_CODE).unwrap();

        let chunker = line_chunker(8);
        let chunks = chunker.chunk_file(&path, None).unwrap();
        let stats = CodeChunker::get_stats(&chunks);

        assert_eq!(stats.total_chunks, chunks.len());
        assert_eq!(stats.total_lines, RUST_CODE.lines().count());
        assert!(stats.max_lines <= 8);
        assert!(stats.to_string().starts_with(&format!("Chunks: {}", chunks.len())));
        assert!(chunks[0].source.ends_with("point.rs"));

        let missing = chunker.chunk_file(dir.path().join("missing.rs"), None).unwrap_err();
        assert_eq!(missing.kind(), "io");
    }
}
