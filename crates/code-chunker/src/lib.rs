//! # Scope Chunker
//!
//! Convention-based, multi-language code chunking for LLM context and
//! indexing.
//!
//! ## Philosophy
//!
//! No grammar is required. Structure is inferred from what most languages
//! share:
//! - Indentation and bare delimiter lines close blocks
//! - Anchored declaration patterns open them (functions, classes, modules)
//! - Comments, docstrings and decorators stay with the code they describe
//! - Chunks respect caller budgets (tokens, lines, functions)
//!
//! ## Architecture
//!
//! ```text
//! Source Code
//!     │
//!     ├──> Preprocessor
//!     │    └─> Tag comments / docstrings / decorators / strings per line
//!     │
//!     ├──> Structural Extractor (indentation discipline resolved once)
//!     │    └─> Ordered StructuralBlock[] (functions, namespaces, statements)
//!     │
//!     ├──> Namespace Tree Builder
//!     │    └─> global → class → method relation paths
//!     │
//!     └──> Chunk Assembler
//!          ├─> Greedy packing under budgets
//!          ├─> Continuation headers for split namespaces
//!          └─> Line-wise split of oversized blocks
//! ```
//!
//! ## Example
//!
//! ```rust
//! use scope_chunker::{ChunkerConfig, CodeChunker};
//!
//! let config = ChunkerConfig {
//!     max_functions: Some(1),
//!     ..Default::default()
//! };
//! let chunker = CodeChunker::new(config).unwrap();
//!
//! let code = "def f():\n    pass\n\ndef g():\n    pass\n";
//! let chunks = chunker.chunk_str(code, Some("example.py"), None).unwrap();
//!
//! assert_eq!(chunks.len(), 2);
//! for chunk in chunks {
//!     println!("#{} lines {}-{}\n{}", chunk.chunk_num, chunk.start_line, chunk.end_line, chunk.tree);
//! }
//! ```

mod assembler;
mod chunker;
mod config;
mod error;
mod extractor;
mod language;
mod namespace;
pub mod patterns;
mod preprocess;
mod registry;
mod token;
mod types;

pub use assembler::ChunkAssembler;
pub use chunker::{ChunkingStats, CodeChunker};
pub use config::{Budget, ChunkerConfig, DocstringMode};
pub use error::{BudgetDimension, BudgetOverflow, ChunkerError, Result, PREVIEW_CHARS};
pub use extractor::StructuralExtractor;
pub use language::{
    DefaultClassifier, ExtensionClassifier, FixedClassifier, IndentationClassifier,
    IndentationDiscipline, Language, ParseClassifier,
};
pub use namespace::{attach_namespaces, render_tree, ROOT};
pub use preprocess::{Preprocessor, TaggedSource};
pub use registry::{BlockExtractor, ExtractorRegistry};
pub use token::{CachedCounter, FallibleCounter, TokenCounter, WordCounter};
pub use types::{Chunk, LengthTable, NamespaceRelation, RawLine, StructuralBlock, Tag, TaggedLine};
