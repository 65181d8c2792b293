use serde::{Deserialize, Serialize};

/// Role of an annotated line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tag {
    Comment,
    Docstring,
    Metadata,
    String,
}

impl Tag {
    pub const ALL: [Self; 4] = [Self::Comment, Self::Docstring, Self::Metadata, Self::String];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "COMMENT",
            Self::Docstring => "DOCSTRING",
            Self::Metadata => "METADATA",
            Self::String => "STRING",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Comment => 0,
            Self::Docstring => 1,
            Self::Metadata => 2,
            Self::String => 3,
        }
    }
}

/// One line of preprocessed source, optionally tagged with its role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedLine {
    pub text: String,
    pub tag: Option<Tag>,
}

impl TaggedLine {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tag: None,
        }
    }

    pub fn tagged(text: impl Into<String>, tag: Tag) -> Self {
        Self {
            text: text.into(),
            tag: Some(tag),
        }
    }
}

/// A scanned line before it is assigned to a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// 1-indexed line number in the original source
    pub line_number: usize,
    pub content: String,
    pub indent_level: usize,
    /// Declaration fragment when the line is a function anchor
    pub function_signature: Option<String>,
    /// Preprocessor tag, `None` for plain code
    pub tag: Option<Tag>,
}

impl RawLine {
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Prefix sums of per-line byte lengths (terminators included) of the
/// original, untouched source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LengthTable {
    ends: Vec<usize>,
}

impl LengthTable {
    pub fn from_source(text: &str) -> Self {
        let mut total = 0;
        let ends = text
            .split_inclusive('\n')
            .map(|line| {
                total += line.len();
                total
            })
            .collect();
        Self { ends }
    }

    /// Number of lines in the source
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.ends.len()
    }

    /// Byte range covering lines `start_line..=end_line` (1-indexed)
    #[must_use]
    pub fn span(&self, start_line: usize, end_line: usize) -> (usize, usize) {
        let start = start_line
            .checked_sub(2)
            .and_then(|idx| self.ends.get(idx))
            .copied()
            .unwrap_or(0);
        let end = end_line
            .checked_sub(1)
            .and_then(|idx| self.ends.get(idx))
            .or_else(|| self.ends.last())
            .copied()
            .unwrap_or(0);
        (start, end.max(start))
    }
}

/// Scope path of a block as `(parent, child)` pairs from the global root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespaceRelation {
    pairs: Vec<(String, String)>,
}

impl NamespaceRelation {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Build from a root-to-leaf label path
    pub fn from_path<S: AsRef<str>>(path: &[S]) -> Self {
        let pairs = path
            .windows(2)
            .map(|w| (w[0].as_ref().to_string(), w[1].as_ref().to_string()))
            .collect();
        Self { pairs }
    }

    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Block sits directly in the global scope
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Labels below the root, outermost first
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(_, child)| child.as_str())
    }

    /// Innermost scope label
    #[must_use]
    pub fn leaf(&self) -> Option<&str> {
        self.pairs.last().map(|(_, child)| child.as_str())
    }
}

/// A contiguous run of lines forming one function, namespace header or
/// statement run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralBlock {
    pub content: String,
    pub indent_level: usize,
    /// 1-indexed, inclusive
    pub start_line: usize,
    /// 1-indexed, inclusive
    pub end_line: usize,
    pub function_signature: Option<String>,
    pub relations: NamespaceRelation,
    /// First non-blank code line; what namespace detection looks at
    pub head: String,
    /// Declaration lines of the enclosing namespaces, outermost first
    pub enclosing_headers: Vec<String>,
    /// Multi-line tagged runs (docstrings, comments, string literals) as
    /// 1-indexed inclusive line ranges, ascending. A line-wise split keeps
    /// each run whole when it fits on its own.
    pub tagged_runs: Vec<(usize, usize)>,
}

impl StructuralBlock {
    /// Create a block in the global scope
    pub fn new(content: impl Into<String>, start_line: usize, end_line: usize) -> Self {
        let content = content.into();
        let head = content
            .lines()
            .find(|line| !line.trim().is_empty())
            .unwrap_or_default()
            .to_string();
        let indent_level = crate::patterns::indent_width(&head);
        Self {
            content,
            indent_level,
            start_line,
            end_line: end_line.max(start_line),
            function_signature: None,
            relations: NamespaceRelation::default(),
            head,
            enclosing_headers: Vec::new(),
            tagged_runs: Vec::new(),
        }
    }

    /// Builder: set function signature fragment
    #[must_use]
    pub fn with_function_signature(mut self, signature: impl Into<String>) -> Self {
        self.function_signature = Some(signature.into());
        self
    }

    /// Builder: set indent level
    #[must_use]
    pub const fn with_indent(mut self, indent_level: usize) -> Self {
        self.indent_level = indent_level;
        self
    }

    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    #[must_use]
    pub const fn is_function(&self) -> bool {
        self.function_signature.is_some()
    }

    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// A caller-facing, budget-bounded piece of source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,

    /// 1-indexed emission order
    pub chunk_num: usize,

    /// Rendered namespace tree of every block in the chunk
    pub tree: String,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,

    /// Byte range of `start_line..=end_line` in the original source
    pub span: (usize, usize),

    /// Source path or id, `"N/A"` when unknown
    pub source: String,
}

impl Chunk {
    /// Get the number of lines in this chunk
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Check if chunk contains a specific line
    #[must_use]
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    /// Slice of the original source this chunk covers
    #[must_use]
    pub fn source_text<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.span.0..self.span.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_table_span() {
        let source = "ab\ncde\n\nf";
        let table = LengthTable::from_source(source);

        assert_eq!(table.line_count(), 4);
        assert_eq!(table.span(1, 1), (0, 3));
        assert_eq!(table.span(2, 3), (3, 8));
        assert_eq!(&source[table.span(2, 4).0..table.span(2, 4).1], "cde\n\nf");
    }

    #[test]
    fn test_relation_from_path() {
        let relation = NamespaceRelation::from_path(&["global", "class A", "def run"]);
        assert_eq!(
            relation.pairs(),
            &[
                ("global".to_string(), "class A".to_string()),
                ("class A".to_string(), "def run".to_string()),
            ]
        );
        assert_eq!(relation.leaf(), Some("def run"));
        assert!(NamespaceRelation::from_path(&["global"]).is_global());
    }

    #[test]
    fn test_block_head_and_indent() {
        let block = StructuralBlock::new("\n    def run(self):\n        pass", 4, 6)
            .with_function_signature("def run");
        assert_eq!(block.head, "    def run(self):");
        assert_eq!(block.indent_level, 4);
        assert_eq!(block.line_count(), 3);
        assert!(block.is_function());
    }

    #[test]
    fn test_chunk_contains_line() {
        let chunk = Chunk {
            content: "code".to_string(),
            chunk_num: 1,
            tree: "global".to_string(),
            start_line: 10,
            end_line: 15,
            span: (0, 4),
            source: "N/A".to_string(),
        };
        assert_eq!(chunk.line_count(), 6);
        assert!(chunk.contains_line(10));
        assert!(chunk.contains_line(15));
        assert!(!chunk.contains_line(9));
        assert!(!chunk.contains_line(16));
        assert_eq!(chunk.source_text("code and more"), Some("code"));
    }

    #[test]
    fn test_chunk_serializes_span_as_pair() {
        let chunk = Chunk {
            content: "x = 1".to_string(),
            chunk_num: 2,
            tree: "global".to_string(),
            start_line: 3,
            end_line: 3,
            span: (12, 18),
            source: "a.py".to_string(),
        };
        let value = serde_json::to_value(&chunk).unwrap();
        assert_eq!(value["span"], serde_json::json!([12, 18]));
        assert_eq!(value["chunk_num"], 2);

        let back: Chunk = serde_json::from_value(value).unwrap();
        assert_eq!(back, chunk);
    }
}
