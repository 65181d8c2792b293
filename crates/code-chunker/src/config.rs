use serde::{Deserialize, Serialize};

/// Configuration for code chunking behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Maximum tokens per chunk (requires a token counter)
    pub max_tokens: Option<usize>,

    /// Maximum lines per chunk
    pub max_lines: Option<usize>,

    /// Maximum functions per chunk
    pub max_functions: Option<usize>,

    /// Keep comments (tagged) instead of blanking them out
    pub include_comments: bool,

    /// How docstrings are carried into chunks
    pub docstring_mode: DocstringMode,

    /// Fail instead of splitting a block that cannot fit any chunk
    pub strict: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: None,
            max_lines: None,
            max_functions: None,
            include_comments: true,
            docstring_mode: DocstringMode::All,
            strict: false,
        }
    }
}

impl ChunkerConfig {
    /// Create config optimized for embeddings (small, focused chunks)
    pub fn for_embeddings() -> Self {
        Self {
            max_tokens: Some(512),
            docstring_mode: DocstringMode::Summary,
            ..Default::default()
        }
    }

    /// Create config optimized for LLM context (larger, comprehensive chunks)
    pub fn for_llm_context() -> Self {
        Self {
            max_tokens: Some(2048),
            ..Default::default()
        }
    }

    /// Create config optimized for speed (no token counting at all)
    pub fn for_speed() -> Self {
        Self {
            max_lines: Some(200),
            include_comments: false,
            docstring_mode: DocstringMode::Excluded,
            ..Default::default()
        }
    }

    /// Budgets derived from this config
    #[must_use]
    pub const fn budget(&self) -> Budget {
        Budget {
            max_tokens: self.max_tokens,
            max_lines: self.max_lines,
            max_functions: self.max_functions,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let budget = self.budget();
        if !budget.is_set() {
            return Err(
                "at least one of max_tokens, max_lines or max_functions must be set".to_string(),
            );
        }

        for (name, value) in budget.entries() {
            if value == Some(0) {
                return Err(format!("{name} must be > 0"));
            }
        }

        Ok(())
    }
}

/// How docstrings survive preprocessing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocstringMode {
    /// Keep docstrings verbatim
    #[default]
    All,
    /// Keep only the first meaningful line, padding the rest with blank lines
    Summary,
    /// Blank docstrings out entirely (line numbers survive)
    Excluded,
}

impl DocstringMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Summary => "summary",
            Self::Excluded => "excluded",
        }
    }
}

impl std::str::FromStr for DocstringMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "summary" => Ok(Self::Summary),
            "excluded" => Ok(Self::Excluded),
            other => Err(format!(
                "unknown docstring mode '{other}' (expected all, summary or excluded)"
            )),
        }
    }
}

/// Per-chunk ceilings; unset dimensions are unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Budget {
    pub max_tokens: Option<usize>,
    pub max_lines: Option<usize>,
    pub max_functions: Option<usize>,
}

impl Budget {
    /// At least one dimension is bounded
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.max_tokens.is_some() || self.max_lines.is_some() || self.max_functions.is_some()
    }

    fn entries(&self) -> [(&'static str, Option<usize>); 3] {
        [
            ("max_tokens", self.max_tokens),
            ("max_lines", self.max_lines),
            ("max_functions", self.max_functions),
        ]
    }
}
