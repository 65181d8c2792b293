use std::fmt;
use thiserror::Error;

/// Result type for chunker operations
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Number of characters of offending text kept when a token counter fails
pub const PREVIEW_CHARS: usize = 100;

/// Errors that can occur during code chunking
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// Invalid configuration (no budget, zero budget, missing token counter)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A single block cannot fit the budget and strict mode forbids splitting it
    #[error(
        "Block at lines {start_line}-{end_line} exceeds the chunk budget: {}",
        join_overflows(.overflows)
    )]
    BudgetExceeded {
        start_line: usize,
        end_line: usize,
        overflows: Vec<BudgetOverflow>,
    },

    /// The caller-supplied token counter failed
    #[error("Token counter failed on text starting with {preview:?}: {source}")]
    TokenCounter {
        preview: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// A registered custom block extractor failed
    #[error("Custom extractor for '{language}' failed: {message}")]
    CustomExtractor { language: String, message: String },

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ChunkerError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Wrap a token counter failure, keeping only a short prefix of the text
    pub fn token_counter(text: &str, cause: anyhow::Error) -> Self {
        Self::TokenCounter {
            preview: text.chars().take(PREVIEW_CHARS).collect(),
            source: cause.into(),
        }
    }

    /// Short, stable name of the error kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "configuration",
            Self::BudgetExceeded { .. } => "budget_exceeded",
            Self::TokenCounter { .. } => "callback_failure",
            Self::CustomExtractor { .. } => "custom_extractor",
            Self::IoError(_) => "io",
        }
    }

    /// Human hint shown next to the error by adapters
    #[must_use]
    pub fn hint(&self) -> String {
        match self {
            Self::InvalidConfig(_) => {
                "Set at least one of max_tokens, max_lines or max_functions; \
                 max_tokens also needs a token counter."
                    .to_string()
            }
            Self::BudgetExceeded { overflows, .. } => {
                let dims: Vec<&str> = overflows.iter().map(|o| o.dimension.as_str()).collect();
                format!(
                    "Raise {} or disable strict mode to let oversized blocks be split.",
                    dims.join(" / ")
                )
            }
            Self::TokenCounter { .. } => {
                "Check the token counter: it must accept any text and return a count.".to_string()
            }
            Self::CustomExtractor { language, .. } => format!(
                "Unregister the custom extractor for '{language}' to fall back to the built-in scanner."
            ),
            Self::IoError(_) => "Make sure the source exists and is readable UTF-8 text.".to_string(),
        }
    }
}

/// Budget dimension enforced by the assembler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetDimension {
    Tokens,
    Lines,
    Functions,
}

impl BudgetDimension {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tokens => "max_tokens",
            Self::Lines => "max_lines",
            Self::Functions => "max_functions",
        }
    }
}

/// One exceeded budget dimension: what was measured vs. what is allowed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetOverflow {
    pub dimension: BudgetDimension,
    pub measured: usize,
    pub allowed: usize,
}

impl BudgetOverflow {
    /// How far the measured value is over the limit
    #[must_use]
    pub const fn excess(&self) -> usize {
        self.measured.saturating_sub(self.allowed)
    }
}

impl fmt::Display for BudgetOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} exceeded by {} ({} > {})",
            self.dimension.as_str(),
            self.excess(),
            self.measured,
            self.allowed
        )
    }
}

fn join_overflows(overflows: &[BudgetOverflow]) -> String {
    overflows
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
