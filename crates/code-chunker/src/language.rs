use std::path::Path;
use tree_sitter::Parser;

/// Programming language, as far as file extensions tell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    Java,
    C,
    Cpp,
    CSharp,
    Ruby,
    Swift,
    Kotlin,
    Haskell,
    Lua,
    Shell,
    Unknown,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Language::Rust,
            "py" | "pyw" | "pyi" => Language::Python,
            "js" | "mjs" | "cjs" | "jsx" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "go" => Language::Go,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "cs" => Language::CSharp,
            "rb" => Language::Ruby,
            "swift" => Language::Swift,
            "kt" | "kts" => Language::Kotlin,
            "hs" => Language::Haskell,
            "lua" => Language::Lua,
            "sh" | "bash" | "zsh" => Language::Shell,
            _ => Language::Unknown,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Get language name as string
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Ruby => "ruby",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Haskell => "haskell",
            Language::Lua => "lua",
            Language::Shell => "shell",
            Language::Unknown => "unknown",
        }
    }

    /// Indentation discipline implied by the language, if it is known
    pub fn indentation(self) -> Option<IndentationDiscipline> {
        match self {
            Language::Python | Language::Haskell => Some(IndentationDiscipline::Significant),
            Language::Unknown => None,
            _ => Some(IndentationDiscipline::Free),
        }
    }

    /// Tree-sitter grammar, for the languages the parse heuristic knows
    pub fn tree_sitter_language(self) -> Option<tree_sitter::Language> {
        match self {
            Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            _ => None,
        }
    }
}

/// Whether block structure is carried by indentation or by delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndentationDiscipline {
    /// Indentation is syntax (Python and friends)
    Significant,
    /// Braces/keywords delimit blocks; indentation is cosmetic
    Free,
}

/// Decides the indentation discipline of one source, once, before scanning
pub trait IndentationClassifier: Send + Sync {
    fn classify(&self, text: &str, path: Option<&str>) -> IndentationDiscipline;
}

/// Extensions whose languages the [`Language`] enum does not cover
const SIGNIFICANT_EXTENSIONS: &[&str] = &["nim", "coffee", "pug", "sass", "fs", "fsx", "yaml", "yml"];

/// Classifies by file extension alone
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionClassifier;

impl ExtensionClassifier {
    pub fn detect(path: &str) -> Option<IndentationDiscipline> {
        let ext = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())?
            .to_lowercase();
        if SIGNIFICANT_EXTENSIONS.contains(&ext.as_str()) {
            return Some(IndentationDiscipline::Significant);
        }
        Language::from_extension(&ext).indentation()
    }
}

impl IndentationClassifier for ExtensionClassifier {
    fn classify(&self, _text: &str, path: Option<&str>) -> IndentationDiscipline {
        path.and_then(Self::detect)
            .unwrap_or(IndentationDiscipline::Free)
    }
}

/// Classifies by trying grammars: a source that parses cleanly as Python
/// but not as any brace language is indentation-significant.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseClassifier;

impl ParseClassifier {
    fn parses_cleanly(text: &str, language: Language) -> bool {
        let Some(grammar) = language.tree_sitter_language() else {
            return false;
        };
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&grammar) {
            log::debug!("Grammar for {} unavailable: {e}", language.as_str());
            return false;
        }
        parser
            .parse(text, None)
            .is_some_and(|tree| !tree.root_node().has_error())
    }

    /// Lexical fallback for sources every grammar accepts (e.g. `x = 1`)
    fn has_colon_blocks(text: &str) -> bool {
        const BLOCK_KEYWORDS: &[&str] = &[
            "def ", "class ", "if ", "elif ", "else", "for ", "while ", "with ", "try", "except",
            "finally", "async def ",
        ];
        text.lines().map(str::trim).any(|line| {
            line.ends_with(':') && BLOCK_KEYWORDS.iter().any(|kw| line.starts_with(kw))
        })
    }
}

impl IndentationClassifier for ParseClassifier {
    fn classify(&self, text: &str, _path: Option<&str>) -> IndentationDiscipline {
        if !Self::parses_cleanly(text, Language::Python) {
            return IndentationDiscipline::Free;
        }

        let brace_language = [Language::Rust, Language::JavaScript, Language::TypeScript]
            .into_iter()
            .any(|language| Self::parses_cleanly(text, language));
        if !brace_language || Self::has_colon_blocks(text) {
            IndentationDiscipline::Significant
        } else {
            IndentationDiscipline::Free
        }
    }
}

/// Extension first, grammar heuristic when the extension says nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl IndentationClassifier for DefaultClassifier {
    fn classify(&self, text: &str, path: Option<&str>) -> IndentationDiscipline {
        if let Some(discipline) = path.and_then(ExtensionClassifier::detect) {
            return discipline;
        }
        ParseClassifier.classify(text, path)
    }
}

/// Always answers the same; handy when the caller already knows
#[derive(Debug, Clone, Copy)]
pub struct FixedClassifier(pub IndentationDiscipline);

impl IndentationClassifier for FixedClassifier {
    fn classify(&self, _text: &str, _path: Option<&str>) -> IndentationDiscipline {
        self.0
    }
}
