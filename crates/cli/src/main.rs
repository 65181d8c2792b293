use anyhow::{Context as AnyhowContext, Result};
use clap::{Parser, ValueEnum};
use scope_chunker::{
    CachedCounter, Chunk, ChunkerConfig, CodeChunker, DocstringMode, Language, WordCounter,
};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

mod report;

#[derive(Parser)]
#[command(name = "scope-chunk")]
#[command(about = "Split source files into budget-bounded, scope-aware chunks", long_about = None)]
#[command(version)]
struct Cli {
    /// Files or directories to chunk
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// TOML file with chunker settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum tokens per chunk (word-boundary token count)
    #[arg(long)]
    max_tokens: Option<usize>,

    /// Maximum lines per chunk
    #[arg(long)]
    max_lines: Option<usize>,

    /// Maximum functions per chunk
    #[arg(long)]
    max_functions: Option<usize>,

    /// Fail on blocks that cannot fit instead of splitting them
    #[arg(long)]
    strict: bool,

    /// Drop comments from chunk content
    #[arg(long)]
    no_comments: bool,

    /// Docstring handling: all, summary or excluded
    #[arg(long, value_name = "MODE")]
    docstrings: Option<DocstringMode>,

    /// What to do when one file fails
    #[arg(long, value_enum, default_value_t = OnError::Raise)]
    on_error: OnError,

    /// Print chunks as one JSON array
    #[arg(long)]
    json: bool,

    /// Print chunk statistics
    #[arg(long)]
    stats: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long)]
    quiet: bool,
}

/// Per-file error policy
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OnError {
    /// Stop at the first failure and exit non-zero
    Raise,
    /// Report the failure and continue with the next file
    Skip,
    /// Report the failure and keep what was chunked so far
    Break,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(&cli)?;
    let chunker = match CodeChunker::new(config) {
        Ok(chunker) => chunker,
        Err(e) => {
            eprintln!("hint: {}", e.hint());
            return Err(e).context("invalid chunker configuration");
        }
    };

    let files = collect_files(&cli.paths);
    log::debug!("Chunking {} files", files.len());

    let counter = CachedCounter::new(WordCounter);
    let mut chunks: Vec<Chunk> = Vec::new();
    for file in &files {
        match chunker.chunk_file(file, Some(&counter)) {
            Ok(file_chunks) => chunks.extend(file_chunks),
            Err(e) => {
                eprintln!("error: {}: {e}", file.display());
                eprintln!("hint: {}", e.hint());
                match cli.on_error {
                    OnError::Raise => {
                        return Err(e).with_context(|| format!("failed to chunk {}", file.display()));
                    }
                    OnError::Skip => {
                        log::warn!("Skipping {}", file.display());
                    }
                    OnError::Break => {
                        log::warn!("Stopping at {}, keeping earlier results", file.display());
                        break;
                    }
                }
            }
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
    } else {
        print!("{}", report::render_chunks(&chunks));
    }

    if cli.stats {
        let stats = CodeChunker::get_stats(&chunks);
        if cli.json {
            eprintln!("{stats}");
        } else {
            println!("{stats}");
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<ChunkerConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            toml::from_str::<ChunkerConfig>(&raw)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => ChunkerConfig::default(),
    };

    if cli.max_tokens.is_some() {
        config.max_tokens = cli.max_tokens;
    }
    if cli.max_lines.is_some() {
        config.max_lines = cli.max_lines;
    }
    if cli.max_functions.is_some() {
        config.max_functions = cli.max_functions;
    }
    if cli.strict {
        config.strict = true;
    }
    if cli.no_comments {
        config.include_comments = false;
    }
    if let Some(mode) = cli.docstrings {
        config.docstring_mode = mode;
    }

    Ok(config)
}

/// Explicit files are taken as-is; directories contribute the files whose
/// language is recognised, skipping hidden entries.
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.path()))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| Language::from_path(path) != Language::Unknown)
            .collect();
        found.sort();
        files.extend(found);
    }
    files
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}
