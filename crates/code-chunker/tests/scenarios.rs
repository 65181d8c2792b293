use pretty_assertions::assert_eq;
use scope_chunker::{
    BudgetDimension, Chunk, ChunkerConfig, ChunkerError, CodeChunker, DocstringMode, WordCounter,
};

fn whitespace_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

fn chunk(config: ChunkerConfig, code: &str, path: &str) -> Vec<Chunk> {
    let counter = whitespace_tokens;
    CodeChunker::new(config)
        .expect("valid config")
        .chunk_str(code, Some(path), Some(&counter))
        .expect("chunking failed")
}

#[test]
fn one_function_per_chunk() {
    let code = "def f():\n    pass\n\ndef g():\n    pass\n";
    let config = ChunkerConfig {
        max_functions: Some(1),
        ..Default::default()
    };

    let chunks = chunk(config, code, "funcs.py");

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].content, "def f():\n    pass\n");
    assert_eq!(chunks[1].content, "def g():\n    pass");
    assert_eq!((chunks[0].chunk_num, chunks[1].chunk_num), (1, 2));
    assert_eq!(chunks[0].tree, "global\n└─ def f");
    assert_eq!(chunks[1].tree, "global\n└─ def g");
}

const GREETER: &str = r#"class Greeter:
    def hello(self, name):
        message = "hello " + name
        return message

    def bye(self, name):
        message = "bye " + name
        return message

    def wave(self):
        return "wave"
"#;

#[test]
fn split_class_repeats_header_with_continuation_marker() {
    let config = ChunkerConfig {
        max_tokens: Some(15),
        ..Default::default()
    };

    let chunks = chunk(config, GREETER, "greeter.py");
    let ranges: Vec<_> = chunks.iter().map(|c| (c.start_line, c.end_line)).collect();

    assert_eq!(ranges, vec![(1, 5), (6, 9), (10, 11)]);
    assert!(chunks[0].content.starts_with("class Greeter:\n    def hello"));
    assert!(chunks[1]
        .content
        .starts_with("class Greeter:\n    ...\n    def bye(self, name):"));
    assert!(chunks[2]
        .content
        .starts_with("class Greeter:\n    ...\n    def wave(self):"));
    assert_eq!(chunks[1].tree, "global\n└─ class Greeter\n   └─ def bye");

    for chunk in &chunks {
        assert!(whitespace_tokens(&chunk.content) <= 15);
    }
}

#[test]
fn continuation_header_does_not_move_spans() {
    let config = ChunkerConfig {
        max_tokens: Some(15),
        ..Default::default()
    };

    let chunks = chunk(config, GREETER, "greeter.py");
    let bye = &chunks[1];

    let original = bye.source_text(GREETER).unwrap();
    assert!(original.starts_with("    def bye(self, name):"));
    assert!(!original.contains("..."));
}

const C_SOURCE: &str = "int a = 1;\n/*\n * block comment\n */\nint main() {\n    return a;\n}\n";

#[test]
fn excluded_comments_keep_downstream_line_numbers() {
    let with_comments = chunk(
        ChunkerConfig {
            max_lines: Some(4),
            ..Default::default()
        },
        C_SOURCE,
        "main.c",
    );
    let without_comments = chunk(
        ChunkerConfig {
            max_lines: Some(4),
            include_comments: false,
            ..Default::default()
        },
        C_SOURCE,
        "main.c",
    );

    let ranges = |chunks: &[Chunk]| -> Vec<(usize, usize)> {
        chunks.iter().map(|c| (c.start_line, c.end_line)).collect()
    };
    assert_eq!(ranges(&with_comments), vec![(1, 4), (5, 7)]);
    assert_eq!(ranges(&without_comments), ranges(&with_comments));

    assert!(with_comments[0].content.contains("block comment"));
    assert!(!without_comments[0].content.contains("block comment"));
    assert!(!without_comments[0].content.contains("/*"));
    assert_eq!(without_comments[1].content, with_comments[1].content);
}

#[test]
fn excluded_comments_work_on_crlf_sources() {
    let crlf = C_SOURCE.replace('\n', "\r\n");
    let config = || ChunkerConfig {
        max_lines: Some(4),
        include_comments: false,
        ..Default::default()
    };

    let lf_chunks = chunk(config(), C_SOURCE, "main.c");
    let crlf_chunks = chunk(config(), &crlf, "main.c");

    let ranges = |chunks: &[Chunk]| -> Vec<(usize, usize)> {
        chunks.iter().map(|c| (c.start_line, c.end_line)).collect()
    };
    assert_eq!(ranges(&crlf_chunks), ranges(&lf_chunks));
    assert!(!crlf_chunks[0].content.contains("block comment"));
    assert_eq!(crlf_chunks[0].content, lf_chunks[0].content);
    assert_eq!(
        crlf_chunks[1].source_text(&crlf),
        Some("int main() {\r\n    return a;\r\n}\r\n")
    );
}

const DOCUMENTED: &str = r#"def load(path):
    """Load a file.

    Details
    more details.
    """
    return open(path).read()
"#;

#[test]
fn docstring_summary_keeps_block_extent() {
    let full = chunk(
        ChunkerConfig {
            max_lines: Some(50),
            ..Default::default()
        },
        DOCUMENTED,
        "load.py",
    );
    let summary = chunk(
        ChunkerConfig {
            max_lines: Some(50),
            docstring_mode: DocstringMode::Summary,
            ..Default::default()
        },
        DOCUMENTED,
        "load.py",
    );

    assert_eq!(full.len(), 1);
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].end_line, full[0].end_line);
    assert_eq!(summary[0].end_line, 7);

    let visible = |chunk: &Chunk| chunk.content.lines().filter(|l| !l.trim().is_empty()).count();
    assert_eq!(visible(&full[0]), 6);
    assert_eq!(visible(&summary[0]), 3);
    assert!(summary[0].content.contains("    \"\"\"Load a file.\"\"\""));
    assert!(!summary[0].content.contains("Details"));
}

#[test]
fn docstring_modes_work_on_crlf_sources() {
    let crlf = DOCUMENTED.replace('\n', "\r\n");
    let config = |docstring_mode| ChunkerConfig {
        max_lines: Some(50),
        docstring_mode,
        ..Default::default()
    };

    let summary = chunk(config(DocstringMode::Summary), &crlf, "load.py");
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].end_line, 7);
    assert!(summary[0].content.contains("    \"\"\"Load a file.\"\"\""));
    assert!(!summary[0].content.contains("Details"));
    assert_eq!(
        summary[0].content,
        chunk(config(DocstringMode::Summary), DOCUMENTED, "load.py")[0].content
    );

    let excluded = chunk(config(DocstringMode::Excluded), &crlf, "load.py");
    assert!(!excluded[0].content.contains("Load a file."));
    assert!(excluded[0].content.contains("return open(path).read()"));
}

#[test]
fn lenient_split_keeps_docstring_whole() {
    let code = "def load(path):\n    \"\"\"Load a file.\n\n    Details.\n    \"\"\"\n    data = open(path).read()\n    return data\n";
    let chunks = chunk(
        ChunkerConfig {
            max_lines: Some(4),
            ..Default::default()
        },
        code,
        "load.py",
    );

    let ranges: Vec<_> = chunks.iter().map(|c| (c.start_line, c.end_line)).collect();
    assert_eq!(ranges, vec![(1, 1), (2, 5), (6, 7)]);
    assert_eq!(
        chunks[1].content,
        "    \"\"\"Load a file.\n\n    Details.\n    \"\"\""
    );
}

fn oversized_function() -> String {
    let mut code = String::from("fn big() {\n");
    for i in 0..20 {
        code.push_str(&format!("    let value_{i} = compute({i});\n"));
    }
    code.push_str("}\n");
    code
}

#[test]
fn strict_mode_rejects_oversized_function() {
    let code = oversized_function();
    let chunker = CodeChunker::new(ChunkerConfig {
        max_tokens: Some(20),
        strict: true,
        ..Default::default()
    })
    .unwrap();

    let err = chunker
        .chunk_str(&code, Some("big.rs"), Some(&WordCounter))
        .unwrap_err();

    match &err {
        ChunkerError::BudgetExceeded {
            start_line,
            end_line,
            overflows,
        } => {
            assert_eq!((*start_line, *end_line), (1, 22));
            assert_eq!(overflows.len(), 1);
            assert_eq!(overflows[0].dimension, BudgetDimension::Tokens);
            assert_eq!(overflows[0].allowed, 20);
            assert!(overflows[0].measured > 20);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.hint().contains("max_tokens"));
}

#[test]
fn lenient_mode_splits_oversized_function_in_order() {
    let code = oversized_function();
    let chunker = CodeChunker::new(ChunkerConfig {
        max_tokens: Some(20),
        ..Default::default()
    })
    .unwrap();

    let chunks = chunker
        .chunk_str(&code, Some("big.rs"), Some(&WordCounter))
        .unwrap();

    assert!(chunks.len() >= 2);
    assert_eq!(chunks[0].start_line, 1);
    assert_eq!(chunks.last().unwrap().end_line, 22);
    for pair in chunks.windows(2) {
        assert_eq!(pair[1].start_line, pair[0].end_line + 1);
        assert_eq!(pair[1].chunk_num, pair[0].chunk_num + 1);
    }
    for chunk in &chunks {
        assert!(WordCounter::count(&chunk.content) <= 20, "{}", chunk.content);
        assert_eq!(chunk.tree, "global\n└─ fn big");
    }
}
