//! Comment/docstring handling ahead of structural scanning.
//!
//! The preprocessor never adds or removes lines. Spans are blanked,
//! summarized or tagged in place so line numbers stay those of the
//! original source.

use crate::config::DocstringMode;
use crate::patterns::{self, docstring_parts};
use crate::types::{LengthTable, Tag, TaggedLine};
use regex::Regex;

/// Preprocessed source: one tagged line per original line, plus the
/// length table of the untouched text
#[derive(Debug, Clone, Default)]
pub struct TaggedSource {
    pub lines: Vec<TaggedLine>,
    pub lengths: LengthTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanKind {
    DelimitedDocstring,
    PrefixedDocstring,
    BlockComment,
    LineComment,
    Metadata,
    MultiLineString,
}

#[derive(Debug, Clone, Copy)]
struct Span {
    kind: SpanKind,
    start: usize,
    end: usize,
    /// 0-based
    first_line: usize,
    /// 0-based, inclusive
    last_line: usize,
}

/// Tie-break order when two patterns match at the same offset
fn scanners() -> [(&'static Regex, SpanKind); 6] {
    [
        (&patterns::DOCSTRING_STYLE_ONE, SpanKind::DelimitedDocstring),
        (&patterns::DOCSTRING_STYLE_TWO, SpanKind::PrefixedDocstring),
        (&patterns::MULTI_LINE_COMMENT, SpanKind::BlockComment),
        (&patterns::SINGLE_LINE_COMMENT, SpanKind::LineComment),
        (&patterns::METADATA, SpanKind::Metadata),
        (&patterns::MULTI_LINE_STRING, SpanKind::MultiLineString),
    ]
}

/// Applies the comment and docstring policies and tags what survives
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    include_comments: bool,
    docstring_mode: DocstringMode,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(true, DocstringMode::All)
    }
}

impl Preprocessor {
    pub const fn new(include_comments: bool, docstring_mode: DocstringMode) -> Self {
        Self {
            include_comments,
            docstring_mode,
        }
    }

    pub fn process(&self, text: &str) -> TaggedSource {
        let lengths = LengthTable::from_source(text);
        let line_starts = line_starts(text);

        let mut lines: Vec<TaggedLine> = text
            .split_inclusive('\n')
            .map(|line| TaggedLine::plain(strip_terminator(line)))
            .collect();

        for span in merge_prefixed_runs(scan_spans(text, &line_starts)) {
            self.apply(span, text, &mut lines);
        }

        TaggedSource { lines, lengths }
    }

    fn apply(&self, span: Span, text: &str, lines: &mut [TaggedLine]) {
        let range = span.first_line..=span.last_line.min(lines.len().saturating_sub(1));
        match span.kind {
            SpanKind::LineComment | SpanKind::BlockComment => {
                if self.include_comments {
                    tag_lines(&mut lines[range], Tag::Comment);
                } else {
                    blank_lines(&mut lines[range]);
                }
            }
            SpanKind::DelimitedDocstring | SpanKind::PrefixedDocstring => match self.docstring_mode {
                DocstringMode::All => tag_lines(&mut lines[range], Tag::Docstring),
                DocstringMode::Excluded => blank_lines(&mut lines[range]),
                DocstringMode::Summary => {
                    let summary = if span.kind == SpanKind::DelimitedDocstring {
                        summarize_delimited(&text[span.start..span.end])
                    } else {
                        summarize_prefixed(&lines[range.clone()])
                    };
                    if let Some(summary) = summary {
                        let span_lines = &mut lines[range];
                        if let Some((first, rest)) = span_lines.split_first_mut() {
                            *first = TaggedLine::tagged(summary, Tag::Docstring);
                            for line in rest {
                                *line = TaggedLine::tagged("", Tag::Docstring);
                            }
                        }
                    } else {
                        tag_lines(&mut lines[range], Tag::Docstring);
                    }
                }
            },
            SpanKind::Metadata => {
                if let Some(line) = lines.get_mut(span.first_line) {
                    line.tag = Some(Tag::Metadata);
                }
            }
            SpanKind::MultiLineString => {
                let continuation = (span.first_line + 1)..=*range.end();
                if !continuation.is_empty() {
                    tag_lines(&mut lines[continuation], Tag::String);
                }
            }
        }
    }
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn line_starts(text: &str) -> Vec<usize> {
    let mut offset = 0;
    text.split_inclusive('\n')
        .map(|line| {
            let start = offset;
            offset += line.len();
            start
        })
        .collect()
}

fn line_of(starts: &[usize], offset: usize) -> usize {
    starts
        .partition_point(|&start| start <= offset)
        .saturating_sub(1)
}

fn tag_lines(lines: &mut [TaggedLine], tag: Tag) {
    for line in lines {
        line.tag = Some(tag);
    }
}

fn blank_lines(lines: &mut [TaggedLine]) {
    for line in lines {
        *line = TaggedLine::plain("");
    }
}

fn accepts(kind: SpanKind, matched: &str) -> bool {
    match kind {
        SpanKind::LineComment => !patterns::is_preprocessor_directive(matched),
        _ => true,
    }
}

fn next_boundary(text: &str, offset: usize) -> usize {
    text[offset..]
        .chars()
        .next()
        .map_or(text.len(), |c| offset + c.len_utf8())
}

fn find_accepted(regex: &Regex, kind: SpanKind, text: &str, from: usize) -> Option<(usize, usize)> {
    let mut at = from;
    while at <= text.len() {
        let m = regex.find_at(text, at)?;
        if m.end() > m.start() && accepts(kind, m.as_str()) {
            return Some((m.start(), m.end()));
        }
        at = if m.end() > m.start() {
            m.end()
        } else {
            next_boundary(text, m.start())
        };
        if m.start() >= text.len() {
            break;
        }
    }
    None
}

/// Leftmost scan across every pattern. Once a span is taken, matches that
/// start inside it are discarded, so a delimiter inside one construct never
/// opens another.
fn scan_spans(text: &str, starts: &[usize]) -> Vec<Span> {
    let scanners = scanners();
    let mut upcoming: [Option<(usize, usize)>; 6] = [None; 6];
    let mut exhausted = [false; 6];
    let mut spans = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let mut best: Option<(usize, usize, usize)> = None;

        for (idx, (regex, kind)) in scanners.iter().enumerate() {
            if exhausted[idx] {
                continue;
            }
            if upcoming[idx].map_or(true, |(start, _)| start < pos) {
                upcoming[idx] = find_accepted(regex, *kind, text, pos);
            }
            match upcoming[idx] {
                Some((start, end)) => {
                    if best.map_or(true, |(best_start, _, _)| start < best_start) {
                        best = Some((start, end, idx));
                    }
                }
                None => exhausted[idx] = true,
            }
        }

        let Some((start, end, idx)) = best else {
            break;
        };
        spans.push(Span {
            kind: scanners[idx].1,
            start,
            end,
            first_line: line_of(starts, start),
            last_line: line_of(starts, end - 1),
        });
        pos = end;
    }

    spans
}

/// Consecutive `///` lines form one docstring
fn merge_prefixed_runs(spans: Vec<Span>) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(prev) = merged.last_mut() {
            if prev.kind == SpanKind::PrefixedDocstring
                && span.kind == SpanKind::PrefixedDocstring
                && span.first_line == prev.last_line + 1
            {
                prev.last_line = span.last_line;
                prev.end = span.end;
                continue;
            }
        }
        merged.push(span);
    }
    merged
}

fn first_content_line(body: &str) -> Option<String> {
    body.lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .find(|line| !line.is_empty())
        .map(ToString::to_string)
}

fn summarize_delimited(matched: &str) -> Option<String> {
    let caps = patterns::DOCSTRING_STYLE_ONE.captures(matched)?;
    let [indent, left, body, right] = docstring_parts(&caps)?;
    let pad = if left.ends_with(['"', '\'']) { "" } else { " " };

    Some(match first_content_line(body) {
        Some(summary) => format!("{indent}{left}{pad}{summary}{pad}{right}"),
        None => format!("{indent}{left}{right}"),
    })
}

fn summarize_prefixed(lines: &[TaggedLine]) -> Option<String> {
    let parsed: Vec<(String, String, String)> = lines
        .iter()
        .filter_map(|line| {
            let caps = patterns::DOCSTRING_STYLE_TWO.captures(&line.text)?;
            Some((
                caps.get(1)?.as_str().to_string(),
                caps.get(2)?.as_str().to_string(),
                caps.get(3)?.as_str().trim().to_string(),
            ))
        })
        .collect();
    let (indent, prefix, _) = parsed.first()?;
    let contents: Vec<&str> = parsed.iter().map(|(_, _, content)| content.as_str()).collect();

    let summary = structured_summary(&contents).or_else(|| {
        log::debug!("Docstring has no leading paragraph, using its first line");
        contents
            .iter()
            .find(|line| !line.is_empty())
            .map(ToString::to_string)
    });

    Some(match summary {
        Some(summary) => format!("{indent}{prefix} {summary}"),
        None => format!("{indent}{prefix}"),
    })
}

const SECTION_MARKERS: &[&str] = &[
    "@", ":param", ":return", ":raises", "Args:", "Arguments:", "Returns:", "Parameters", "# ",
    "```",
];

/// First sentence of the leading paragraph, or `None` when the docstring
/// opens with a tag section instead of prose
fn structured_summary(contents: &[&str]) -> Option<String> {
    let paragraph: Vec<&str> = contents
        .iter()
        .copied()
        .skip_while(|line| line.is_empty())
        .take_while(|line| !line.is_empty())
        .collect();
    let first = paragraph.first()?;
    if SECTION_MARKERS.iter().any(|marker| first.starts_with(marker)) {
        return None;
    }

    let joined = paragraph.join(" ");
    Some(match joined.find(". ") {
        Some(idx) => joined[..=idx].to_string(),
        None => joined,
    })
}
