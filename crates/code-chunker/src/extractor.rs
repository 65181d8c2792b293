//! Forward-scanning state machine that turns tagged lines into structural
//! blocks.
//!
//! Code lines accumulate into the current block until an anchor (function or
//! namespace declaration) or a dedent closes it. Annotated lines (comments,
//! docstrings, decorators, string continuations) are parked in a per-tag
//! buffer instead, so a multi-line comment is never cut in half by a
//! boundary. A flush merges both and restores original line order.

use crate::language::IndentationDiscipline;
use crate::patterns;
use crate::types::{RawLine, StructuralBlock, Tag, TaggedLine};

/// Pending annotated lines, one list per tag
#[derive(Debug, Default)]
struct TagBuffer {
    lines: [Vec<RawLine>; 4],
}

impl TagBuffer {
    fn get(&self, tag: Tag) -> &[RawLine] {
        &self.lines[tag.index()]
    }

    fn push(&mut self, tag: Tag, line: RawLine) {
        self.lines[tag.index()].push(line);
    }

    fn take(&mut self, tag: Tag) -> Vec<RawLine> {
        std::mem::take(&mut self.lines[tag.index()])
    }

    fn restore(&mut self, tag: Tag, lines: Vec<RawLine>) {
        self.lines[tag.index()] = lines;
    }

    fn is_empty(&self) -> bool {
        self.lines.iter().all(Vec::is_empty)
    }

    fn drain(&mut self) -> impl Iterator<Item = RawLine> + '_ {
        self.lines.iter_mut().flat_map(std::mem::take)
    }
}

/// Splits a tagged line stream into [`StructuralBlock`]s
#[derive(Debug, Clone, Copy)]
pub struct StructuralExtractor {
    discipline: IndentationDiscipline,
}

impl StructuralExtractor {
    pub const fn new(discipline: IndentationDiscipline) -> Self {
        Self { discipline }
    }

    pub fn extract(&self, lines: &[TaggedLine]) -> Vec<StructuralBlock> {
        let mut scan = Scan::new(self.discipline);
        for (idx, line) in lines.iter().enumerate() {
            scan.feed(idx + 1, line);
        }
        scan.flush();

        log::debug!(
            "Extracted {} blocks from {} lines ({:?})",
            scan.blocks.len(),
            lines.len(),
            self.discipline
        );
        scan.blocks
    }
}

struct Scan {
    discipline: IndentationDiscipline,
    curr_struct: Vec<RawLine>,
    buffer: TagBuffer,
    block_indent_level: usize,
    functions: usize,
    /// Indent of the last non-blank code line seen
    last_indent: usize,
    blocks: Vec<StructuralBlock>,
}

impl Scan {
    fn new(discipline: IndentationDiscipline) -> Self {
        Self {
            discipline,
            curr_struct: Vec::new(),
            buffer: TagBuffer::default(),
            block_indent_level: 0,
            functions: 0,
            last_indent: 0,
            blocks: Vec::new(),
        }
    }

    fn feed(&mut self, line_number: usize, line: &TaggedLine) {
        let indent_level = patterns::indent_width(&line.text);
        match line.tag {
            Some(tag) => self.on_tagged(
                tag,
                RawLine {
                    line_number,
                    content: line.text.clone(),
                    indent_level,
                    function_signature: None,
                    tag: Some(tag),
                },
            ),
            None => self.on_code(RawLine {
                line_number,
                content: line.text.clone(),
                indent_level,
                function_signature: patterns::function_signature(&line.text),
                tag: None,
            }),
        }
    }

    fn on_tagged(&mut self, tag: Tag, raw: RawLine) {
        let starts_new_run = match tag {
            Tag::Metadata => self.buffer.get(Tag::Metadata).is_empty(),
            Tag::Docstring => self
                .buffer
                .get(Tag::Docstring)
                .last()
                .is_some_and(|prev| prev.line_number + 1 != raw.line_number),
            Tag::Comment | Tag::String => false,
        };
        if starts_new_run {
            self.flush_boundary();
        }
        self.buffer.push(tag, raw);
    }

    fn on_code(&mut self, raw: RawLine) {
        let blank = raw.is_blank();
        if !blank {
            self.last_indent = raw.indent_level;
        }

        if self.curr_struct.iter().all(RawLine::is_blank) {
            if !blank {
                self.block_indent_level = raw.indent_level;
            }
            self.append(raw);
            return;
        }

        let is_function = raw.function_signature.is_some();
        let is_namespace = !blank && patterns::namespace_declaration(&raw.content).is_some();

        if is_function || is_namespace {
            let deeper = raw.indent_level > self.block_indent_level;
            if is_function && deeper && self.functions > 0 {
                // nested function: stays inside its parent
                self.append(raw);
            } else if is_function
                && self.functions == 0
                && !self.buffer.get(Tag::Metadata).is_empty()
            {
                // decorated function: keep the decorator lines attached
                self.block_indent_level = raw.indent_level;
                self.append(raw);
            } else if !is_function && deeper {
                self.append(raw);
            } else {
                self.flush_boundary();
                self.start(raw);
            }
            return;
        }

        if !blank
            && raw.indent_level <= self.block_indent_level
            && !patterns::is_bare_delimiter(&raw.content)
        {
            self.flush_boundary();
            self.start(raw);
            return;
        }

        self.append(raw);
    }

    fn append(&mut self, raw: RawLine) {
        if raw.function_signature.is_some() {
            self.functions += 1;
        }
        self.curr_struct.push(raw);
    }

    /// Open a new block at `raw`, keeping whatever a boundary flush carried over
    fn start(&mut self, raw: RawLine) {
        self.block_indent_level = raw.indent_level;
        self.append(raw);
    }

    /// Flush at a block boundary.
    ///
    /// Brace languages put docstrings above the declaration they document,
    /// so a pending docstring not yet followed by code moves to the block
    /// being opened instead of closing the previous one.
    fn flush_boundary(&mut self) {
        if self.discipline == IndentationDiscipline::Significant {
            self.flush();
            return;
        }

        let Some(first_doc_line) = self
            .buffer
            .get(Tag::Docstring)
            .first()
            .map(|line| line.line_number)
        else {
            self.flush();
            return;
        };

        let split_at = self
            .curr_struct
            .iter()
            .position(|line| line.line_number > first_doc_line)
            .unwrap_or(self.curr_struct.len());
        if self.curr_struct[split_at..].iter().any(|line| !line.is_blank()) {
            // already documents the code below it
            self.flush();
            return;
        }

        // everything from the docstring on moves, so block ranges never overlap
        let parked: Vec<(Tag, Vec<RawLine>)> = Tag::ALL
            .into_iter()
            .map(|tag| {
                let (before, after) = self
                    .buffer
                    .take(tag)
                    .into_iter()
                    .partition(|line| line.line_number < first_doc_line);
                self.buffer.restore(tag, before);
                (tag, after)
            })
            .collect();
        let carried = self.curr_struct.split_off(split_at);

        self.flush();
        for (tag, lines) in parked {
            self.buffer.restore(tag, lines);
        }
        for line in carried {
            self.append(line);
        }
    }

    fn flush(&mut self) {
        if self.curr_struct.is_empty() && self.buffer.is_empty() {
            return;
        }

        let code = std::mem::take(&mut self.curr_struct);
        self.functions = 0;

        let indent_level = code
            .iter()
            .find(|line| !line.is_blank())
            .map(|line| line.indent_level);
        let function_signature = code
            .iter()
            .find_map(|line| line.function_signature.clone());
        let head = code
            .iter()
            .find(|line| !line.is_blank())
            .map(|line| line.content.clone());

        let mut lines: Vec<RawLine> = code.into_iter().chain(self.buffer.drain()).collect();
        lines.sort_by_key(|line| line.line_number);

        let indent_level = indent_level
            .or_else(|| {
                lines
                    .iter()
                    .find(|line| !line.is_blank())
                    .map(|line| line.indent_level)
            })
            .unwrap_or(self.last_indent);

        let (Some(first), Some(last)) = (lines.first(), lines.last()) else {
            return;
        };
        let (start_line, end_line) = (first.line_number, last.line_number);
        let content = lines
            .iter()
            .map(|line| line.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut block = StructuralBlock::new(content, start_line, end_line).with_indent(indent_level);
        block.function_signature = function_signature;
        block.tagged_runs = tagged_runs(&lines);
        if let Some(head) = head {
            block.head = head;
        }

        log::trace!(
            "Block {}-{} indent={} fn={:?}",
            block.start_line,
            block.end_line,
            block.indent_level,
            block.function_signature
        );
        self.blocks.push(block);
    }
}

/// Line ranges of consecutive lines sharing a tag, in order. A string
/// continuation run starts at the code line that opened the literal.
fn tagged_runs(lines: &[RawLine]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut open: Option<(Tag, usize, usize)> = None;

    for (idx, line) in lines.iter().enumerate() {
        if let (Some((tag, start, end)), Some(current)) = (open, line.tag) {
            if tag == current && end + 1 == line.line_number {
                open = Some((tag, start, line.line_number));
                continue;
            }
        }
        if let Some((_, start, end)) = open.take() {
            if end > start {
                runs.push((start, end));
            }
        }
        let Some(tag) = line.tag else {
            continue;
        };
        let start = match idx.checked_sub(1).map(|prev| &lines[prev]) {
            Some(prev)
                if tag == Tag::String
                    && prev.tag.is_none()
                    && prev.line_number + 1 == line.line_number =>
            {
                prev.line_number
            }
            _ => line.line_number,
        };
        open = Some((tag, start, line.line_number));
    }

    if let Some((_, start, end)) = open {
        if end > start {
            runs.push((start, end));
        }
    }
    runs
}
