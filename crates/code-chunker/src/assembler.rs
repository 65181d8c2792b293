//! Greedy packing of structural blocks into budget-bounded chunks.
//!
//! One forward pass, no backtracking. A block either joins the running
//! chunk, closes it and starts the next one, or (alone and still too big)
//! is split by lines or rejected in strict mode.

use crate::config::Budget;
use crate::error::{BudgetDimension, BudgetOverflow, ChunkerError, Result};
use crate::namespace::render_tree;
use crate::token::TokenCounter;
use crate::types::{Chunk, LengthTable, StructuralBlock};

/// Measured size of a candidate chunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Measure {
    tokens: usize,
    lines: usize,
    functions: usize,
}

/// Blocks collected for the chunk being built. `content` grows in place
/// and is truncated back when a candidate block does not fit.
#[derive(Default)]
struct Pending<'b> {
    blocks: Vec<&'b StructuralBlock>,
    content: String,
    measure: Measure,
}

impl Pending<'_> {
    fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Packs blocks of one source into chunks
pub struct ChunkAssembler<'a> {
    counter: Option<&'a dyn TokenCounter>,
    budget: Budget,
    strict: bool,
    source: &'a str,
    lengths: &'a LengthTable,
}

impl<'a> ChunkAssembler<'a> {
    pub fn new(budget: Budget, lengths: &'a LengthTable) -> Self {
        Self {
            counter: None,
            budget,
            strict: false,
            source: "N/A",
            lengths,
        }
    }

    /// Builder: counter used for the token budget
    #[must_use]
    pub fn with_counter(mut self, counter: &'a dyn TokenCounter) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Builder: fail on oversized blocks instead of splitting them
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Builder: source id copied into every chunk
    #[must_use]
    pub const fn with_source(mut self, source: &'a str) -> Self {
        self.source = source;
        self
    }

    pub fn assemble(&self, blocks: &[StructuralBlock]) -> Result<Vec<Chunk>> {
        if self.budget.max_tokens.is_some() && self.counter.is_none() {
            return Err(ChunkerError::invalid_config(
                "max_tokens is set but no token counter was supplied",
            ));
        }

        let mut chunks = Vec::new();
        let mut pending = Pending::default();

        for block in blocks {
            if !pending.is_empty() {
                let restore = pending.content.len();
                pending.content.push('\n');
                pending.content.push_str(&block.content);
                let measure = self.measure(
                    &pending.content,
                    pending.measure.lines + block.line_count(),
                    pending.measure.functions + usize::from(block.is_function()),
                )?;
                if self.overflows(measure).is_empty() {
                    pending.blocks.push(block);
                    pending.measure = measure;
                    continue;
                }
                pending.content.truncate(restore);
                self.emit(std::mem::take(&mut pending), &mut chunks);
            }

            // starting fresh: with a continuation header if it fits, bare
            // otherwise, split or rejected when even that is too big
            if !chunks.is_empty() {
                if let Some(mut content) = continuation_header(block) {
                    let lines = content.split('\n').count() + block.line_count();
                    content.push('\n');
                    content.push_str(&block.content);
                    let measure = self.measure(&content, lines, usize::from(block.is_function()))?;
                    if self.overflows(measure).is_empty() {
                        pending = Pending {
                            blocks: vec![block],
                            content,
                            measure,
                        };
                        continue;
                    }
                }
            }

            let measure = self.measure(
                &block.content,
                block.line_count(),
                usize::from(block.is_function()),
            )?;
            let overflows = self.overflows(measure);
            if overflows.is_empty() {
                pending = Pending {
                    blocks: vec![block],
                    content: block.content.clone(),
                    measure,
                };
            } else if self.strict {
                return Err(ChunkerError::BudgetExceeded {
                    start_line: block.start_line,
                    end_line: block.end_line,
                    overflows,
                });
            } else {
                log::debug!(
                    "Block {}-{} exceeds the budget alone, splitting by lines",
                    block.start_line,
                    block.end_line
                );
                self.split_oversized(block, &mut chunks)?;
            }
        }

        if !pending.is_empty() {
            self.emit(pending, &mut chunks);
        }
        Ok(chunks)
    }

    fn count(&self, text: &str) -> Result<usize> {
        match (self.budget.max_tokens, self.counter) {
            (Some(_), Some(counter)) => counter
                .count_tokens(text)
                .map_err(|e| ChunkerError::token_counter(text, e)),
            _ => Ok(0),
        }
    }

    fn measure(&self, content: &str, lines: usize, functions: usize) -> Result<Measure> {
        Ok(Measure {
            tokens: self.count(content)?,
            lines,
            functions,
        })
    }

    fn overflows(&self, measure: Measure) -> Vec<BudgetOverflow> {
        [
            (BudgetDimension::Tokens, self.budget.max_tokens, measure.tokens),
            (BudgetDimension::Lines, self.budget.max_lines, measure.lines),
            (BudgetDimension::Functions, self.budget.max_functions, measure.functions),
        ]
        .into_iter()
        .filter_map(|(dimension, allowed, measured)| {
            let allowed = allowed?;
            (measured > allowed).then_some(BudgetOverflow {
                dimension,
                measured,
                allowed,
            })
        })
        .collect()
    }

    fn emit(&self, pending: Pending<'_>, chunks: &mut Vec<Chunk>) {
        let (Some(first), Some(last)) = (pending.blocks.first(), pending.blocks.last()) else {
            return;
        };
        let tree = render_tree(pending.blocks.iter().map(|b| &b.relations));
        self.push_chunk(pending.content, tree, first.start_line, last.end_line, chunks);
    }

    fn push_chunk(
        &self,
        content: String,
        tree: String,
        start_line: usize,
        end_line: usize,
        chunks: &mut Vec<Chunk>,
    ) {
        let chunk = Chunk {
            content,
            chunk_num: chunks.len() + 1,
            tree,
            start_line,
            end_line,
            span: self.lengths.span(start_line, end_line),
            source: self.source.to_string(),
        };
        log::debug!(
            "Chunk #{} lines {}-{} ({} bytes)",
            chunk.chunk_num,
            chunk.start_line,
            chunk.end_line,
            chunk.content.len()
        );
        chunks.push(chunk);
    }

    /// Whether `text` spanning `lines` lines fits the token and line budgets
    fn fits(&self, text: &str, lines: usize) -> Result<bool> {
        let tokens = self.count(text)?;
        Ok(!self.budget.max_tokens.is_some_and(|max| tokens > max)
            && !self.budget.max_lines.is_some_and(|max| lines > max))
    }

    /// Line-wise split of a block too big for any chunk. A line that is too
    /// big on its own still becomes a chunk of its own.
    fn split_oversized(&self, block: &StructuralBlock, chunks: &mut Vec<Chunk>) -> Result<()> {
        let tree = render_tree([&block.relations]);
        let lines: Vec<&str> = block.content.split('\n').collect();
        let mut part = String::new();
        let mut part_start = block.start_line;
        let mut part_lines = 0;

        for (first, last) in self.split_units(block, &lines)? {
            let unit = lines[first..=last].join("\n");
            let unit_lines = last - first + 1;
            if part_lines > 0 {
                let restore = part.len();
                part.push('\n');
                part.push_str(&unit);
                if self.fits(&part, part_lines + unit_lines)? {
                    part_lines += unit_lines;
                    continue;
                }
                part.truncate(restore);
                self.push_chunk(
                    std::mem::take(&mut part),
                    tree.clone(),
                    part_start,
                    part_start + part_lines - 1,
                    chunks,
                );
            }
            part = unit;
            part_start = block.start_line + first;
            part_lines = unit_lines;
        }

        if part_lines > 0 {
            self.push_chunk(part, tree, part_start, part_start + part_lines - 1, chunks);
        }
        Ok(())
    }

    /// Indivisible pieces of `lines` as 0-based inclusive ranges: a tagged
    /// run that fits on its own, otherwise single lines
    fn split_units(&self, block: &StructuralBlock, lines: &[&str]) -> Result<Vec<(usize, usize)>> {
        let mut runs = block.tagged_runs.iter().copied().peekable();
        let mut units = Vec::with_capacity(lines.len());
        let mut idx = 0;

        while idx < lines.len() {
            let line_number = block.start_line + idx;
            while runs.next_if(|&(start, _)| start < line_number).is_some() {}
            if let Some((_, end)) = runs.next_if(|&(start, _)| start == line_number) {
                let last = (end - block.start_line).min(lines.len() - 1);
                if last > idx && self.fits(&lines[idx..=last].join("\n"), last - idx + 1)? {
                    units.push((idx, last));
                    idx = last + 1;
                    continue;
                }
            }
            units.push((idx, idx));
            idx += 1;
        }
        Ok(units)
    }
}

/// Enclosing declaration lines plus an elision marker at the block's indent
fn continuation_header(block: &StructuralBlock) -> Option<String> {
    if block.enclosing_headers.is_empty() {
        return None;
    }
    let indent = &block.head[..block.head.len() - block.head.trim_start().len()];
    let mut lines = block.enclosing_headers.clone();
    lines.push(format!("{indent}..."));
    Some(lines.join("\n"))
}
