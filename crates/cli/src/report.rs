use scope_chunker::Chunk;

/// Plain-text listing: a header line, the scope tree, then the content
pub fn render_chunks(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        out.push_str(&format!(
            "== {} #{} {}-{} ==\n",
            chunk.source, chunk.chunk_num, chunk.start_line, chunk.end_line
        ));
        out.push_str(&chunk.tree);
        out.push_str("\n--\n");
        out.push_str(&chunk.content);
        if !chunk.content.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    out
}
