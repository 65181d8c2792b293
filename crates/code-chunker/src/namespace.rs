//! Scope attachment: every block learns the chain of namespaces and
//! functions it sits in, as plain `(parent, child)` label pairs.

use crate::patterns;
use crate::types::{NamespaceRelation, StructuralBlock};

/// Label of the synthetic root every relation path starts from
pub const ROOT: &str = "global";

#[derive(Debug)]
struct ScopeNode {
    label: String,
    indent: usize,
    /// Declaration line, for namespace nodes only
    header: Option<String>,
}

/// Record relation paths and enclosing namespace headers on `blocks`, in
/// order. Blocks must come in source order.
pub fn attach_namespaces(blocks: &mut [StructuralBlock]) {
    let mut stack: Vec<ScopeNode> = Vec::new();

    for block in blocks.iter_mut() {
        if block.is_whitespace() {
            block.relations = relation_of(&stack);
            block.enclosing_headers = headers_of(&stack);
            continue;
        }

        while stack
            .last()
            .is_some_and(|node| node.indent >= block.indent_level)
        {
            stack.pop();
        }
        block.enclosing_headers = headers_of(&stack);

        if let Some((kind, name)) = patterns::namespace_declaration(&block.head) {
            stack.push(ScopeNode {
                label: format!("{kind} {name}"),
                indent: block.indent_level,
                header: Some(block.head.clone()),
            });
        }
        if let Some(signature) = &block.function_signature {
            stack.push(ScopeNode {
                label: signature.clone(),
                indent: block.indent_level,
                header: None,
            });
        }

        block.relations = relation_of(&stack);
    }
}

fn relation_of(stack: &[ScopeNode]) -> NamespaceRelation {
    let path: Vec<&str> = std::iter::once(ROOT)
        .chain(stack.iter().map(|node| node.label.as_str()))
        .collect();
    NamespaceRelation::from_path(&path)
}

fn headers_of(stack: &[ScopeNode]) -> Vec<String> {
    stack.iter().filter_map(|node| node.header.clone()).collect()
}

#[derive(Debug, Default)]
struct TrieNode {
    label: String,
    children: Vec<TrieNode>,
}

impl TrieNode {
    fn child(&mut self, label: &str) -> &mut TrieNode {
        let idx = match self.children.iter().position(|c| c.label == label) {
            Some(idx) => idx,
            None => {
                self.children.push(TrieNode {
                    label: label.to_string(),
                    children: Vec::new(),
                });
                self.children.len() - 1
            }
        };
        &mut self.children[idx]
    }

    fn draw(&self, prefix: &str, out: &mut Vec<String>) {
        let last = self.children.len().saturating_sub(1);
        for (idx, child) in self.children.iter().enumerate() {
            let (branch, indent) = if idx == last {
                ("└─ ", "   ")
            } else {
                ("├─ ", "│  ")
            };
            out.push(format!("{prefix}{branch}{}", child.label));
            child.draw(&format!("{prefix}{indent}"), out);
        }
    }
}

/// Merge relation paths into one tree (shared prefixes drawn once, first
/// occurrence order) and render it with box-drawing connectors.
pub fn render_tree<'a>(relations: impl IntoIterator<Item = &'a NamespaceRelation>) -> String {
    let mut root = TrieNode {
        label: ROOT.to_string(),
        children: Vec::new(),
    };
    for relation in relations {
        let mut node = &mut root;
        for scope in relation.scopes() {
            node = node.child(scope);
        }
    }

    let mut out = vec![root.label.clone()];
    root.draw("", &mut out);
    out.join("\n")
}
