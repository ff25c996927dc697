//! Styles visitor: flattens a tree's styling into source-ordered ranges.

use crate::forest::node::{NodeId, ParseTree, TreeNodeKind};
use crate::earley::state::MatchOrigin;
use crate::error::Style;

/// Walk a tree in source order and materialize its styles.
///
/// Context styles (set by reduction actions) are emitted when their node is
/// visited, before descending; token leaves contribute the style stamped by
/// the lexer. Where ranges nest, the deeper style wins: shallower entries
/// overlapped by a deeper one are dropped.
#[must_use]
pub fn collect_styles(tree: &ParseTree) -> Vec<Style> {
    let mut entries: Vec<(Style, u32)> = Vec::new();
    visit(tree, tree.root, 0, &mut entries);

    let mut styles = Vec::with_capacity(entries.len());
    for (i, (style, depth)) in entries.iter().enumerate() {
        let shadowed = entries.iter().enumerate().any(|(j, (other, other_depth))| {
            j != i && other_depth > depth && other.range.overlaps(style.range)
        });
        if !shadowed {
            styles.push(style.clone());
        }
    }
    styles
}

fn visit(tree: &ParseTree, id: NodeId, depth: u32, out: &mut Vec<(Style, u32)>) {
    let data = tree.data(id);
    for style in &data.ctx.styles {
        if !style.range.is_empty() {
            out.push((style.clone(), depth));
        }
    }
    if let TreeNodeKind::Token { matched } = &data.kind {
        if matches!(matched.origin, MatchOrigin::Scanned) {
            if let Some(name) = &matched.style {
                out.push((Style::new(matched.range(), name.clone()), depth));
            }
        }
    }
    for &child in &data.children {
        visit(tree, child, depth + 1, out);
    }
}
