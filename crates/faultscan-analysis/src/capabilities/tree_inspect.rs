//! Syntax-tree traversal helpers shared by in-process capabilities.

use std::ops::ControlFlow;

use tree_sitter::Node;

/// Pre-order walk over every node under `root`, driven by a cursor so deep
/// trees do not grow the call stack. The visitor can stop the walk early.
pub fn walk<'tree, F>(root: Node<'tree>, mut visit: F)
where
    F: FnMut(Node<'tree>) -> ControlFlow<()>,
{
    let mut cursor = root.walk();
    loop {
        if visit(cursor.node()).is_break() {
            return;
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Count ERROR and MISSING nodes, returning the 1-based line of the first one.
pub fn count_errors(root: Node) -> (u32, Option<usize>) {
    let mut count = 0u32;
    let mut first_line = None;
    walk(root, |node| {
        if node.is_error() || node.is_missing() {
            count += 1;
            if first_line.is_none() {
                first_line = Some(node.start_position().row + 1);
            }
        }
        ControlFlow::Continue(())
    });
    (count, first_line)
}

/// Text of `node`, or an empty string when the byte range is not valid UTF-8.
pub fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}
