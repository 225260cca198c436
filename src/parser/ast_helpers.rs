//! Shared tree-sitter node helpers for the gap analyzer.

use tree_sitter::Node;

/// Source text of a node, or "..." when the byte range is not valid UTF-8.
pub fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("...")
}

/// First line of a node (1-indexed).
pub fn start_line(node: Node) -> usize {
    node.start_position().row + 1
}

/// Last line of a node (1-indexed, inclusive).
pub fn end_line(node: Node) -> usize {
    node.end_position().row + 1
}

/// Start lines of the direct statements of a `block` node.
pub fn block_statement_lines(block: Node) -> Vec<usize> {
    let mut cursor = block.walk();
    block
        .named_children(&mut cursor)
        .map(start_line)
        .collect()
}

/// Verbatim source lines for an inclusive 1-indexed range. The range is
/// clamped to the file; a range entirely past the end yields an empty string.
pub fn snippet(source_lines: &[&str], start: usize, end: usize) -> String {
    let end = end.min(source_lines.len());
    if start == 0 || start > end {
        return String::new();
    }
    source_lines[start - 1..end].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PythonParser;

    #[test]
    fn block_lines_are_statement_starts() {
        let source = "def f():\n    a = 1\n    b = 2\n";
        let mut parser = PythonParser::new().unwrap();
        let tree = parser.parse(source).unwrap();
        let func = tree.root_node().named_child(0).unwrap();
        let body = func.child_by_field_name("body").unwrap();
        assert_eq!(block_statement_lines(body), vec![2, 3]);
    }

    #[test]
    fn snippet_clamps_out_of_range() {
        let lines = vec!["one", "two"];
        assert_eq!(snippet(&lines, 1, 2), "one\ntwo");
        assert_eq!(snippet(&lines, 1, 99), "one\ntwo");
        assert_eq!(snippet(&lines, 5, 9), "");
        assert_eq!(snippet(&lines, 0, 1), "");
    }
}
