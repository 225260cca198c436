//! Gap analyzer - walk the syntax tree to understand what uncovered code does.
//!
//! For every function whose span touches a missing line, each descendant
//! node starting on a missing line is classified into an [`UncoveredBlock`]
//! (branch, exception handler, raise, return, loop) with the enclosing
//! class/function recovered from traversal context. Sources that do not
//! parse fall back to grouping consecutive missing lines.

use crate::parser::ast_helpers::{block_statement_lines, end_line, node_text, snippet, start_line};
use crate::parser::PythonParser;
use crate::{BlockType, UncoveredBlock};
use std::collections::{BTreeSet, HashSet};
use tree_sitter::Node;

/// Analyzes one source file against its missing-line set.
pub struct GapAnalyzer<'a> {
    source: &'a str,
    source_lines: Vec<&'a str>,
    missing_lines: BTreeSet<usize>,
    blocks: Vec<UncoveredBlock>,
    // One block per distinct node span, however many traversal paths reach it.
    // Recreated per analysis call; never shared across files.
    seen_blocks: HashSet<(usize, usize)>,
    current_class: Option<String>,
    current_function: Option<String>,
    file_path: String,
}

impl<'a> GapAnalyzer<'a> {
    pub fn new(source: &'a str, missing_lines: BTreeSet<usize>) -> Self {
        Self {
            source,
            source_lines: source.lines().collect(),
            missing_lines,
            blocks: Vec::new(),
            seen_blocks: HashSet::new(),
            current_class: None,
            current_function: None,
            file_path: String::new(),
        }
    }

    /// Analyze the file and return uncovered blocks in traversal order.
    ///
    /// A source that tree-sitter cannot parse cleanly (no tree, or any
    /// ERROR node) is handled by the line-based fallback instead of
    /// propagating an error; parse failure is expected, not fatal.
    pub fn analyze(&mut self, file_path: &str) -> Vec<UncoveredBlock> {
        self.file_path = file_path.to_string();

        let tree = PythonParser::new()
            .ok()
            .and_then(|mut parser| parser.parse(self.source).ok());

        match tree {
            Some(tree) if !tree.root_node().has_error() => self.visit(tree.root_node()),
            _ => self.analyze_by_lines(),
        }

        std::mem::take(&mut self.blocks)
    }

    /// Fallback: group consecutive missing lines without a syntax tree.
    fn analyze_by_lines(&mut self) {
        let sorted: Vec<usize> = self.missing_lines.iter().copied().collect();
        let Some((&first, rest)) = sorted.split_first() else {
            return;
        };

        let mut run_start = first;
        let mut prev = first;
        for &line in rest {
            if line != prev + 1 {
                self.push_block(run_start, prev, BlockType::CodeBlock, None);
                run_start = line;
            }
            prev = line;
        }
        self.push_block(run_start, prev, BlockType::CodeBlock, None);
    }

    fn visit(&mut self, node: Node) {
        match node.kind() {
            "class_definition" => {
                let old_class = self.current_class.take();
                self.current_class = node
                    .child_by_field_name("name")
                    .map(|n| node_text(n, self.source).to_string());
                self.visit_children(node);
                self.current_class = old_class;
            }
            // Covers `async def` as well; tree-sitter parses both as
            // function_definition.
            "function_definition" => self.visit_function(node),
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit(child);
        }
    }

    fn visit_function(&mut self, node: Node) {
        let old_function = self.current_function.take();
        self.current_function = node
            .child_by_field_name("name")
            .map(|n| node_text(n, self.source).to_string());

        let first = start_line(node);
        let last = end_line(node);
        if self.missing_lines.range(first..=last).next().is_some() {
            self.walk_descendants(node);
        }

        self.visit_children(node);
        self.current_function = old_function;
    }

    /// Classify this node and everything below it, depth-first.
    fn walk_descendants(&mut self, node: Node) {
        self.analyze_node(node);
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            self.walk_descendants(child);
        }
    }

    fn analyze_node(&mut self, node: Node) {
        let line = start_line(node);
        if !self.missing_lines.contains(&line) {
            return;
        }

        let kind = node.kind();
        let classified = matches!(
            kind,
            "if_statement"
                | "elif_clause"
                | "except_clause"
                | "return_statement"
                | "raise_statement"
                | "for_statement"
                | "while_statement"
        );
        if !classified {
            return;
        }

        if !self.seen_blocks.insert((line, end_line(node))) {
            return;
        }

        match kind {
            "if_statement" | "elif_clause" => self.analyze_conditional(node),
            "except_clause" => self.analyze_except(node),
            "return_statement" => self.analyze_return(node),
            "raise_statement" => self.analyze_raise(node),
            "for_statement" => self.analyze_loop(node, BlockType::ForLoop),
            "while_statement" => self.analyze_loop(node, BlockType::WhileLoop),
            _ => {}
        }
    }

    /// Either side of a conditional may be uncovered; the sides are
    /// evaluated and emitted independently.
    fn analyze_conditional(&mut self, node: Node) {
        let condition = node
            .child_by_field_name("condition")
            .map(|n| node_text(n, self.source).to_string())
            .unwrap_or_else(|| "...".to_string());

        let body_lines: Vec<usize> = node
            .child_by_field_name("consequence")
            .map(block_statement_lines)
            .unwrap_or_default();
        let last_missing = body_lines
            .iter()
            .filter(|l| self.missing_lines.contains(*l))
            .max()
            .copied();
        if let Some(end) = last_missing {
            self.push_block(
                start_line(node),
                end,
                BlockType::IfTrueBranch,
                Some(format!("when {condition} is True")),
            );
        }

        let false_lines = self.false_side_lines(node);
        if false_lines.iter().any(|l| self.missing_lines.contains(l)) {
            let start = *false_lines.iter().min().expect("non-empty");
            let end = *false_lines.iter().max().expect("non-empty");
            self.push_block(
                start,
                end,
                BlockType::IfFalseBranch,
                Some(format!("when {condition} is False")),
            );
        }
    }

    /// Statement lines of the "false" side of a conditional: the else
    /// block's statements, or the header line of the next elif. A
    /// conditional without an alternative has no false side.
    fn false_side_lines(&self, node: Node) -> Vec<usize> {
        let alternative = if node.kind() == "if_statement" {
            let mut cursor = node.walk();
            let alt = node
                .children_by_field_name("alternative", &mut cursor)
                .next();
            alt
        } else {
            // elif: the false side is the next alternative of the parent if
            node.parent().and_then(|parent| {
                let mut cursor = parent.walk();
                let alternatives: Vec<Node> = parent
                    .children_by_field_name("alternative", &mut cursor)
                    .collect();
                let index = alternatives.iter().position(|a| a.id() == node.id())?;
                alternatives.get(index + 1).copied()
            })
        };

        match alternative {
            Some(alt) if alt.kind() == "else_clause" => alt
                .child_by_field_name("body")
                .map(block_statement_lines)
                .unwrap_or_default(),
            Some(alt) if alt.kind() == "elif_clause" => vec![start_line(alt)],
            _ => Vec::new(),
        }
    }

    fn analyze_except(&mut self, node: Node) {
        let mut exc_type = "Exception".to_string();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "block" {
                break;
            }
            if child.kind() == "as_pattern" {
                // except ValueError as e: the type is the pattern's subject
                if let Some(subject) = child.named_child(0) {
                    exc_type = node_text(subject, self.source).to_string();
                }
            } else {
                exc_type = node_text(child, self.source).to_string();
            }
            break;
        }

        self.push_block(
            start_line(node),
            end_line(node),
            BlockType::ExceptionHandler,
            Some(format!("when {exc_type} is raised")),
        );
    }

    fn analyze_return(&mut self, node: Node) {
        let value = node
            .named_child(0)
            .map(|n| node_text(n, self.source).to_string())
            .unwrap_or_else(|| "None".to_string());
        let line = start_line(node);
        self.push_block(
            line,
            line,
            BlockType::ReturnStatement,
            Some(format!("return {value}")),
        );
    }

    fn analyze_raise(&mut self, node: Node) {
        // Only a direct constructor call or a bare name gives us the type;
        // anything else (attributes, re-raise expressions) stays generic.
        let mut exc_type = "Exception".to_string();
        if let Some(expr) = node.named_child(0) {
            match expr.kind() {
                "call" => {
                    if let Some(func) = expr.child_by_field_name("function") {
                        if func.kind() == "identifier" {
                            exc_type = node_text(func, self.source).to_string();
                        }
                    }
                }
                "identifier" => exc_type = node_text(expr, self.source).to_string(),
                _ => {}
            }
        }

        let line = start_line(node);
        self.push_block(
            line,
            line,
            BlockType::RaiseStatement,
            Some(format!("raise {exc_type}")),
        );
    }

    fn analyze_loop(&mut self, node: Node, block_type: BlockType) {
        self.push_block(start_line(node), end_line(node), block_type, None);
    }

    fn push_block(
        &mut self,
        start: usize,
        end: usize,
        block_type: BlockType,
        condition: Option<String>,
    ) {
        self.blocks.push(UncoveredBlock {
            file_path: self.file_path.clone(),
            start_line: start,
            end_line: end,
            function_name: self.current_function.clone(),
            class_name: self.current_class.clone(),
            code_snippet: snippet(&self.source_lines, start, end),
            block_type,
            condition,
        });
    }
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn analyzer_never_panics_on_arbitrary_input(
            ref source in ".{0,400}",
            missing in prop::collection::btree_set(1usize..100, 0..10),
        ) {
            let mut analyzer = GapAnalyzer::new(source, missing.clone());
            let blocks = analyzer.analyze("fuzz.py");
            for block in &blocks {
                prop_assert!(block.start_line <= block.end_line);
            }
        }

        #[test]
        fn fallback_covers_every_missing_line_once(
            missing in prop::collection::btree_set(1usize..200, 1..30),
        ) {
            // Unparseable source forces the line-grouping path
            let mut analyzer = GapAnalyzer::new("def broken(\n", missing.clone());
            let blocks = analyzer.analyze("fuzz.py");

            prop_assert!(!blocks.is_empty());
            let mut covered = std::collections::BTreeSet::new();
            for block in &blocks {
                for line in block.start_line..=block.end_line {
                    prop_assert!(covered.insert(line), "line {} covered twice", line);
                }
            }
            for line in &missing {
                prop_assert!(covered.contains(line));
            }
        }
    }
}
