//! Python parser using tree-sitter

use anyhow::{Context, Result};
use tree_sitter::{Language, Parser, Tree};

/// Parser for Python files using tree-sitter
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    /// Create a new Python parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language: Language = tree_sitter_python::LANGUAGE.into();
        parser
            .set_language(&language)
            .context("Failed to set Python language")?;
        Ok(Self { parser })
    }

    /// Parse source code into a syntax tree.
    ///
    /// Note that tree-sitter does not fail on malformed input; it returns a
    /// tree containing ERROR nodes instead. Callers that need hard-failure
    /// semantics must check `tree.root_node().has_error()`.
    pub fn parse(&mut self, source: &str) -> Result<Tree> {
        self.parser
            .parse(source, None)
            .context("Failed to parse Python source")
    }

    /// Get the tree-sitter language for Python
    pub fn language() -> Language {
        tree_sitter_python::LANGUAGE.into()
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new().expect("Failed to create Python parser")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let mut parser = PythonParser::new().unwrap();
        let tree = parser.parse("x = 1\n").unwrap();
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn test_parse_function() {
        let mut parser = PythonParser::new().unwrap();
        let source = "def greet(name):\n    return f\"Hello, {name}!\"\n";
        let tree = parser.parse(source).unwrap();
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn test_parse_invalid_source_reports_error_nodes() {
        let mut parser = PythonParser::new().unwrap();
        let tree = parser.parse("def broken(\n").unwrap();
        assert!(tree.root_node().has_error());
    }
}
