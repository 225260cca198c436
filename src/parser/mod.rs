//! Python parsing - tree-sitter wrapper and AST helpers

pub mod ast_helpers;
mod python;

pub use python::PythonParser;
