//! Test-stub file writer for the CLI `--output` flag.

use crate::GapSuggestion;
use anyhow::{Context, Result};
use std::path::Path;

/// Write a pytest stub file: one commented, templated skeleton per
/// suggestion, separated by blank lines.
pub fn write_stub_file(path: &Path, suggestions: &[GapSuggestion]) -> Result<()> {
    let mut out = String::new();
    out.push_str("\"\"\"Auto-generated test stubs from coverage gaps.\"\"\"\n\n");
    out.push_str("import pytest\n\n");

    for suggestion in suggestions {
        out.push_str(&format!("# {}\n", suggestion.description));
        out.push_str(&format!("# Priority: {}\n", suggestion.priority));
        if !suggestion.setup_hints.is_empty() {
            out.push_str(&format!("# Hints: {}\n", suggestion.setup_hints.join(", ")));
        }
        out.push_str(&suggestion.code_template);
        out.push_str("\n\n");
    }

    std::fs::write(path, out)
        .with_context(|| format!("Failed to write test stubs to {}", path.display()))
}
