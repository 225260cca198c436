//! Coverage report ingestion - parse coverage.py JSON output

mod coveragepy;

pub use coveragepy::{parse_coveragepy_json, parse_coveragepy_value, CoverageReport, FileCoverage};

use std::path::Path;
use thiserror::Error;

/// Errors from reading or decoding a coverage report.
///
/// The variant matters to callers: a missing report and a malformed report
/// produce different diagnostics at the CLI and MCP boundaries.
#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("Coverage file not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON in coverage data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load and parse a coverage.py JSON report from disk.
pub fn load_coverage(path: &Path) -> Result<CoverageReport, CoverageError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CoverageError::NotFound(path.display().to_string()));
        }
        Err(e) => return Err(CoverageError::Io(e)),
    };
    parse_coveragepy_json(&content)
}
