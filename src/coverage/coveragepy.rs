//! coverage.py JSON format parser
//!
//! Parses the report produced by `pytest --cov-report=json` (coverage.py's
//! JSON writer) into a normalized per-file model. Only the `files` section
//! is read; `meta` and `totals` are ignored and recomputed from line data.

use super::CoverageError;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Parsed coverage report: per-file data plus aggregate totals.
///
/// Files are kept in a sorted map so iteration order (and therefore
/// pipeline output order) is deterministic.
#[derive(Debug, Clone, Default)]
pub struct CoverageReport {
    pub files: BTreeMap<String, FileCoverage>,
    pub total_covered: u64,
    pub total_missing: u64,
}

impl CoverageReport {
    /// Overall line coverage percentage; 100.0 when there are no lines.
    pub fn coverage_percent(&self) -> f64 {
        let total = self.total_covered + self.total_missing;
        if total == 0 {
            return 100.0;
        }
        self.total_covered as f64 / total as f64 * 100.0
    }

    /// Number of files with at least one missing line.
    pub fn files_with_gaps(&self) -> usize {
        self.files
            .values()
            .filter(|f| !f.missing_lines.is_empty())
            .count()
    }
}

/// Coverage facts for a single source file.
#[derive(Debug, Clone, Default)]
pub struct FileCoverage {
    pub path: String,
    pub covered_lines: BTreeSet<usize>,
    pub missing_lines: BTreeSet<usize>,
    pub excluded_lines: BTreeSet<usize>,
    /// Missing branch edges as (from_line, to_line) pairs, in report order
    pub missing_branches: Vec<(usize, i64)>,
}

impl FileCoverage {
    /// Line coverage percentage for this file; 100.0 when there are no lines.
    pub fn coverage_percent(&self) -> f64 {
        let total = self.covered_lines.len() + self.missing_lines.len();
        if total == 0 {
            return 100.0;
        }
        self.covered_lines.len() as f64 / total as f64 * 100.0
    }
}

#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(default)]
    files: BTreeMap<String, RawFile>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    #[serde(default)]
    executed_lines: Vec<usize>,
    #[serde(default)]
    missing_lines: Vec<usize>,
    #[serde(default)]
    excluded_lines: Vec<usize>,
    /// Keyed by from-line; keys that do not parse as integers are skipped
    #[serde(default)]
    missing_branches: serde_json::Map<String, serde_json::Value>,
}

/// Parse a coverage.py JSON document from a string.
pub fn parse_coveragepy_json(content: &str) -> Result<CoverageReport, CoverageError> {
    let raw: RawReport = serde_json::from_str(content)?;
    Ok(build_report(raw))
}

/// Parse a coverage.py JSON document already deserialized as a value
/// (used by the MCP adapter for inline payloads).
pub fn parse_coveragepy_value(value: &serde_json::Value) -> Result<CoverageReport, CoverageError> {
    let raw: RawReport = serde_json::from_value(value.clone())?;
    Ok(build_report(raw))
}

fn build_report(raw: RawReport) -> CoverageReport {
    let mut report = CoverageReport::default();

    for (path, file) in raw.files {
        let covered_lines: BTreeSet<usize> = file.executed_lines.into_iter().collect();
        let missing_lines: BTreeSet<usize> = file.missing_lines.into_iter().collect();
        let excluded_lines: BTreeSet<usize> = file.excluded_lines.into_iter().collect();

        // Malformed branch entries must not abort the parse.
        let mut missing_branches = Vec::new();
        for (key, targets) in &file.missing_branches {
            let Ok(from_line) = key.parse::<usize>() else {
                continue;
            };
            let Some(targets) = targets.as_array() else {
                continue;
            };
            for target in targets {
                if let Some(to_line) = target.as_i64() {
                    missing_branches.push((from_line, to_line));
                }
            }
        }

        report.total_covered += covered_lines.len() as u64;
        report.total_missing += missing_lines.len() as u64;
        report.files.insert(
            path.clone(),
            FileCoverage {
                path,
                covered_lines,
                missing_lines,
                excluded_lines,
                missing_branches,
            },
        );
    }

    report
}
