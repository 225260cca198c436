//! Covgap: Coverage Gap Analyzer for Python
//!
//! This library reads coverage.py JSON reports, walks the syntax tree of
//! each file with uncovered lines, and turns every uncovered construct into
//! a specific, prioritized test suggestion with a pytest template.

pub mod analyzer;
pub mod config;
pub mod coverage;
pub mod mcp;
pub mod parser;
pub mod reporter;
pub mod suggest;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Severity ranking used for sorting and pass/fail gating.
///
/// Declaration order gives the total order critical < high < medium < low,
/// so `Ord` sorts most-severe first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Numeric severity score (critical=3 .. low=0) used by gating thresholds.
    pub fn score(&self) -> u8 {
        match self {
            Priority::Critical => 3,
            Priority::High => 2,
            Priority::Medium => 1,
            Priority::Low => 0,
        }
    }

    /// Parse a lowercase priority name; unknown names return None.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "critical" => Some(Priority::Critical),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Critical => write!(f, "critical"),
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// Classification of an uncovered source region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    IfTrueBranch,
    IfFalseBranch,
    ExceptionHandler,
    ReturnStatement,
    RaiseStatement,
    ForLoop,
    WhileLoop,
    /// Line-based fallback grouping when the source cannot be parsed
    CodeBlock,
    Unknown,
}

impl BlockType {
    /// Test-name suffix for this block type; CodeBlock/Unknown contribute none.
    pub fn test_name_suffix(&self) -> Option<&'static str> {
        match self {
            BlockType::IfTrueBranch => Some("when_condition_true"),
            BlockType::IfFalseBranch => Some("when_condition_false"),
            BlockType::ExceptionHandler => Some("handles_exception"),
            BlockType::RaiseStatement => Some("raises_error"),
            BlockType::ReturnStatement => Some("returns_early"),
            BlockType::ForLoop => Some("iterates_items"),
            BlockType::WhileLoop => Some("loops_until_done"),
            BlockType::CodeBlock | BlockType::Unknown => None,
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockType::IfTrueBranch => write!(f, "if_true_branch"),
            BlockType::IfFalseBranch => write!(f, "if_false_branch"),
            BlockType::ExceptionHandler => write!(f, "exception_handler"),
            BlockType::ReturnStatement => write!(f, "return_statement"),
            BlockType::RaiseStatement => write!(f, "raise_statement"),
            BlockType::ForLoop => write!(f, "for_loop"),
            BlockType::WhileLoop => write!(f, "while_loop"),
            BlockType::CodeBlock => write!(f, "code_block"),
            BlockType::Unknown => write!(f, "unknown"),
        }
    }
}

/// One semantically-classified uncovered region of one file.
///
/// Produced by the gap analyzer, consumed immediately by the suggestion
/// generator; not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct UncoveredBlock {
    /// Path of the analyzed source file (as it appears in the report)
    pub file_path: String,
    /// First line of the region (1-indexed, inclusive)
    pub start_line: usize,
    /// Last line of the region (1-indexed, inclusive)
    pub end_line: usize,
    /// Enclosing function or method name, if known
    pub function_name: Option<String>,
    /// Enclosing class name, if known
    pub class_name: Option<String>,
    /// Verbatim source lines of the region
    pub code_snippet: String,
    pub block_type: BlockType,
    /// Human-readable trigger, e.g. "when x > 0 is True" or "raise ValueError"
    pub condition: Option<String>,
}

/// One actionable recommendation: the test a developer should write to
/// exercise one uncovered block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapSuggestion {
    /// Deterministic test identifier, e.g. test_validator_validate_handles_exception
    pub test_name: String,
    /// Suggested test file path, derived from the source path
    pub test_file: String,
    pub description: String,
    /// Full inclusive line range of the source block
    pub covers_lines: Vec<usize>,
    pub priority: Priority,
    /// pytest skeleton with TODO placeholders
    pub code_template: String,
    #[serde(default)]
    pub setup_hints: Vec<String>,
    pub block_type: BlockType,
}

/// Public API: find what tests are missing based on a coverage.py report.
///
/// * `report_path` - path to coverage.json (from `pytest --cov-report=json`)
/// * `source_root` - optional root directory for resolving source paths
///
/// Returns `(suggestions, warnings)`: suggestions sorted per file by
/// priority, and one warning string per source file that could not be read.
pub fn find_coverage_gaps(
    report_path: &Path,
    source_root: Option<&Path>,
) -> Result<(Vec<GapSuggestion>, Vec<String>), coverage::CoverageError> {
    let report = coverage::load_coverage(report_path)?;
    let mut engine = analyzer::GapEngine::new();
    if let Some(root) = source_root {
        engine = engine.with_source_root(root.to_path_buf());
    }
    Ok(engine.run(&report))
}
