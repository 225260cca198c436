//! JSON reporter for machine-readable output

use crate::coverage::CoverageReport;
use crate::{GapSuggestion, Priority};
use serde::Serialize;
use std::collections::BTreeMap;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
}

impl JsonReporter {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Render the analysis result as a single JSON document.
    pub fn report(
        &self,
        report: &CoverageReport,
        suggestions: &[GapSuggestion],
        warnings: &[String],
    ) -> String {
        let mut by_priority: BTreeMap<String, usize> = BTreeMap::new();
        for priority in Priority::ALL {
            by_priority.insert(
                priority.to_string(),
                suggestions.iter().filter(|s| s.priority == priority).count(),
            );
        }

        let output = JsonOutput {
            coverage_percent: report.coverage_percent(),
            files_analyzed: report.files.len(),
            files_with_gaps: report.files_with_gaps(),
            total_suggestions: suggestions.len(),
            by_priority,
            suggestions,
            warnings,
        };

        if self.pretty {
            serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string(&output).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    coverage_percent: f64,
    files_analyzed: usize,
    files_with_gaps: usize,
    total_suggestions: usize,
    by_priority: BTreeMap<String, usize>,
    suggestions: &'a [GapSuggestion],
    warnings: &'a [String],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::parse_coveragepy_json;
    use crate::BlockType;

    fn make_suggestion(priority: Priority) -> GapSuggestion {
        GapSuggestion {
            test_name: "test_foo_raises_error".to_string(),
            test_file: "tests/test_module.py".to_string(),
            description: "In foo() lines 3-3 - raise ValueError".to_string(),
            covers_lines: vec![3],
            priority,
            code_template: "def test_foo_raises_error():\n    pass\n".to_string(),
            setup_hints: vec![],
            block_type: BlockType::RaiseStatement,
        }
    }

    #[test]
    fn json_output_has_expected_keys() {
        let report = parse_coveragepy_json(
            r#"{"files": {"a.py": {"executed_lines": [1], "missing_lines": [3]}}}"#,
        )
        .unwrap();
        let suggestions = vec![make_suggestion(Priority::Critical)];
        let warnings = vec![];

        let json = JsonReporter::new().report(&report, &suggestions, &warnings);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["files_analyzed"], 1);
        assert_eq!(parsed["files_with_gaps"], 1);
        assert_eq!(parsed["total_suggestions"], 1);
        assert_eq!(parsed["by_priority"]["critical"], 1);
        assert_eq!(parsed["by_priority"]["low"], 0);
        assert_eq!(parsed["suggestions"][0]["test_name"], "test_foo_raises_error");
        assert!(parsed["warnings"].as_array().unwrap().is_empty());
    }

    #[test]
    fn pretty_output_is_indented() {
        let report = CoverageReport::default();
        let json = JsonReporter::new().pretty().report(&report, &[], &[]);
        assert!(json.contains('\n'));
        let _: serde_json::Value = serde_json::from_str(&json).unwrap();
    }
}
