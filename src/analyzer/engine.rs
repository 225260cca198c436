//! Pipeline orchestrator - run the analyzer and generator over every file
//! in a parsed coverage report.

use crate::analyzer::GapAnalyzer;
use crate::coverage::{CoverageReport, FileCoverage};
use crate::suggest::GapSuggestionGenerator;
use crate::{GapSuggestion, Priority};
use rayon::prelude::*;
use std::path::PathBuf;

/// Orchestrates per-file gap analysis for a coverage report.
///
/// Each file's analysis is independent; the parallel variant buffers
/// per-file results and concatenates them in sorted-path order, so its
/// output is identical to the sequential run.
pub struct GapEngine {
    source_root: Option<PathBuf>,
    parallel: bool,
}

impl GapEngine {
    pub fn new() -> Self {
        Self {
            source_root: None,
            parallel: false,
        }
    }

    /// Resolve report paths against this root directory.
    pub fn with_source_root(mut self, root: PathBuf) -> Self {
        self.source_root = Some(root);
        self
    }

    /// Run the per-file loop on the rayon thread pool.
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    /// Analyze every file with missing lines. Returns the concatenated
    /// per-file suggestion lists (each internally sorted by the generator)
    /// and one warning per unreadable source file.
    pub fn run(&self, report: &CoverageReport) -> (Vec<GapSuggestion>, Vec<String>) {
        let targets: Vec<(&String, &FileCoverage)> = report
            .files
            .iter()
            .filter(|(_, coverage)| !coverage.missing_lines.is_empty())
            .collect();

        let results: Vec<Result<Vec<GapSuggestion>, String>> = if self.parallel {
            targets
                .par_iter()
                .map(|(path, coverage)| self.analyze_file(path, coverage))
                .collect()
        } else {
            targets
                .iter()
                .map(|(path, coverage)| self.analyze_file(path, coverage))
                .collect()
        };

        let mut suggestions = Vec::new();
        let mut warnings = Vec::new();
        for result in results {
            match result {
                Ok(file_suggestions) => suggestions.extend(file_suggestions),
                Err(warning) => warnings.push(warning),
            }
        }
        (suggestions, warnings)
    }

    /// Analyze one source file; an unreadable file yields its warning
    /// string instead of aborting the run.
    fn analyze_file(
        &self,
        file_path: &str,
        coverage: &FileCoverage,
    ) -> Result<Vec<GapSuggestion>, String> {
        let actual_path = match &self.source_root {
            Some(root) => root.join(file_path),
            None => PathBuf::from(file_path),
        };

        let bytes = std::fs::read(&actual_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                format!("Source file not found: {}", actual_path.display())
            }
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied reading: {}", actual_path.display())
            }
            _ => format!("Error reading {}: {}", actual_path.display(), e),
        })?;
        // Best-effort decoding: invalid UTF-8 is replaced, never fatal
        let source = String::from_utf8_lossy(&bytes);

        let missing = coverage.missing_lines.iter().copied().collect();
        let mut analyzer = GapAnalyzer::new(&source, missing);
        let blocks = analyzer.analyze(file_path);

        let generator = GapSuggestionGenerator::new();
        Ok(generator.generate(&blocks, file_path))
    }
}

impl Default for GapEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep only suggestions at or above the given severity.
pub fn filter_by_priority(suggestions: Vec<GapSuggestion>, minimum: Priority) -> Vec<GapSuggestion> {
    suggestions
        .into_iter()
        .filter(|s| s.priority <= minimum)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::parse_coveragepy_json;
    use crate::BlockType;
    use std::io::Write;
    use std::path::Path;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn report_for(path: &str, missing: &[usize]) -> CoverageReport {
        let json = serde_json::json!({
            "files": {
                path: {
                    "executed_lines": [1],
                    "missing_lines": missing,
                    "excluded_lines": []
                }
            }
        });
        parse_coveragepy_json(&json.to_string()).unwrap()
    }

    #[test]
    fn missing_source_file_becomes_warning() {
        let report = report_for("nonexistent.py", &[2]);
        let (suggestions, warnings) = GapEngine::new().run(&report);

        assert!(suggestions.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("not found"));
    }

    #[test]
    fn file_without_missing_lines_is_skipped() {
        let report = report_for("nonexistent.py", &[]);
        let (suggestions, warnings) = GapEngine::new().run(&report);
        assert!(suggestions.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn source_root_resolves_relative_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        write_file(dir.path(), "module.py", "def foo():\n    return 42\n");

        let report = report_for("module.py", &[2]);
        let (suggestions, warnings) = GapEngine::new()
            .with_source_root(dir.path().to_path_buf())
            .run(&report);

        assert!(warnings.is_empty());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].block_type, BlockType::ReturnStatement);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("module.py");
        std::fs::write(&path, b"def foo():\n    return \xff\xfe\n").unwrap();

        let report = report_for("module.py", &[2]);
        let (_, warnings) = GapEngine::new()
            .with_source_root(dir.path().to_path_buf())
            .run(&report);
        assert!(warnings.is_empty());
    }

    #[test]
    fn parallel_output_matches_sequential() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = "def foo(x):\n    if x < 0:\n        raise ValueError(\"negative\")\n    return x\n";
        for name in ["a.py", "b.py", "c.py"] {
            write_file(dir.path(), name, source);
        }
        let json = serde_json::json!({
            "files": {
                "a.py": {"missing_lines": [3]},
                "b.py": {"missing_lines": [3, 4]},
                "c.py": {"missing_lines": [2, 3]}
            }
        });
        let report = parse_coveragepy_json(&json.to_string()).unwrap();

        let sequential = GapEngine::new()
            .with_source_root(dir.path().to_path_buf())
            .run(&report);
        let parallel = GapEngine::new()
            .with_source_root(dir.path().to_path_buf())
            .parallel()
            .run(&report);

        let seq_names: Vec<&str> = sequential.0.iter().map(|s| s.test_name.as_str()).collect();
        let par_names: Vec<&str> = parallel.0.iter().map(|s| s.test_name.as_str()).collect();
        assert_eq!(seq_names, par_names);
        assert_eq!(sequential.1, parallel.1);
    }

    #[test]
    fn filter_keeps_at_or_above_severity() {
        let make = |priority: Priority| GapSuggestion {
            test_name: format!("test_{priority}"),
            test_file: "tests/test_a.py".to_string(),
            description: String::new(),
            covers_lines: vec![1],
            priority,
            code_template: String::new(),
            setup_hints: vec![],
            block_type: BlockType::CodeBlock,
        };
        let all = vec![
            make(Priority::Critical),
            make(Priority::High),
            make(Priority::Medium),
            make(Priority::Low),
        ];

        let filtered = filter_by_priority(all, Priority::High);
        let kept: Vec<Priority> = filtered.iter().map(|s| s.priority).collect();
        assert_eq!(kept, vec![Priority::Critical, Priority::High]);
    }
}
