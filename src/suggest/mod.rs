//! Suggestion generator - turn uncovered blocks into prioritized test
//! suggestions with deterministic names, paths, and ordering.

mod hints;
mod templates;

pub use hints::setup_hints;
pub use templates::render_template;

use crate::{BlockType, GapSuggestion, Priority, UncoveredBlock};
use regex::Regex;
use std::path::{Component, Path};

/// Generates test suggestions from uncovered blocks.
pub struct GapSuggestionGenerator;

impl GapSuggestionGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate one suggestion per block, sorted by (priority, test file,
    /// first covered line) so output is stable regardless of input order.
    pub fn generate(&self, blocks: &[UncoveredBlock], file_path: &str) -> Vec<GapSuggestion> {
        let mut suggestions: Vec<GapSuggestion> = blocks
            .iter()
            .map(|block| self.create_suggestion(block, file_path))
            .collect();

        suggestions.sort_by(|a, b| {
            (a.priority, &a.test_file, a.covers_lines.first()).cmp(&(
                b.priority,
                &b.test_file,
                b.covers_lines.first(),
            ))
        });

        suggestions
    }

    fn create_suggestion(&self, block: &UncoveredBlock, file_path: &str) -> GapSuggestion {
        let test_name = self.test_name(block);
        let code_template = render_template(block, &test_name);

        GapSuggestion {
            test_name,
            test_file: suggest_test_file(file_path),
            description: self.description(block),
            covers_lines: (block.start_line..=block.end_line).collect(),
            priority: self.determine_priority(block),
            code_template,
            setup_hints: setup_hints(&block.code_snippet),
            block_type: block.block_type,
        }
    }

    /// Build a descriptive test name: test_{class}_{function}_{suffix}.
    pub fn test_name(&self, block: &UncoveredBlock) -> String {
        let mut parts = vec!["test".to_string()];

        if let Some(class_name) = &block.class_name {
            parts.push(to_snake_case(class_name));
        }
        if let Some(function_name) = &block.function_name {
            parts.push(function_name.clone());
        }
        if let Some(suffix) = block.block_type.test_name_suffix() {
            parts.push(suffix.to_string());
        }

        parts.join("_")
    }

    fn determine_priority(&self, block: &UncoveredBlock) -> Priority {
        match block.block_type {
            BlockType::ExceptionHandler | BlockType::RaiseStatement => Priority::Critical,
            BlockType::IfTrueBranch | BlockType::IfFalseBranch => Priority::High,
            _ if block.function_name.is_some() => Priority::Medium,
            _ => Priority::Low,
        }
    }

    fn description(&self, block: &UncoveredBlock) -> String {
        let mut parts = Vec::new();

        if let Some(function_name) = &block.function_name {
            match &block.class_name {
                Some(class_name) => parts.push(format!("In {class_name}.{function_name}()")),
                None => parts.push(format!("In {function_name}()")),
            }
        }

        parts.push(format!("lines {}-{}", block.start_line, block.end_line));

        if let Some(condition) = &block.condition {
            parts.push(format!("- {condition}"));
        }

        parts.join(" ")
    }
}

impl Default for GapSuggestionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Suggest a test file path that avoids collisions between same-named
/// modules in different packages:
/// utils/validator.py -> tests/test_utils_validator.py, while uninformative
/// parents (src, lib, ., app) are skipped.
pub fn suggest_test_file(source_path: &str) -> String {
    let path = Path::new(source_path);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("module");

    let parts: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(os) => os.to_str(),
            Component::CurDir => Some("."),
            _ => None,
        })
        .collect();

    if parts.len() >= 2 {
        let parent = parts[parts.len() - 2];
        if !matches!(parent, "src" | "lib" | "." | "app") {
            return format!("tests/test_{parent}_{stem}.py");
        }
    }

    format!("tests/test_{stem}.py")
}

/// Convert CamelCase to snake_case, splitting acronym runs:
/// "HTTPHandler" -> "http_handler".
pub fn to_snake_case(name: &str) -> String {
    let acronym_boundary = Regex::new(r"(.)([A-Z][a-z]+)").unwrap();
    let case_boundary = Regex::new(r"([a-z0-9])([A-Z])").unwrap();

    let pass_one = acronym_boundary.replace_all(name, "${1}_${2}");
    case_boundary
        .replace_all(&pass_one, "${1}_${2}")
        .to_lowercase()
}
