//! Console reporter with colored output

use crate::coverage::CoverageReport;
use crate::{GapSuggestion, Priority};
use colored::Colorize;

/// Reporter for terminal output
pub struct ConsoleReporter {
    /// Whether to show full templates for every suggestion
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Enable verbose output
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Print the report summary banner.
    pub fn report_header(&self, report: &CoverageReport) {
        let total = report.total_covered + report.total_missing;
        println!();
        println!("{}", "=".repeat(60));
        println!("{}", "covgap - Coverage Gap Finder".bold());
        println!("{}", "=".repeat(60));
        println!(
            "Coverage: {:.1}% ({}/{} lines)",
            report.coverage_percent(),
            report.total_covered,
            total
        );
        println!("Files with gaps: {}", report.files_with_gaps());
    }

    /// Print warnings about files that could not be processed (capped).
    pub fn report_warnings(&self, warnings: &[String]) {
        if warnings.is_empty() {
            return;
        }
        println!("\n{} ({}):", "Warnings".yellow(), warnings.len());
        for warning in warnings.iter().take(5) {
            println!("  - {warning}");
        }
        if warnings.len() > 5 {
            println!("  ... and {} more", warnings.len() - 5);
        }
    }

    /// Print the suggestion listing: priority counts, then either the top
    /// ten or (verbose) every suggestion with its template.
    pub fn report_suggestions(&self, suggestions: &[GapSuggestion]) {
        if suggestions.is_empty() {
            println!("\nNo coverage gaps found - great job!");
            return;
        }

        println!("\nFound {} missing tests:", suggestions.len());
        for priority in Priority::ALL {
            let count = suggestions.iter().filter(|s| s.priority == priority).count();
            if count > 0 {
                println!("  - {}: {}", self.priority_label(priority), count);
            }
        }

        if self.verbose {
            self.print_full(suggestions);
        } else {
            self.print_top(suggestions);
        }
    }

    fn print_top(&self, suggestions: &[GapSuggestion]) {
        println!("\nTop suggestions:");
        for (i, s) in suggestions.iter().take(10).enumerate() {
            println!("  {}. {} {}", i + 1, priority_marker(s.priority), s.test_name);
            println!("       {}", s.description);
        }
        if suggestions.len() > 10 {
            println!(
                "\n  ... and {} more (use -v to see all)",
                suggestions.len() - 10
            );
        }
    }

    fn print_full(&self, suggestions: &[GapSuggestion]) {
        println!("\n{}", "=".repeat(70));
        println!("COVERAGE GAPS: {} tests needed", suggestions.len());
        println!("{}\n", "=".repeat(70));

        for (i, s) in suggestions.iter().enumerate() {
            println!(
                "{}. {} [{:8}] {}",
                i + 1,
                priority_marker(s.priority),
                self.priority_label(s.priority),
                s.test_name.bold()
            );
            println!("   File: {}", s.test_file);
            println!("   Covers: {}", s.description);

            if !s.setup_hints.is_empty() {
                println!("   Hints: {}", s.setup_hints.join(", "));
            }

            println!("\n   Template:");
            for line in s.code_template.lines() {
                println!("   {line}");
            }
            println!();
        }
    }

    fn priority_label(&self, priority: Priority) -> String {
        let label = priority.to_string().to_uppercase();
        match priority {
            Priority::Critical => label.red().bold().to_string(),
            Priority::High => label.yellow().to_string(),
            _ => label,
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical => "[!!]",
        Priority::High => "[! ]",
        _ => "[  ]",
    }
}
