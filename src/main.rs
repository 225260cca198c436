//! covgap: Coverage Gap Finder CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use covgap::analyzer::engine::filter_by_priority;
use covgap::analyzer::GapEngine;
use covgap::config::load_config;
use covgap::coverage::{load_coverage, CoverageError};
use covgap::reporter::{write_stub_file, ConsoleReporter, JsonReporter};
use covgap::Priority;
use std::path::PathBuf;
use std::process::ExitCode;

/// covgap: find coverage gaps and suggest the missing tests
#[derive(Parser, Debug)]
#[command(name = "covgap")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(subcommand_negates_reqs = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to coverage.json (from pytest --cov-report=json)
    #[arg(required = true)]
    coverage_json: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long, short)]
    json: bool,

    /// Show full test templates
    #[arg(long, short)]
    verbose: bool,

    /// Quiet mode (suppress the summary banner)
    #[arg(long, short)]
    quiet: bool,

    /// Write test stubs to this file
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Root directory for source files
    #[arg(long)]
    source_root: Option<PathBuf>,

    /// Keep only suggestions at or above this priority (critical, high, medium, low)
    #[arg(long)]
    priority: Option<String>,

    /// Limit number of suggestions
    #[arg(long)]
    limit: Option<usize>,

    /// Exit 2 when gaps at or above this severity exist (none, critical, high, any)
    #[arg(long, value_name = "SEVERITY")]
    fail_on: Option<String>,

    /// Analyze files in parallel
    #[arg(long)]
    parallel: bool,

    /// Number of parallel threads (default: number of CPU cores)
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,

    /// Path to config file (default: search .covgaprc.json in current dir and parents)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run MCP server for automation hosts (stdio JSON-RPC)
    Mcp,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();

    if let Some(Commands::Mcp) = args.command {
        covgap::mcp::run_mcp_server()?;
        return Ok(ExitCode::SUCCESS);
    }

    let coverage_json = args
        .coverage_json
        .clone()
        .expect("path required when not using subcommand");

    // Load config (CLI flags override config file)
    let work_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = load_config(&work_dir, args.config.as_deref())?.merge_with_cli(
        args.source_root.clone(),
        args.priority.clone(),
        args.fail_on.clone(),
        args.limit,
    );

    let report = match load_coverage(&coverage_json) {
        Ok(report) => report,
        Err(CoverageError::NotFound(path)) => {
            eprintln!("{}: Coverage file not found: {}", "Error".red().bold(), path);
            eprintln!("\nGenerate it with: pytest --cov=yourmodule --cov-report=json");
            return Ok(ExitCode::from(1));
        }
        Err(e) => {
            eprintln!(
                "{}: Failed to parse coverage file: {}",
                "Error".red().bold(),
                e
            );
            return Ok(ExitCode::from(1));
        }
    };

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let mut engine = GapEngine::new();
    if let Some(root) = &config.source_root {
        engine = engine.with_source_root(root.clone());
    }
    if args.parallel {
        engine = engine.parallel();
    }

    let (mut suggestions, warnings) = engine.run(&report);

    if let Some(name) = &config.priority {
        match Priority::parse(name) {
            Some(minimum) => suggestions = filter_by_priority(suggestions, minimum),
            None => anyhow::bail!(
                "Unknown priority: {name} (expected critical, high, medium, or low)"
            ),
        }
    }

    // The gate is decided on the filtered set before the display limit
    let gate_tripped = match config.fail_on.as_deref() {
        None | Some("none") => false,
        Some("any") => !suggestions.is_empty(),
        Some(name) => {
            let threshold = Priority::parse(name).map(|p| p.score()).unwrap_or(0);
            suggestions.iter().any(|s| s.priority.score() >= threshold)
        }
    };

    if let Some(limit) = config.limit {
        suggestions.truncate(limit);
    }

    if args.json {
        let reporter = JsonReporter::new().pretty();
        println!("{}", reporter.report(&report, &suggestions, &warnings));
    } else {
        let mut reporter = ConsoleReporter::new();
        if args.verbose {
            reporter = reporter.verbose();
        }
        if !args.quiet {
            reporter.report_header(&report);
        }
        if args.verbose {
            reporter.report_warnings(&warnings);
        }
        reporter.report_suggestions(&suggestions);
    }

    if let Some(output_path) = &args.output {
        write_stub_file(output_path, &suggestions)?;
        if !args.quiet && !args.json {
            println!(
                "\nWrote {} test stubs to {}",
                suggestions.len(),
                output_path.display()
            );
        }
    }

    if gate_tripped {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}
