//! Command-line front end for [`allium_lint`].

use std::path::PathBuf;
use std::process::ExitCode;

use allium_lint::{analyze_file, Finding, Report, RuleFilter, Severity};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Semantic validator for Allium specification documents.
#[derive(Debug, Parser)]
#[command(name = "allium-lint", version, about)]
struct Cli {
    /// Specification documents to analyze.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Run schema validation only, skipping the semantic pass registry.
    #[arg(long)]
    schema_only: bool,

    /// Restrict to specific rule numbers (e.g. `RULE-01`). May be repeated.
    #[arg(long = "rule", value_name = "RULE-NN")]
    rules: Vec<String>,

    /// Treat warnings as failures for the purposes of the exit code.
    #[arg(long)]
    strict: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(exit) => exit,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let filter = if cli.rules.is_empty() {
        RuleFilter::all()
    } else {
        RuleFilter::only(cli.rules.clone())
    };

    let mut reports = Vec::with_capacity(cli.paths.len());
    for path in &cli.paths {
        let report = analyze_file(path, &filter, cli.schema_only)
            .with_context(|| format!("loading {}", path.display()))?;
        reports.push(report);
    }

    match cli.format {
        Format::Text => print_text(&reports),
        Format::Json => print_json(&reports)?,
    }

    let failed = reports.iter().any(|r| r.has_errors() || (cli.strict && r.has_warnings()));
    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn print_text(reports: &[Report]) {
    for report in reports {
        println!("{}", report.file.bold());
        if !report.schema_valid {
            println!("  {} document failed schema validation", "SCHEMA".red().bold());
        }
        for finding in &report.errors {
            print_finding(finding);
        }
        for finding in &report.warnings {
            print_finding(finding);
        }
        if report.errors.is_empty() && report.warnings.is_empty() {
            println!("  {}", "no findings".green());
        }
        println!(
            "  {} error(s), {} warning(s)",
            report.summary.error_count, report.summary.warning_count
        );
    }
}

fn print_finding(finding: &Finding) {
    let (tag, rule) = match finding.severity {
        Severity::Error => ("error".red().bold(), finding.rule.red()),
        Severity::Warning => ("warning".yellow().bold(), finding.rule.yellow()),
    };
    println!("  {tag}[{rule}] {} ({})", finding.message, finding.location.path.dimmed());
}

fn print_json(reports: &[Report]) -> Result<()> {
    let value = if reports.len() == 1 {
        serde_json::to_value(&reports[0])?
    } else {
        serde_json::to_value(reports)?
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
