//! `bastion` - checks infrastructure-as-code templates against a rule set
//!
//! ```bash
//! bastion analyze --template azuredeploy.json --rules rules.yaml
//! bastion analyze --template azuredeploy.json --rules rules.json --config bastion.yaml --format json
//! ```
//!
//! Exit code 0 when every rule passed, 1 when any rule failed, 2 when the inputs could not
//! be loaded.

mod logging;
mod output;

use anyhow::{Context, Result};
use bastion_rules::{Analyzer, AnalyzerConfig, Report, RuleSet};
use clap::{Parser, Subcommand};
use output::Format;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "bastion", version, about = "Rule-based analysis of IaC templates")]
struct Cli {
    /// Log level filter (e.g. `debug`, `bastion_rules=trace`); overrides RUST_LOG
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a template against a rule set
    Analyze(AnalyzeArgs),
}

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    /// Template to analyze (JSON)
    #[arg(long, short = 't', value_name = "PATH")]
    template: PathBuf,

    /// Rule set (`.json`, `.yaml` or `.yml`)
    #[arg(long, short = 'r', value_name = "PATH")]
    rules: PathBuf,

    /// Analyzer configuration (`.json`, `.yaml` or `.yml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long, short = 'f', value_enum, default_value_t = Format::Text)]
    format: Format,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.log_level.as_deref(), cli.log_json) {
        eprintln!("error: {e:#}");
        return ExitCode::from(2);
    }

    match cli.command {
        Command::Analyze(args) => match analyze(&args) {
            Ok(report) if report.passed() => ExitCode::SUCCESS,
            Ok(_) => ExitCode::from(1),
            Err(e) => {
                eprintln!("error: {e:#}");
                ExitCode::from(2)
            }
        },
    }
}

fn analyze(args: &AnalyzeArgs) -> Result<Report> {
    let config = match &args.config {
        Some(path) => AnalyzerConfig::from_path(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };

    let rules = RuleSet::from_path(&args.rules)
        .with_context(|| format!("Failed to load rules {}", args.rules.display()))?;
    tracing::info!(rules = rules.len(), path = %args.rules.display(), "Rules loaded");

    let analyzer = Analyzer::from_config(rules, &config).context("Invalid configuration")?;

    let text = std::fs::read_to_string(&args.template)
        .with_context(|| format!("Failed to read template {}", args.template.display()))?;
    let report = analyzer
        .analyze_str(&text)
        .with_context(|| format!("Failed to parse template {}", args.template.display()))?;

    tracing::info!(
        outcomes = report.outcomes.len(),
        failed = report.failure_count(),
        "Analysis finished"
    );

    let rendered = output::render(&report, args.format, &args.template.display().to_string())?;
    print!("{rendered}");
    Ok(report)
}
