//! Report rendering

use bastion_rules::Report;
use clap::ValueEnum;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// One line per failing result
    Text,
    /// The full report as JSON
    Json,
}

pub fn render(report: &Report, format: Format, template: &str) -> anyhow::Result<String> {
    match format {
        Format::Text => Ok(render_text(report, template)),
        Format::Json => {
            let mut json = serde_json::to_string_pretty(report)?;
            json.push('\n');
            Ok(json)
        }
    }
}

fn render_text(report: &Report, template: &str) -> String {
    let mut out = String::new();

    for outcome in report.failed_rules() {
        for result in outcome.failures() {
            let _ = writeln!(
                out,
                "{} {} line {}: {}",
                outcome.rule_id, outcome.severity, result.source_location.line_number, result.json_path
            );
        }
        if let Some(recommendation) = &outcome.recommendation {
            let _ = writeln!(out, "  {}", recommendation);
        }
    }

    let _ = writeln!(
        out,
        "{}: {} of {} rules failed",
        template,
        report.failure_count(),
        report.outcomes.len()
    );
    out
}
