use std::io::{self, Write};

use serde::Serialize;

use crate::conservation::{ComparisonReport, Mismatch};
use crate::verify::{BatchReport, Outcome, ProgressEvent, ProgressSink};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &BatchReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_comparison(report: &ComparisonReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct TextOutput;

impl TextOutput {
    pub fn render_report(report: &BatchReport) -> String {
        let mut out = String::new();
        for result in &report.results {
            match &result.outcome {
                Outcome::Agreed => {
                    out.push_str(&format!(
                        "{} ({}): all Conservation values match.\n",
                        result.name, result.id
                    ));
                }
                Outcome::Mismatched { mismatches } => {
                    out.push_str(&format!(
                        "\n=== {} ({}) has {} mismatch(es) ===\n",
                        result.name,
                        result.id,
                        mismatches.len()
                    ));
                    for mismatch in mismatches {
                        out.push_str(&render_mismatch(mismatch));
                        out.push('\n');
                    }
                }
                Outcome::Skipped { reason } => {
                    out.push_str(&format!("Skipping pham {}: {reason}\n", result.id));
                }
                Outcome::Invalid { reason } => {
                    out.push_str(&format!("Invalid pham {}: {reason}\n", result.id));
                }
            }
        }
        out.push('\n');
        out.push_str(&report.summary_line());
        out.push('\n');
        out
    }

    pub fn render_comparison(report: &ComparisonReport) -> String {
        if report.is_agreement() {
            return format!("{}: all Conservation values match.\n", report.name);
        }
        let mut out = format!(
            "=== {} has {} mismatch(es) ===\n",
            report.name,
            report.mismatches.len()
        );
        for mismatch in &report.mismatches {
            out.push_str(&render_mismatch(mismatch));
            out.push('\n');
        }
        out
    }
}

/// Logs progress events through `tracing` so they land on stderr.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => tracing::info!(elapsed = ?elapsed, "{}", event.message),
            None => tracing::info!("{}", event.message),
        }
    }
}

pub fn render_mismatch(mismatch: &Mismatch) -> String {
    format!(
        "  start {}: {} stored={} recomputed={}",
        mismatch.start,
        mismatch.issue,
        render_value(mismatch.stored),
        render_value(mismatch.recomputed)
    )
}

fn render_value(value: Option<f64>) -> String {
    value.map_or_else(|| "none".to_string(), |value| value.to_string())
}
