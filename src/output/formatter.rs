//! Output formatters for prompt results
//!
//! Provides table, JSON, CSV and summary output formats.

use std::io::IsTerminal;

use crate::models::{PromptResult, RunSummary};
use crate::results::RunInfo;

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Formatter for stdout; colour only when it is a terminal
    pub fn for_stdout(format: OutputFormat) -> Self {
        let formatter = Self::new(format);
        if std::io::stdout().is_terminal() {
            formatter
        } else {
            formatter.no_color()
        }
    }

    fn format_result_table(&self, result: &PromptResult) -> String {
        let status = match (&result.error, result.check) {
            (Some(_), _) => self.paint("! ERROR", RED),
            (None, Some(check)) if check.is_pass() => self.paint("✓ PASS ", GREEN),
            (None, Some(_)) => self.paint("✗ FAIL ", RED),
            (None, None) => "• OK   ".to_string(),
        };

        let detail = match &result.error {
            Some(err) => err.clone(),
            None => result.answer_preview(40),
        };

        format!(
            "{:16} {:18} {} [{:>7}ms] {}",
            clip(&result.test_id, 16),
            clip(&result.model_name, 18),
            status,
            result.latency_ms,
            detail
        )
    }

    /// Format a run summary
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_summary_table(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Csv => to_csv(&summary.results),
            OutputFormat::Summary => self.format_summary_brief(summary),
        }
    }

    fn format_summary_table(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        output.push_str("\n╔══════════════════════════════════════════════════════════════════════════════╗\n");
        output.push_str(&format!("║  Run {:72}║\n", summary.run_id));
        output.push_str("╠══════════════════════════════════════════════════════════════════════════════╣\n");

        for result in &summary.results {
            output.push_str(&format!("  {}\n", self.format_result_table(result)));
        }

        output.push_str("╠══════════════════════════════════════════════════════════════════════════════╣\n");

        let ok_str = self.paint(&summary.succeeded.to_string(), GREEN);
        let err_str = if summary.errors > 0 {
            self.paint(&summary.errors.to_string(), RED)
        } else {
            summary.errors.to_string()
        };

        output.push_str(&format!(
            "  Total: {} | Ok: {} | Error: {} | Check pass: {} | Check fail: {}\n",
            summary.total, ok_str, err_str, summary.checks_passed, summary.checks_failed
        ));
        output.push_str(&format!(
            "  Success Rate: {:5.1}% | Latency: {}ms\n",
            summary.success_rate(),
            summary.total_latency_ms
        ));
        output.push_str("╚══════════════════════════════════════════════════════════════════════════════╝\n");

        output
    }

    fn format_summary_brief(&self, summary: &RunSummary) -> String {
        format!(
            "Run {}: {}/{} answered ({:.1}%), {} errors, checks {}/{} in {}ms",
            summary.run_id,
            summary.succeeded,
            summary.total,
            summary.success_rate(),
            summary.errors,
            summary.checks_passed,
            summary.checks_passed + summary.checks_failed,
            summary.total_latency_ms
        )
    }

    /// Format the stored-run listing
    pub fn format_runs(&self, runs: &[RunInfo]) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{:<24} {:<20} {:>7} {:>6}  {}\n",
            "RUN", "STARTED", "RESULTS", "ERRORS", "MODELS"
        ));
        output.push_str(&format!("{:-<90}\n", ""));

        for run in runs {
            let errors = if run.errors > 0 {
                self.paint(&format!("{:>6}", run.errors), RED)
            } else {
                format!("{:>6}", run.errors)
            };
            output.push_str(&format!(
                "{:<24} {:<20} {:>7} {}  {}\n",
                run.id,
                run.started_at.format("%Y-%m-%d %H:%M:%S"),
                run.records,
                errors,
                run.models.join(", ")
            ));
        }

        output
    }

    fn paint(&self, text: &str, color: &str) -> String {
        if self.colorize {
            format!("{color}{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";

fn to_csv(results: &[PromptResult]) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let _ = writer.write_record([
        "test_id",
        "model_name",
        "latency_ms",
        "check",
        "error",
        "response_text",
    ]);
    for result in results {
        let _ = writer.write_record([
            result.test_id.as_str(),
            result.model_name.as_str(),
            result.latency_ms.to_string().as_str(),
            result.check.map(|c| c.to_string()).unwrap_or_default().as_str(),
            result.error.as_deref().unwrap_or(""),
            result.response_text.as_str(),
        ]);
    }
    writer
        .into_inner()
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default()
}

fn clip(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
