//! Report generation for run results
//!
//! Render a model comparison as plain text or markdown.

use std::fmt::{self, Write};

use anyhow::Result;

use crate::models::PromptResult;
use crate::results::compare::{Agreement, ModelComparator, RunComparison};

/// Report generator
pub struct ReportGenerator;

impl ReportGenerator {
    /// Generate a comparison report for one run's results
    pub fn run_report(run_id: &str, results: &[PromptResult], format: ReportFormat) -> Result<String> {
        let comparison = ModelComparator::compare(results);
        let mut output = String::new();
        match format {
            ReportFormat::Text => format_text(&mut output, run_id, &comparison)?,
            ReportFormat::Markdown => format_markdown(&mut output, run_id, &comparison)?,
        }
        Ok(output)
    }
}

fn format_text(out: &mut String, run_id: &str, comparison: &RunComparison) -> fmt::Result {
    writeln!(out, "\n{:=^70}", " Model Comparison Report ")?;
    writeln!(out)?;
    writeln!(out, "Run ID: {run_id}")?;
    writeln!(out, "Models: {}", comparison.summary.model_count)?;
    writeln!(out, "Tests: {}", comparison.summary.test_count)?;
    writeln!(out)?;

    writeln!(out, "{:-^70}", " Per-Model Statistics ")?;
    writeln!(
        out,
        "{:<22} {:>6} {:>6} {:>8} {:>9} {:>9}",
        "Model", "OK", "Err", "Checks", "Avg(ms)", "Max(ms)"
    )?;
    writeln!(out, "{:-<70}", "")?;
    for model in &comparison.models {
        let Some(stats) = comparison.model_stats.get(model) else {
            continue;
        };
        writeln!(
            out,
            "{:<22} {:>6} {:>6} {:>8} {:>9} {:>9}",
            truncate(model, 22),
            stats.succeeded,
            stats.errors,
            format!("{}/{}", stats.checks_passed, stats.checks_passed + stats.checks_failed),
            stats.avg_latency_ms,
            stats.max_latency_ms
        )?;
    }

    writeln!(out, "\n{:-^70}", " Rankings ")?;
    writeln!(out, "\nBy success rate:")?;
    for r in &comparison.rankings.by_success_rate {
        writeln!(out, "  {}. {:<30} {:.1}%", r.rank, r.model, r.value * 100.0)?;
    }
    writeln!(out, "\nBy average latency:")?;
    for r in &comparison.rankings.by_latency {
        writeln!(out, "  {}. {:<30} {:.0}ms", r.rank, r.model, r.value)?;
    }
    if !comparison.rankings.by_checks.is_empty() {
        writeln!(out, "\nBy expected-answer checks:")?;
        for r in &comparison.rankings.by_checks {
            writeln!(out, "  {}. {:<30} {:.1}%", r.rank, r.model, r.value * 100.0)?;
        }
    }

    writeln!(out, "\n{:-^70}", " Per-Test Comparison ")?;
    for test in &comparison.test_comparisons {
        writeln!(
            out,
            "\n{} [{}] fastest: {}",
            test.test_id,
            agreement_label(test.agreement),
            test.fastest.as_deref().unwrap_or("-")
        )?;
        for model in &comparison.models {
            let Some(outcome) = test.outcomes.get(model) else {
                continue;
            };
            let status = match (&outcome.error, outcome.check) {
                (Some(_), _) => "ERROR".to_string(),
                (None, Some(check)) => check.to_string(),
                (None, None) => "OK".to_string(),
            };
            let detail = match &outcome.error {
                Some(err) => err.clone(),
                None => preview(&outcome.answer, 36),
            };
            writeln!(
                out,
                "  {:<22} {:>5} {:>8}ms  {}",
                truncate(model, 22),
                status,
                outcome.latency_ms,
                detail
            )?;
        }
    }

    let summary = &comparison.summary;
    writeln!(out, "\n{:-^70}", " Summary ")?;
    writeln!(out, "Most reliable: {}", summary.most_reliable.as_deref().unwrap_or("N/A"))?;
    writeln!(out, "Fastest: {}", summary.fastest.as_deref().unwrap_or("N/A"))?;
    writeln!(out, "Most accurate: {}", summary.most_accurate.as_deref().unwrap_or("N/A"))?;
    writeln!(
        out,
        "Unanimous: {}  Split: {}  No answers: {}",
        summary.unanimous, summary.split, summary.all_failed
    )?;
    writeln!(out, "\n{:=^70}", "")
}

fn format_markdown(out: &mut String, run_id: &str, comparison: &RunComparison) -> fmt::Result {
    let summary = &comparison.summary;

    writeln!(out, "# Model Comparison Report\n")?;
    writeln!(out, "## Summary\n")?;
    writeln!(out, "| Metric | Value |")?;
    writeln!(out, "|--------|-------|")?;
    writeln!(out, "| Run ID | `{run_id}` |")?;
    writeln!(out, "| Models Compared | {} |", summary.model_count)?;
    writeln!(out, "| Tests Compared | {} |", summary.test_count)?;
    writeln!(out, "| Most Reliable | {} |", cell(summary.most_reliable.as_deref().unwrap_or("N/A")))?;
    writeln!(out, "| Fastest | {} |", cell(summary.fastest.as_deref().unwrap_or("N/A")))?;
    writeln!(out, "| Most Accurate | {} |", cell(summary.most_accurate.as_deref().unwrap_or("N/A")))?;

    writeln!(out, "\n## Per-Model Statistics\n")?;
    writeln!(out, "| Model | Calls | Errors | Checks Passed | Avg (ms) | Min (ms) | Max (ms) |")?;
    writeln!(out, "|-------|-------|--------|---------------|----------|----------|----------|")?;
    for model in &comparison.models {
        let Some(stats) = comparison.model_stats.get(model) else {
            continue;
        };
        writeln!(
            out,
            "| {} | {} | {} | {}/{} | {} | {} | {} |",
            cell(model),
            stats.calls,
            stats.errors,
            stats.checks_passed,
            stats.checks_passed + stats.checks_failed,
            stats.avg_latency_ms,
            stats.min_latency_ms,
            stats.max_latency_ms
        )?;
    }

    writeln!(out, "\n## Rankings by Success Rate\n")?;
    writeln!(out, "| Rank | Model | Success Rate |")?;
    writeln!(out, "|------|-------|--------------|")?;
    for r in &comparison.rankings.by_success_rate {
        writeln!(out, "| {} | {} | {:.1}% |", r.rank, cell(&r.model), r.value * 100.0)?;
    }

    writeln!(out, "\n## Rankings by Latency\n")?;
    writeln!(out, "| Rank | Model | Avg Latency |")?;
    writeln!(out, "|------|-------|-------------|")?;
    for r in &comparison.rankings.by_latency {
        writeln!(out, "| {} | {} | {:.0}ms |", r.rank, cell(&r.model), r.value)?;
    }

    writeln!(out, "\n## Fastest Answers\n")?;
    writeln!(out, "| Model | Wins |")?;
    writeln!(out, "|-------|------|")?;
    for (model, wins) in &comparison.rankings.wins {
        writeln!(out, "| {} | {wins} |", cell(model))?;
    }

    writeln!(out, "\n## Per-Test Results\n")?;
    write!(out, "| Test | Agreement |")?;
    for model in &comparison.models {
        write!(out, " {} |", cell(model))?;
    }
    writeln!(out)?;
    write!(out, "|------|-----------|")?;
    for _ in &comparison.models {
        write!(out, "------|")?;
    }
    writeln!(out)?;
    for test in &comparison.test_comparisons {
        write!(out, "| {} | {} |", cell(&test.test_id), agreement_label(test.agreement))?;
        for model in &comparison.models {
            match test.outcomes.get(model) {
                Some(o) if o.error.is_some() => write!(out, " error |")?,
                Some(o) => {
                    let marker = if test.fastest.as_deref() == Some(model.as_str()) {
                        " **fastest**"
                    } else {
                        ""
                    };
                    let check = o.check.map(|c| format!("{c} ")).unwrap_or_default();
                    write!(out, " {}{}ms{} |", check, o.latency_ms, marker)?
                }
                None => write!(out, " - |")?,
            }
        }
        writeln!(out)?;
    }

    writeln!(out, "\n## Answer Agreement\n")?;
    writeln!(out, "- **Unanimous:** {} tests", summary.unanimous)?;
    writeln!(out, "- **Split:** {} tests", summary.split)?;
    writeln!(out, "- **No answers:** {} tests", summary.all_failed)
}

fn agreement_label(agreement: Agreement) -> String {
    match agreement {
        Agreement::Unanimous => "unanimous".to_string(),
        Agreement::Split { distinct } => format!("split {distinct} ways"),
        Agreement::Insufficient => "n/a".to_string(),
    }
}

/// Report output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Markdown => "md",
        }
    }
}

/// Escape a value for a markdown table cell
fn cell(s: &str) -> String {
    s.replace('|', "\\|")
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

fn preview(answer: &str, max_len: usize) -> String {
    truncate(&answer.split_whitespace().collect::<Vec<_>>().join(" "), max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestCase;

    fn sample() -> Vec<PromptResult> {
        let t1 = TestCase::new("t1", "2+2?").with_expected("4");
        let t2 = TestCase::new("t2", "capital of France?");
        vec![
            PromptResult::success("run", &t1, "deepseek-r1", "4", None, 900),
            PromptResult::success("run", &t1, "o3-mini", "5", None, 300),
            PromptResult::success("run", &t2, "deepseek-r1", "Paris", None, 800),
            PromptResult::failure("run", &t2, "o3-mini", "Timeout after 5 seconds", 5000),
        ]
    }

    #[test]
    fn test_text_report() {
        let report = ReportGenerator::run_report("run", &sample(), ReportFormat::Text).unwrap();
        assert!(report.contains("Model Comparison Report"));
        assert!(report.contains("Run ID: run"));
        assert!(report.contains("t1 [split 2 ways] fastest: o3-mini"));
        assert!(report.contains("Timeout after 5 seconds"));
        assert!(report.contains("Most reliable: deepseek-r1"));
        assert!(report.contains("Most accurate: deepseek-r1"));
    }

    #[test]
    fn test_markdown_report() {
        let report = ReportGenerator::run_report("run", &sample(), ReportFormat::Markdown).unwrap();
        assert!(report.starts_with("# Model Comparison Report"));
        assert!(report.contains("| Test | Agreement | deepseek-r1 | o3-mini |"));
        assert!(report.contains("| t1 | split 2 ways | PASS 900ms | FAIL 300ms **fastest** |"));
        assert!(report.contains("| t2 | n/a | 800ms **fastest** | error |"));
    }

    #[test]
    fn test_markdown_escapes_pipes() {
        let case = TestCase::new("a|b", "2+2?");
        let results = vec![PromptResult::success("run", &case, "local|r1", "4", None, 10)];
        let report = ReportGenerator::run_report("run", &results, ReportFormat::Markdown).unwrap();
        assert!(report.contains("| Test | Agreement | local\\|r1 |"));
        assert!(report.contains("| a\\|b | n/a |"));
        assert!(report.contains("| local\\|r1 | 1 | 0 |"));
        assert!(!report.contains("local|r1"));
    }

    #[test]
    fn test_empty_report() {
        let report = ReportGenerator::run_report("run", &[], ReportFormat::Text).unwrap();
        assert!(report.contains("Tests: 0"));
        assert!(report.contains("Most reliable: N/A"));
    }

    #[test]
    fn test_report_format() {
        assert_eq!(ReportFormat::from_str("text"), Some(ReportFormat::Text));
        assert_eq!(ReportFormat::from_str("MD"), Some(ReportFormat::Markdown));
        assert!(ReportFormat::from_str("html").is_none());
        assert_eq!(ReportFormat::Markdown.extension(), "md");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
    }
}
