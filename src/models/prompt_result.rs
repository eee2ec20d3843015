//! Prompt result models
//!
//! One record per (test case, backend) pair, plus the per-run summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::test_case::{CheckOutcome, TestCase};

/// Recorded outcome of submitting one test case to one backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromptResult {
    pub run_id: String,
    pub test_id: String,
    pub model_name: String,
    pub response_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub latency_ms: u64,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<CheckOutcome>,
    pub timestamp: DateTime<Utc>,
}

impl PromptResult {
    pub fn success(
        run_id: impl Into<String>,
        case: &TestCase,
        model_name: impl Into<String>,
        response_text: impl Into<String>,
        reasoning: Option<String>,
        latency_ms: u64,
    ) -> Self {
        let response_text = response_text.into();
        Self {
            run_id: run_id.into(),
            test_id: case.id.clone(),
            model_name: model_name.into(),
            check: case.check(&response_text),
            response_text,
            reasoning,
            latency_ms,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(
        run_id: impl Into<String>,
        case: &TestCase,
        model_name: impl Into<String>,
        error: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            test_id: case.id.clone(),
            model_name: model_name.into(),
            response_text: String::new(),
            reasoning: None,
            latency_ms,
            error: Some(error.into()),
            check: None,
            timestamp: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Pair that identifies this result within a run
    pub fn key(&self) -> (&str, &str) {
        (&self.test_id, &self.model_name)
    }

    pub fn symbol(&self) -> &'static str {
        match (&self.error, self.check) {
            (Some(_), _) => "!",
            (None, Some(check)) => check.symbol(),
            (None, None) => "•",
        }
    }

    /// Answer collapsed onto one line and shortened
    pub fn answer_preview(&self, max_chars: usize) -> String {
        let flat = self.response_text.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.chars().count() > max_chars {
            let cut: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
            format!("{cut}…")
        } else {
            flat
        }
    }
}

impl fmt::Display for PromptResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} × {} [{}ms]",
            self.symbol(),
            self.test_id,
            self.model_name,
            self.latency_ms
        )?;
        match &self.error {
            Some(err) => write!(f, " - error: {err}"),
            None => write!(f, " - {}", self.answer_preview(60)),
        }
    }
}

/// Summary of a complete run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub total: usize,
    pub succeeded: usize,
    pub errors: usize,
    pub checks_passed: usize,
    pub checks_failed: usize,
    pub total_latency_ms: u64,
    pub results: Vec<PromptResult>,
}

impl RunSummary {
    pub fn new(run_id: impl Into<String>, results: Vec<PromptResult>) -> Self {
        let total = results.len();
        let errors = results.iter().filter(|r| r.is_error()).count();
        let checks_passed = results
            .iter()
            .filter(|r| r.check == Some(CheckOutcome::Pass))
            .count();
        let checks_failed = results
            .iter()
            .filter(|r| r.check == Some(CheckOutcome::Fail))
            .count();
        let total_latency_ms = results.iter().map(|r| r.latency_ms).sum();

        Self {
            run_id: run_id.into(),
            total,
            succeeded: total - errors,
            errors,
            checks_passed,
            checks_failed,
            total_latency_ms,
            results,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run {}", self.run_id)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for result in &self.results {
            writeln!(f, "  {result}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Ok: {} | Error: {} | Check pass: {} | Check fail: {}",
            self.total, self.succeeded, self.errors, self.checks_passed, self.checks_failed
        )?;
        writeln!(
            f,
            "Success Rate: {:.1}% | Latency: {}ms",
            self.success_rate(),
            self.total_latency_ms
        )
    }
}
