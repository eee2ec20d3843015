//! Test case models
//!
//! A test case is a fixed prompt submitted to every configured backend.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::config::ConfigError;

/// A fixed prompt to evaluate
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Unique identifier within a suite
    pub id: String,

    /// Prompt text sent verbatim to each backend
    pub prompt: String,

    /// Text the answer is expected to contain (case-insensitive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    /// Free-form labels used for selection
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl TestCase {
    pub fn new(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            expected: None,
            tags: Vec::new(),
        }
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Grade an answer against `expected`, if the case has one
    pub fn check(&self, answer: &str) -> Option<CheckOutcome> {
        let expected = self.expected.as_deref()?;
        if answer.to_lowercase().contains(&expected.to_lowercase()) {
            Some(CheckOutcome::Pass)
        } else {
            Some(CheckOutcome::Fail)
        }
    }

    /// First line of the prompt, shortened for listings
    pub fn preview(&self, max_chars: usize) -> String {
        let first_line = self.prompt.lines().next().unwrap_or("").trim();
        if first_line.chars().count() > max_chars {
            let cut: String = first_line.chars().take(max_chars.saturating_sub(1)).collect();
            format!("{cut}…")
        } else {
            first_line.to_string()
        }
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.preview(48))
    }
}

/// Outcome of comparing an answer with the expected text
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckOutcome {
    Pass,
    Fail,
}

impl CheckOutcome {
    pub fn symbol(&self) -> &'static str {
        match self {
            CheckOutcome::Pass => "✓",
            CheckOutcome::Fail => "✗",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, CheckOutcome::Pass)
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckOutcome::Pass => write!(f, "PASS"),
            CheckOutcome::Fail => write!(f, "FAIL"),
        }
    }
}

/// Reject suites whose cases cannot be run unambiguously
pub fn validate_cases(cases: &[TestCase]) -> Result<(), ConfigError> {
    if cases.is_empty() {
        return Err(ConfigError::NoTestCases);
    }

    let mut seen = HashSet::new();
    for (index, case) in cases.iter().enumerate() {
        if case.id.trim().is_empty() {
            return Err(ConfigError::EmptyTestId { index });
        }
        if case.prompt.trim().is_empty() {
            return Err(ConfigError::EmptyPrompt(case.id.clone()));
        }
        if !seen.insert(case.id.as_str()) {
            return Err(ConfigError::DuplicateTestId(case.id.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_is_case_insensitive() {
        let case = TestCase::new("capital", "Capital of France?").with_expected("paris");
        assert_eq!(case.check("It is Paris."), Some(CheckOutcome::Pass));
        assert_eq!(case.check("Lyon"), Some(CheckOutcome::Fail));
    }

    #[test]
    fn test_check_without_expectation() {
        let case = TestCase::new("t1", "2+2?");
        assert_eq!(case.check("4"), None);
    }

    #[test]
    fn test_preview_truncates() {
        let case = TestCase::new("long", "abcdefghij\nsecond line");
        assert_eq!(case.preview(5), "abcd…");
        assert_eq!(case.preview(20), "abcdefghij");
    }

    #[test]
    fn test_validate_duplicate_ids() {
        let cases = vec![TestCase::new("t1", "a"), TestCase::new("t1", "b")];
        assert!(matches!(
            validate_cases(&cases),
            Err(ConfigError::DuplicateTestId(id)) if id == "t1"
        ));
    }

    #[test]
    fn test_validate_empty_fields() {
        assert!(matches!(
            validate_cases(&[TestCase::new(" ", "a")]),
            Err(ConfigError::EmptyTestId { index: 0 })
        ));
        assert!(matches!(
            validate_cases(&[TestCase::new("t1", "  \n")]),
            Err(ConfigError::EmptyPrompt(_))
        ));
        assert!(matches!(validate_cases(&[]), Err(ConfigError::NoTestCases)));
    }

    #[test]
    fn test_validate_ok() {
        let cases = vec![
            TestCase::new("t1", "2+2?").with_tag("math"),
            TestCase::new("t2", "Capital of France?"),
        ];
        assert!(validate_cases(&cases).is_ok());
        assert!(cases[0].has_tag("MATH"));
    }
}
