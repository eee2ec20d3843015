//! Model comparison functionality
//!
//! Compare prompt results across the backends of a run.

use std::collections::BTreeMap;

use crate::models::{CheckOutcome, PromptResult};

/// Comparison of every backend in a result set
#[derive(Clone, Debug)]
pub struct RunComparison {
    /// Model names in first-seen order
    pub models: Vec<String>,

    /// Per-model statistics
    pub model_stats: BTreeMap<String, ModelStats>,

    /// Per-test comparison, in first-seen test order
    pub test_comparisons: Vec<TestComparison>,

    /// Overall rankings
    pub rankings: ModelRankings,

    /// Summary statistics
    pub summary: ComparisonSummary,
}

/// Statistics for a single model across all tests
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelStats {
    pub calls: u32,
    pub succeeded: u32,
    pub errors: u32,
    pub checks_passed: u32,
    pub checks_failed: u32,
    /// Latency figures cover successful calls only
    pub avg_latency_ms: u64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
}

impl ModelStats {
    /// Fraction of calls that returned a completion (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.calls as f64
        }
    }

    /// Fraction of graded answers that passed, if any were graded
    pub fn check_rate(&self) -> Option<f64> {
        let graded = self.checks_passed + self.checks_failed;
        (graded > 0).then(|| self.checks_passed as f64 / graded as f64)
    }
}

/// Comparison for a single test across models
#[derive(Clone, Debug)]
pub struct TestComparison {
    pub test_id: String,

    /// Outcome per model
    pub outcomes: BTreeMap<String, ModelOutcome>,

    /// Fastest model that answered
    pub fastest: Option<String>,

    /// Whether the answers agree
    pub agreement: Agreement,
}

/// One model's outcome for one test
#[derive(Clone, Debug)]
pub struct ModelOutcome {
    pub succeeded: bool,
    pub latency_ms: u64,
    pub check: Option<CheckOutcome>,
    pub answer: String,
    pub error: Option<String>,
}

/// Agreement between the models that answered a test
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Agreement {
    /// Every answer is the same after normalization
    Unanimous,
    /// Answers differ
    Split { distinct: usize },
    /// Fewer than two answers to compare
    Insufficient,
}

/// Overall model rankings
#[derive(Clone, Debug)]
pub struct ModelRankings {
    /// Ranking by success rate (higher is better)
    pub by_success_rate: Vec<RankedModel>,

    /// Ranking by average latency (lower is better)
    pub by_latency: Vec<RankedModel>,

    /// Ranking by check pass rate, for models with graded answers
    pub by_checks: Vec<RankedModel>,

    /// Number of tests each model answered fastest
    pub wins: BTreeMap<String, u32>,
}

/// A model with its rank
#[derive(Clone, Debug, PartialEq)]
pub struct RankedModel {
    /// Rank (1 = best)
    pub rank: u32,
    pub model: String,
    pub value: f64,
}

/// Summary of comparison
#[derive(Clone, Debug)]
pub struct ComparisonSummary {
    pub model_count: usize,
    pub test_count: usize,
    pub most_reliable: Option<String>,
    pub fastest: Option<String>,
    pub most_accurate: Option<String>,
    /// Tests where every answer agreed
    pub unanimous: usize,
    /// Tests with differing answers
    pub split: usize,
    /// Tests no model answered
    pub all_failed: usize,
}

/// Model comparator
pub struct ModelComparator;

impl ModelComparator {
    /// Compare the models in a result set
    pub fn compare(results: &[PromptResult]) -> RunComparison {
        let mut models: Vec<String> = Vec::new();
        for result in results {
            if !models.contains(&result.model_name) {
                models.push(result.model_name.clone());
            }
        }

        let model_stats = Self::build_model_stats(results);
        let test_comparisons = Self::build_test_comparisons(results);
        let rankings = Self::calculate_rankings(&models, &model_stats, &test_comparisons);
        let summary = Self::build_summary(&models, &test_comparisons, &rankings);

        RunComparison {
            models,
            model_stats,
            test_comparisons,
            rankings,
            summary,
        }
    }

    fn build_model_stats(results: &[PromptResult]) -> BTreeMap<String, ModelStats> {
        let mut stats: BTreeMap<String, ModelStats> = BTreeMap::new();
        let mut latencies: BTreeMap<&str, Vec<u64>> = BTreeMap::new();

        for result in results {
            let entry = stats.entry(result.model_name.clone()).or_default();
            entry.calls += 1;
            if result.is_error() {
                entry.errors += 1;
            } else {
                entry.succeeded += 1;
                latencies
                    .entry(&result.model_name)
                    .or_default()
                    .push(result.latency_ms);
            }
            match result.check {
                Some(CheckOutcome::Pass) => entry.checks_passed += 1,
                Some(CheckOutcome::Fail) => entry.checks_failed += 1,
                None => {}
            }
        }

        for (model, durs) in latencies {
            if let Some(entry) = stats.get_mut(model) {
                entry.avg_latency_ms = durs.iter().sum::<u64>() / durs.len() as u64;
                entry.min_latency_ms = durs.iter().copied().min().unwrap_or(0);
                entry.max_latency_ms = durs.iter().copied().max().unwrap_or(0);
            }
        }

        stats
    }

    fn build_test_comparisons(results: &[PromptResult]) -> Vec<TestComparison> {
        let mut comparisons: Vec<TestComparison> = Vec::new();

        for result in results {
            let index = match comparisons.iter().position(|c| c.test_id == result.test_id) {
                Some(index) => index,
                None => {
                    comparisons.push(TestComparison {
                        test_id: result.test_id.clone(),
                        outcomes: BTreeMap::new(),
                        fastest: None,
                        agreement: Agreement::Insufficient,
                    });
                    comparisons.len() - 1
                }
            };

            comparisons[index].outcomes.insert(
                result.model_name.clone(),
                ModelOutcome {
                    succeeded: !result.is_error(),
                    latency_ms: result.latency_ms,
                    check: result.check,
                    answer: result.response_text.clone(),
                    error: result.error.clone(),
                },
            );
        }

        for comparison in &mut comparisons {
            comparison.fastest = comparison
                .outcomes
                .iter()
                .filter(|(_, o)| o.succeeded)
                .min_by_key(|(_, o)| o.latency_ms)
                .map(|(model, _)| model.clone());
            comparison.agreement = Self::determine_agreement(&comparison.outcomes);
        }

        comparisons
    }

    fn determine_agreement(outcomes: &BTreeMap<String, ModelOutcome>) -> Agreement {
        let mut answers: Vec<String> = outcomes
            .values()
            .filter(|o| o.succeeded)
            .map(|o| normalize_answer(&o.answer))
            .collect();

        if answers.len() < 2 {
            return Agreement::Insufficient;
        }

        answers.sort();
        answers.dedup();
        if answers.len() == 1 {
            Agreement::Unanimous
        } else {
            Agreement::Split {
                distinct: answers.len(),
            }
        }
    }

    fn calculate_rankings(
        models: &[String],
        stats: &BTreeMap<String, ModelStats>,
        comparisons: &[TestComparison],
    ) -> ModelRankings {
        let mut wins: BTreeMap<String, u32> = BTreeMap::new();
        for comp in comparisons {
            if let Some(fastest) = &comp.fastest {
                *wins.entry(fastest.clone()).or_insert(0) += 1;
            }
        }

        let by_success_rate = rank(
            models
                .iter()
                .filter_map(|m| stats.get(m).map(|s| (m, s.success_rate())))
                .collect(),
            true,
        );

        let by_latency = rank(
            models
                .iter()
                .filter_map(|m| stats.get(m).map(|s| (m, s)))
                .filter(|(_, s)| s.succeeded > 0)
                .map(|(m, s)| (m, s.avg_latency_ms as f64))
                .collect(),
            false,
        );

        let by_checks = rank(
            models
                .iter()
                .filter_map(|m| stats.get(m).and_then(|s| s.check_rate()).map(|r| (m, r)))
                .collect(),
            true,
        );

        ModelRankings {
            by_success_rate,
            by_latency,
            by_checks,
            wins,
        }
    }

    fn build_summary(
        models: &[String],
        comparisons: &[TestComparison],
        rankings: &ModelRankings,
    ) -> ComparisonSummary {
        let mut unanimous = 0;
        let mut split = 0;
        let mut all_failed = 0;

        for comp in comparisons {
            if !comp.outcomes.values().any(|o| o.succeeded) {
                all_failed += 1;
                continue;
            }
            match comp.agreement {
                Agreement::Unanimous => unanimous += 1,
                Agreement::Split { .. } => split += 1,
                Agreement::Insufficient => {}
            }
        }

        ComparisonSummary {
            model_count: models.len(),
            test_count: comparisons.len(),
            most_reliable: rankings.by_success_rate.first().map(|r| r.model.clone()),
            fastest: rankings.by_latency.first().map(|r| r.model.clone()),
            most_accurate: rankings.by_checks.first().map(|r| r.model.clone()),
            unanimous,
            split,
            all_failed,
        }
    }
}

/// Stable ranking; ties keep first-seen model order
fn rank(values: Vec<(&String, f64)>, higher_is_better: bool) -> Vec<RankedModel> {
    let mut ranked: Vec<RankedModel> = values
        .into_iter()
        .map(|(model, value)| RankedModel {
            rank: 0,
            model: model.clone(),
            value,
        })
        .collect();

    if higher_is_better {
        ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
    } else {
        ranked.sort_by(|a, b| a.value.total_cmp(&b.value));
    }
    for (i, r) in ranked.iter_mut().enumerate() {
        r.rank = i as u32 + 1;
    }
    ranked
}

/// Lowercase, collapse whitespace, drop trailing punctuation
fn normalize_answer(answer: &str) -> String {
    answer
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(['.', '!', '?'])
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestCase;

    fn ok(case: &TestCase, model: &str, answer: &str, latency: u64) -> PromptResult {
        PromptResult::success("run", case, model, answer, None, latency)
    }

    fn err(case: &TestCase, model: &str) -> PromptResult {
        PromptResult::failure("run", case, model, "Timeout after 5 seconds", 5000)
    }

    #[test]
    fn test_empty() {
        let comparison = ModelComparator::compare(&[]);
        assert!(comparison.models.is_empty());
        assert_eq!(comparison.summary.test_count, 0);
        assert!(comparison.summary.most_reliable.is_none());
    }

    #[test]
    fn test_model_stats() {
        let t1 = TestCase::new("t1", "2+2?").with_expected("4");
        let t2 = TestCase::new("t2", "3+3?").with_expected("6");
        let results = vec![
            ok(&t1, "r1", "4", 300),
            ok(&t1, "o3", "4", 100),
            ok(&t2, "r1", "7", 500),
            err(&t2, "o3"),
        ];

        let comparison = ModelComparator::compare(&results);
        assert_eq!(comparison.models, vec!["r1", "o3"]);

        let r1 = &comparison.model_stats["r1"];
        assert_eq!(r1.calls, 2);
        assert_eq!(r1.succeeded, 2);
        assert_eq!(r1.checks_passed, 1);
        assert_eq!(r1.checks_failed, 1);
        assert_eq!(r1.avg_latency_ms, 400);
        assert_eq!(r1.min_latency_ms, 300);
        assert_eq!(r1.max_latency_ms, 500);

        let o3 = &comparison.model_stats["o3"];
        assert_eq!(o3.errors, 1);
        // errored calls do not count towards latency
        assert_eq!(o3.avg_latency_ms, 100);
        assert_eq!(o3.success_rate(), 0.5);
        assert_eq!(o3.check_rate(), Some(1.0));
    }

    #[test]
    fn test_rankings_and_summary() {
        let t1 = TestCase::new("t1", "2+2?").with_expected("4");
        let t2 = TestCase::new("t2", "3+3?").with_expected("6");
        let results = vec![
            ok(&t1, "r1", "4", 300),
            ok(&t1, "o3", "4.", 100),
            ok(&t2, "r1", "7", 500),
            err(&t2, "o3"),
        ];

        let comparison = ModelComparator::compare(&results);
        let rankings = &comparison.rankings;
        assert_eq!(rankings.by_success_rate[0].model, "r1");
        assert_eq!(rankings.by_latency[0].model, "o3");
        assert_eq!(rankings.by_checks[0].model, "o3");
        assert_eq!(rankings.wins.get("o3"), Some(&1));
        assert_eq!(rankings.wins.get("r1"), Some(&1));

        let summary = &comparison.summary;
        assert_eq!(summary.model_count, 2);
        assert_eq!(summary.test_count, 2);
        assert_eq!(summary.most_reliable.as_deref(), Some("r1"));
        assert_eq!(summary.fastest.as_deref(), Some("o3"));
        assert_eq!(summary.unanimous, 1);
        assert_eq!(summary.split, 0);
    }

    #[test]
    fn test_agreement() {
        let t1 = TestCase::new("t1", "capital of France?");
        let t2 = TestCase::new("t2", "2+2?");
        let t3 = TestCase::new("t3", "unanswerable");
        let results = vec![
            ok(&t1, "a", "Paris", 10),
            ok(&t1, "b", "  paris. ", 20),
            ok(&t1, "c", "Lyon", 30),
            ok(&t2, "a", "4", 10),
            err(&t2, "b"),
            err(&t3, "a"),
            err(&t3, "b"),
        ];

        let comparison = ModelComparator::compare(&results);
        let tests = &comparison.test_comparisons;
        assert_eq!(tests[0].agreement, Agreement::Split { distinct: 2 });
        assert_eq!(tests[0].fastest.as_deref(), Some("a"));
        assert_eq!(tests[1].agreement, Agreement::Insufficient);
        assert_eq!(tests[2].fastest, None);
        assert_eq!(comparison.summary.split, 1);
        assert_eq!(comparison.summary.all_failed, 1);
    }

    #[test]
    fn test_normalize_answer() {
        assert_eq!(normalize_answer(" The  Answer\nis 4. "), "the answer is 4");
        assert_eq!(normalize_answer("Yes!"), "yes");
    }
}
