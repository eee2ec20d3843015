//! Prompt execution runner
//!
//! Submits every test case to every configured backend and records one
//! result per pair.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::parallel::ParallelExecutor;
use crate::backend::{BackendError, ModelBackend};
use crate::config::{AppConfig, ConfigError, MAX_CONCURRENCY};
use crate::models::{validate_cases, PromptResult, TestCase};
use crate::results::ResultLog;
use crate::utils::timer::Timer;

/// Settings that shape a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSettings {
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// Maximum concurrent calls (1 = sequential)
    pub concurrency: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            concurrency: 1,
        }
    }
}

impl From<&AppConfig> for RunSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.timeout_secs,
            concurrency: config.concurrency,
        }
    }
}

/// Runs test cases against a fixed set of backends
///
/// Holds no state between runs; each call to [`PromptRunner::run`]
/// produces an independent result set.
pub struct PromptRunner {
    backends: Vec<Arc<dyn ModelBackend>>,
    settings: RunSettings,
}

impl PromptRunner {
    /// Create a runner, rejecting an empty or ambiguous backend set
    pub fn new(
        backends: Vec<Arc<dyn ModelBackend>>,
        settings: RunSettings,
    ) -> Result<Self, ConfigError> {
        if backends.is_empty() {
            return Err(ConfigError::NoBackends);
        }

        let mut seen = HashSet::new();
        for (index, backend) in backends.iter().enumerate() {
            if backend.name().trim().is_empty() {
                return Err(ConfigError::EmptyBackendName { index });
            }
            if !seen.insert(backend.name()) {
                return Err(ConfigError::DuplicateBackend(backend.name().to_string()));
            }
        }

        if settings.timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "timeout_secs",
                message: "must be at least 1".to_string(),
            });
        }
        if settings.concurrency == 0 || settings.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::InvalidSetting {
                name: "concurrency",
                message: format!("must be between 1 and {MAX_CONCURRENCY}"),
            });
        }

        Ok(Self { backends, settings })
    }

    pub fn backends(&self) -> &[Arc<dyn ModelBackend>] {
        &self.backends
    }

    /// Run every case against every backend
    ///
    /// Results come back ordered by case, then backend. Each one is appended
    /// to `log` as soon as its call completes.
    pub async fn run(
        &self,
        run_id: &str,
        cases: &[TestCase],
        log: &Arc<ResultLog>,
    ) -> Result<Vec<PromptResult>> {
        validate_cases(cases)?;

        info!(
            "Starting run {}: {} cases × {} backends",
            run_id,
            cases.len(),
            self.backends.len()
        );
        let timer = Timer::start(format!("run {run_id}"));

        let results = if self.settings.concurrency > 1 {
            ParallelExecutor::new(self.settings.concurrency)
                .with_timeout(self.settings.timeout_secs)
                .run(run_id, cases, &self.backends, log)
                .await?
        } else {
            let mut results = Vec::with_capacity(cases.len() * self.backends.len());
            for case in cases {
                for backend in &self.backends {
                    let result = self.run_case(case, backend.as_ref(), run_id).await;
                    log.append(&result)
                        .with_context(|| format!("Failed to record result for {}", case.id))?;
                    info!("  {}", result);
                    results.push(result);
                }
            }
            results
        };

        let errors = results.iter().filter(|r| r.is_error()).count();
        info!(
            "Run {} completed in {}ms - {} results, {} errors",
            run_id,
            timer.stop(),
            results.len(),
            errors
        );

        Ok(results)
    }

    /// Submit one case to one backend
    pub async fn run_case(
        &self,
        case: &TestCase,
        backend: &dyn ModelBackend,
        run_id: &str,
    ) -> PromptResult {
        execute(backend, case, run_id, self.settings.timeout_secs).await
    }
}

/// One timed call; a failure becomes an error result
pub(crate) async fn execute(
    backend: &dyn ModelBackend,
    case: &TestCase,
    run_id: &str,
    timeout_secs: u64,
) -> PromptResult {
    let timer = Timer::start(format!("{} × {}", case.id, backend.name()));

    let outcome = tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        backend.invoke(&case.prompt),
    )
    .await
    .unwrap_or(Err(BackendError::Timeout(timeout_secs)));

    let latency_ms = timer.stop();

    match outcome {
        Ok(completion) => PromptResult::success(
            run_id,
            case,
            backend.name(),
            completion.text,
            completion.reasoning,
            latency_ms,
        ),
        Err(e) => {
            warn!("{} × {} failed: {}", case.id, backend.name(), e);
            PromptResult::failure(run_id, case, backend.name(), e.to_string(), latency_ms)
        }
    }
}
