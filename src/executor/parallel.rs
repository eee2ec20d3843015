//! Parallel prompt execution
//!
//! Dispatches (case, backend) pairs over a bounded worker pool.

use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::runner::execute;
use crate::backend::ModelBackend;
use crate::models::{PromptResult, TestCase};
use crate::results::ResultLog;

/// Parallel prompt executor
pub struct ParallelExecutor {
    max_concurrent: usize,
    timeout_secs: u64,
}

impl ParallelExecutor {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.clamp(1, Semaphore::MAX_PERMITS),
            timeout_secs: 120,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Run every pair with at most `max_concurrent` calls in flight
    ///
    /// The log receives results in completion order; the returned vector is
    /// ordered by case, then backend.
    pub async fn run(
        &self,
        run_id: &str,
        cases: &[TestCase],
        backends: &[Arc<dyn ModelBackend>],
        log: &Arc<ResultLog>,
    ) -> Result<Vec<PromptResult>> {
        info!(
            "Running {} calls in parallel (max {} concurrent)",
            cases.len() * backends.len(),
            self.max_concurrent
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::with_capacity(cases.len() * backends.len());

        for (case_index, case) in cases.iter().enumerate() {
            for (backend_index, backend) in backends.iter().enumerate() {
                let semaphore = semaphore.clone();
                let backend = backend.clone();
                let case = case.clone();
                let run_id = run_id.to_string();
                let log = log.clone();
                let timeout_secs = self.timeout_secs;

                let handle = tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .context("Worker pool closed")?;

                    debug!("Starting {} × {}", case.id, backend.name());
                    let result = execute(backend.as_ref(), &case, &run_id, timeout_secs).await;

                    log.append(&result)
                        .with_context(|| format!("Failed to record result for {}", case.id))?;
                    info!("  {}", result);

                    anyhow::Ok((case_index, backend_index, result))
                });

                handles.push(handle);
            }
        }

        let mut indexed = Vec::with_capacity(handles.len());
        for joined in join_all(handles).await {
            let entry = joined.context("Worker task panicked")??;
            indexed.push(entry);
        }

        indexed.sort_by_key(|(case_index, backend_index, _)| (*case_index, *backend_index));
        Ok(indexed.into_iter().map(|(_, _, result)| result).collect())
    }
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self::new(4)
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::backend::{BackendError, Completion, StaticBackend};
    use crate::executor::runner::test_support::{FailingBackend, SlowBackend};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::tempdir;

    /// Tracks the highest number of calls in flight at once
    struct GaugeBackend {
        name: String,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ModelBackend for GaugeBackend {
        fn name(&self) -> &str {
            &self.name
        }

        async fn invoke(&self, _prompt: &str) -> Result<Completion, BackendError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Completion::new("done"))
        }
    }

    fn cases(n: usize) -> Vec<TestCase> {
        (0..n)
            .map(|i| TestCase::new(format!("t{i}"), format!("prompt {i}")))
            .collect()
    }

    #[test]
    fn test_parallel_executor_creation() {
        let executor = ParallelExecutor::new(8).with_timeout(60);
        assert_eq!(executor.max_concurrent, 8);
        assert_eq!(executor.timeout_secs, 60);
        assert_eq!(ParallelExecutor::new(0).max_concurrent, 1);
        assert_eq!(
            ParallelExecutor::new(usize::MAX).max_concurrent,
            Semaphore::MAX_PERMITS
        );
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential_contract() {
        let dir = tempdir().unwrap();
        let log = Arc::new(ResultLog::create(dir.path().join("run.jsonl")).unwrap());
        let backends: Vec<Arc<dyn ModelBackend>> = vec![
            Arc::new(SlowBackend::new("slow", Duration::from_millis(30))),
            Arc::new(StaticBackend::new("fast", "4")),
            Arc::new(FailingBackend {
                name: "down".to_string(),
            }),
        ];

        let results = ParallelExecutor::new(4)
            .with_timeout(5)
            .run("run", &cases(5), &backends, &log)
            .await
            .unwrap();

        assert_eq!(results.len(), 5 * 3);
        let keys: HashSet<_> = results.iter().map(|r| r.key()).collect();
        assert_eq!(keys.len(), 15);

        // deterministic order regardless of completion order
        assert_eq!(results[0].key(), ("t0", "slow"));
        assert_eq!(results[1].key(), ("t0", "fast"));
        assert_eq!(results[2].key(), ("t0", "down"));
        assert_eq!(results[14].key(), ("t4", "down"));

        assert_eq!(
            results.iter().filter(|r| r.is_error()).count(),
            5,
            "only the failing backend records errors"
        );

        let logged = ResultLog::read(log.path()).unwrap();
        assert_eq!(logged.len(), 15);
        let logged_keys: HashSet<_> = logged.iter().map(|r| r.key()).collect();
        assert_eq!(logged_keys, keys);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let dir = tempdir().unwrap();
        let log = Arc::new(ResultLog::create(dir.path().join("run.jsonl")).unwrap());
        let gauge = Arc::new(GaugeBackend {
            name: "gauge".to_string(),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let backends: Vec<Arc<dyn ModelBackend>> = vec![gauge.clone()];

        let results = ParallelExecutor::new(2)
            .run("run", &cases(8), &backends, &log)
            .await
            .unwrap();

        assert_eq!(results.len(), 8);
        assert!(gauge.peak.load(Ordering::SeqCst) <= 2);
    }
}
