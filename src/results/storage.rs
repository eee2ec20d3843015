//! Results storage and retrieval
//!
//! Each run is one JSONL log under the results directory, named by run id.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::log::ResultLog;
use crate::models::PromptResult;

const LOG_EXTENSION: &str = "jsonl";

/// Generate unique run ID
pub fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let random: u32 = rand::random::<u32>() % 10000;
    format!("{timestamp}_{random:04}")
}

/// Results storage manager
#[derive(Clone, Debug)]
pub struct ResultsStorage {
    /// Base directory for results
    base_dir: PathBuf,
}

impl ResultsStorage {
    /// Create a new results storage
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Create with default directory
    pub fn default_dir() -> Self {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reasoning-harness")
            .join("results");
        Self::new(base_dir)
    }

    /// Storage rooted at `dir`, or the default directory
    pub fn at(dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) => Self::new(dir),
            None => Self::default_dir(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get path for a specific run
    pub fn run_path(&self, run_id: &str) -> PathBuf {
        self.base_dir.join(format!("{run_id}.{LOG_EXTENSION}"))
    }

    /// Open the log for a new run
    pub fn open_log(&self, run_id: &str) -> Result<ResultLog> {
        ResultLog::create(self.run_path(run_id))
    }

    /// Load a run by id, or from an explicit log path
    pub fn load(&self, run: &str) -> Result<Vec<PromptResult>> {
        let candidate = Path::new(run);
        let path = if candidate.extension().is_some_and(|e| e == LOG_EXTENSION)
            && candidate.exists()
        {
            candidate.to_path_buf()
        } else {
            self.run_path(run)
        };

        if !path.exists() {
            bail!("No results found for run '{run}' ({})", path.display());
        }

        let results = ResultLog::read(&path)?;
        debug!("Loaded {} results from {}", results.len(), path.display());
        Ok(results)
    }

    /// Load the results of a single run
    ///
    /// `run` is a stored run id, a log path or `latest`. A log can hold
    /// several runs when `--log` was reused; `run_id` picks one, otherwise
    /// the most recently appended run is used.
    pub fn load_run(&self, run: &str, run_id: Option<&str>) -> Result<(String, Vec<PromptResult>)> {
        let run = if run == "latest" {
            self.latest()?
                .ok_or_else(|| anyhow!("No stored runs in {}", self.base_dir.display()))?
        } else {
            run.to_string()
        };

        let results = self.load(&run)?;
        let target = match run_id {
            Some(id) => id.to_string(),
            None => match results.last() {
                Some(last) => last.run_id.clone(),
                None => return Ok((run, results)),
            },
        };

        let run_ids: BTreeSet<&str> = results.iter().map(|r| r.run_id.as_str()).collect();
        if !run_ids.contains(target.as_str()) {
            bail!("Run '{target}' not found in {run}");
        }
        if run_ids.len() > 1 && run_id.is_none() {
            warn!(
                "{} holds {} runs; showing {} (select another with --run-id)",
                run,
                run_ids.len(),
                target
            );
        }

        let selected = results.into_iter().filter(|r| r.run_id == target).collect();
        Ok((target, selected))
    }

    /// List all stored runs, newest first
    pub fn list_runs(&self) -> Result<Vec<RunInfo>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|e| e == LOG_EXTENSION) {
                continue;
            }

            match ResultLog::read(&path) {
                Ok(results) => {
                    if let Some(info) = RunInfo::from_results(&path, &results) {
                        runs.push(info);
                    }
                }
                Err(e) => debug!("Failed to load {}: {:#}", path.display(), e),
            }
        }

        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(runs)
    }

    /// Get id of the most recent run
    pub fn latest(&self) -> Result<Option<String>> {
        Ok(self.list_runs()?.into_iter().next().map(|r| r.id))
    }

    /// Delete a run
    pub fn delete(&self, run_id: &str) -> Result<bool> {
        let path = self.run_path(run_id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .with_context(|| format!("Failed to delete {}", path.display()))?;
        info!("Deleted results: {}", path.display());
        Ok(true)
    }

    /// Export results to a file
    pub fn export(&self, results: &[PromptResult], path: &Path, format: ExportFormat) -> Result<()> {
        match format {
            ExportFormat::Json => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                serde_json::to_writer_pretty(BufWriter::new(file), results)
                    .context("Failed to write JSON export")?;
            }
            ExportFormat::Csv => {
                let mut writer = csv::Writer::from_path(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;

                writer.write_record([
                    "run_id",
                    "test_id",
                    "model_name",
                    "latency_ms",
                    "check",
                    "error",
                    "response_text",
                    "reasoning",
                ])?;

                for result in results {
                    writer.write_record([
                        result.run_id.clone(),
                        result.test_id.clone(),
                        result.model_name.clone(),
                        result.latency_ms.to_string(),
                        result.check.map(|c| c.to_string()).unwrap_or_default(),
                        result.error.clone().unwrap_or_default(),
                        result.response_text.clone(),
                        result.reasoning.clone().unwrap_or_default(),
                    ])?;
                }
                writer.flush()?;
            }
        }

        info!("Exported results to {}", path.display());
        Ok(())
    }
}

/// Brief run information
#[derive(Clone, Debug)]
pub struct RunInfo {
    pub id: String,
    pub path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub records: usize,
    pub errors: usize,
    pub models: Vec<String>,
}

impl RunInfo {
    fn from_results(path: &Path, results: &[PromptResult]) -> Option<Self> {
        let started_at = results.iter().map(|r| r.timestamp).min()?;
        let id = path.file_stem()?.to_str()?.to_string();
        let models: BTreeSet<_> = results.iter().map(|r| r.model_name.clone()).collect();

        Some(Self {
            id,
            path: path.to_path_buf(),
            started_at,
            records: results.len(),
            errors: results.iter().filter(|r| r.is_error()).count(),
            models: models.into_iter().collect(),
        })
    }
}

/// Export format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestCase;
    use crate::results::{ReportFormat, ReportGenerator};
    use tempfile::tempdir;

    fn sample(run_id: &str) -> Vec<PromptResult> {
        let case = TestCase::new("t1", "2+2?").with_expected("4");
        vec![
            PromptResult::success(run_id, &case, "r1", "4", None, 100),
            PromptResult::failure(run_id, &case, "o3", "Timeout after 5 seconds", 5000),
        ]
    }

    fn store(storage: &ResultsStorage, run_id: &str) {
        let log = storage.open_log(run_id).unwrap();
        for result in sample(run_id) {
            log.append(&result).unwrap();
        }
    }

    #[test]
    fn test_generate_run_id() {
        let id = generate_run_id();
        assert_eq!(id.len(), "20260101_120000_0000".len());
        assert!(id.chars().all(|c| c.is_ascii_digit() || c == '_'));
    }

    #[test]
    fn test_list_and_load() {
        let dir = tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());
        assert!(storage.list_runs().unwrap().is_empty());

        store(&storage, "run_a");
        let runs = storage.list_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, "run_a");
        assert_eq!(runs[0].records, 2);
        assert_eq!(runs[0].errors, 1);
        assert_eq!(runs[0].models, vec!["o3", "r1"]);

        assert_eq!(storage.latest().unwrap().as_deref(), Some("run_a"));
        assert_eq!(storage.load("run_a").unwrap().len(), 2);

        let by_path = storage.run_path("run_a");
        assert_eq!(storage.load(by_path.to_str().unwrap()).unwrap().len(), 2);
    }

    #[test]
    fn test_load_run_from_shared_log() {
        let dir = tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());
        let path = dir.path().join("shared.jsonl");
        let case = TestCase::new("t1", "2+2?");

        for run_id in ["run-1", "run-2"] {
            let log = ResultLog::create(&path).unwrap();
            log.append(&PromptResult::success(run_id, &case, "m", "4", None, 10))
                .unwrap();
        }
        let path = path.to_str().unwrap();

        let (run_id, results) = storage.load_run(path, None).unwrap();
        assert_eq!(run_id, "run-2");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].run_id, "run-2");

        let (run_id, results) = storage.load_run(path, Some("run-1")).unwrap();
        assert_eq!(run_id, "run-1");
        assert_eq!(results.len(), 1);

        let report = ReportGenerator::run_report(&run_id, &results, ReportFormat::Text).unwrap();
        assert!(report.contains("Run ID: run-1"));
        assert!(report.contains("Tests: 1"));
        assert!(report.contains(&format!("{:<22} {:>6} {:>6}", "m", 1, 0)));

        assert!(storage.load_run(path, Some("run-3")).is_err());
    }

    #[test]
    fn test_load_run_latest() {
        let dir = tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());
        assert!(storage.load_run("latest", None).is_err());

        store(&storage, "run_a");
        let (run_id, results) = storage.load_run("latest", None).unwrap();
        assert_eq!(run_id, "run_a");
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_load_missing_run() {
        let dir = tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());
        assert!(storage.load("nope").is_err());
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());
        store(&storage, "run_a");

        assert!(storage.delete("run_a").unwrap());
        assert!(!storage.delete("run_a").unwrap());
        assert!(storage.list_runs().unwrap().is_empty());
    }

    #[test]
    fn test_export_csv() {
        let dir = tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());
        let path = dir.path().join("out.csv");

        storage.export(&sample("run_a"), &path, ExportFormat::Csv).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][2], "r1");
        assert_eq!(&rows[0][4], "PASS");
        assert_eq!(&rows[1][5], "Timeout after 5 seconds");
    }

    #[test]
    fn test_export_json() {
        let dir = tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());
        let path = dir.path().join("out.json");

        storage.export(&sample("run_a"), &path, ExportFormat::Json).unwrap();

        let loaded: Vec<PromptResult> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_export_format() {
        assert_eq!(ExportFormat::from_str("JSON"), Some(ExportFormat::Json));
        assert_eq!(
            ExportFormat::from_extension(Path::new("out.csv")),
            Some(ExportFormat::Csv)
        );
        assert!(ExportFormat::from_str("xml").is_none());
    }
}
