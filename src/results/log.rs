//! Append-only result log
//!
//! One JSON object per line, written and flushed as soon as each call
//! completes so an interrupted run can still be inspected.

use anyhow::{anyhow, Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::models::PromptResult;

/// Line-delimited JSON log of prompt results
#[derive(Debug)]
pub struct ResultLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl ResultLog {
    /// Open a log for appending, creating it and its directory if needed
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open result log: {}", path.display()))?;

        debug!("Result log opened at {}", path.display());
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one result and flush it to disk
    pub fn append(&self, result: &PromptResult) -> Result<()> {
        let line = serde_json::to_string(result).context("Failed to serialize result")?;

        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("Result log lock poisoned: {}", self.path.display()))?;
        writeln!(file, "{line}")
            .and_then(|_| file.flush())
            .with_context(|| format!("Failed to write result log: {}", self.path.display()))?;

        Ok(())
    }

    /// Read every result from a log file
    pub fn read(path: impl AsRef<Path>) -> Result<Vec<PromptResult>> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open result log: {}", path.display()))?;

        let mut results = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            let result: PromptResult = serde_json::from_str(&line).with_context(|| {
                format!("Malformed record at {}:{}", path.display(), index + 1)
            })?;
            results.push(result);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestCase;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_append_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("run.jsonl");
        let log = ResultLog::create(&path).unwrap();

        let case = TestCase::new("t1", "2+2?");
        let ok = PromptResult::success("run", &case, "a", "4", Some("add".to_string()), 12);
        let failed = PromptResult::failure("run", &case, "b", "Timeout after 5 seconds", 5000);
        log.append(&ok).unwrap();
        log.append(&failed).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        let results = ResultLog::read(&path).unwrap();
        assert_eq!(results, vec![ok, failed]);
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        let case = TestCase::new("t1", "2+2?");

        ResultLog::create(&path)
            .unwrap()
            .append(&PromptResult::success("r1", &case, "a", "4", None, 1))
            .unwrap();
        ResultLog::create(&path)
            .unwrap()
            .append(&PromptResult::success("r2", &case, "a", "4", None, 1))
            .unwrap();

        let runs: Vec<_> = ResultLog::read(&path)
            .unwrap()
            .into_iter()
            .map(|r| r.run_id)
            .collect();
        assert_eq!(runs, vec!["r1", "r2"]);
    }

    #[test]
    fn test_concurrent_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        let log = Arc::new(ResultLog::create(&path).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = log.clone();
                std::thread::spawn(move || {
                    let case = TestCase::new(format!("t{i}"), "prompt");
                    for model in ["a", "b", "c"] {
                        log.append(&PromptResult::success("run", &case, model, "x", None, 1))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ResultLog::read(&path).unwrap().len(), 24);
    }

    #[test]
    fn test_read_reports_bad_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        fs::write(&path, "\n{not json}\n").unwrap();

        let err = ResultLog::read(&path).unwrap_err();
        assert!(format!("{err:#}").contains("bad.jsonl:2"));
    }
}
