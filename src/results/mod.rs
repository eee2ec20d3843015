//! Results logging, storage and reporting module
//!
//! Provides the append-only run log, stored-run management, model comparison
//! and report generation for prompt results.

mod compare;
mod log;
mod report;
mod storage;

pub use log::ResultLog;
pub use report::{ReportFormat, ReportGenerator};
pub use storage::{generate_run_id, ExportFormat, ResultsStorage, RunInfo};
