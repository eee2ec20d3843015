//! Data models for prompt evaluation
//!
//! This module contains all data structures used throughout the application.

mod backend;
mod prompt_result;
mod test_case;

pub use backend::{BackendConfig, BackendKind};
pub use prompt_result::{PromptResult, RunSummary};
pub use test_case::{validate_cases, CheckOutcome, TestCase};
