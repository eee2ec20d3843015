//! Prompt execution engine
//!
//! Provides sequential and parallel execution of test cases across backends.

mod parallel;
mod runner;

pub use runner::{PromptRunner, RunSettings};
