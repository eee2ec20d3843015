//! Output formatting module
//!
//! Provides terminal renderings of prompt results and run listings.

mod formatter;

pub use formatter::{OutputFormat, ResultFormatter};
