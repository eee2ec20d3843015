//! HTTP client module
//!
//! Provides the HTTP transport used by remote model backends.

mod client;

pub use client::HttpClient;
