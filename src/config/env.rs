//! Environment variable configuration
//!
//! Provides environment variable overrides for run settings.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "REASONING_HARNESS";

/// Overrides read from the environment
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Suite file from REASONING_HARNESS_SUITE
    pub suite: Option<String>,
    /// Timeout from REASONING_HARNESS_TIMEOUT
    pub timeout: Option<u64>,
    /// Concurrency from REASONING_HARNESS_CONCURRENCY
    pub concurrency: Option<usize>,
    /// Results directory from REASONING_HARNESS_RESULTS_DIR
    pub results_dir: Option<String>,
    /// Output format from REASONING_HARNESS_FORMAT
    pub format: Option<String>,
    /// Verbose from REASONING_HARNESS_VERBOSE
    pub verbose: Option<bool>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            suite: get_env("SUITE"),
            timeout: get_env_parse("TIMEOUT"),
            concurrency: get_env_parse("CONCURRENCY"),
            results_dir: get_env("RESULTS_DIR"),
            format: get_env("FORMAT"),
            verbose: get_env_bool("VERBOSE"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.suite.is_some()
            || self.timeout.is_some()
            || self.concurrency.is_some()
            || self.results_dir.is_some()
            || self.format.is_some()
            || self.verbose.is_some()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_SUITE:        {:?}", ENV_PREFIX, self.suite);
        println!("  {}_TIMEOUT:      {:?}", ENV_PREFIX, self.timeout);
        println!("  {}_CONCURRENCY:  {:?}", ENV_PREFIX, self.concurrency);
        println!("  {}_RESULTS_DIR:  {:?}", ENV_PREFIX, self.results_dir);
        println!("  {}_FORMAT:       {:?}", ENV_PREFIX, self.format);
        println!("  {}_VERBOSE:      {:?}", ENV_PREFIX, self.verbose);
    }
}

/// Load `.env` from the working directory
///
/// Variables already set in the process environment are left untouched.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match env::current_dir() {
        Ok(dir) => load_dotenv_from(&dir),
        Err(_) => Ok(None),
    }
}

/// Load `dir/.env`; a missing file is not an error
fn load_dotenv_from(dir: &Path) -> Result<Option<PathBuf>, dotenvy::Error> {
    let path = dir.join(".env");
    match dotenvy::from_path(&path) {
        Ok(()) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}"))
        .ok()
        .filter(|v| !v.is_empty())
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables in tests
#[cfg(test)]
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

#[cfg(test)]
impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value.into()));
        self
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        for (key, value) in self.vars {
            env::set_var(key, value);
        }

        EnvGuard { previous }
    }
}

/// Guard that restores environment variables on drop
#[cfg(test)]
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

#[cfg(test)]
impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all REASONING_HARNESS environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_SUITE         Path to the suite file");
    println!("  {ENV_PREFIX}_TIMEOUT       Per-call timeout in seconds");
    println!("  {ENV_PREFIX}_CONCURRENCY   Maximum concurrent backend calls");
    println!("  {ENV_PREFIX}_RESULTS_DIR   Directory for result logs");
    println!("  {ENV_PREFIX}_FORMAT        Output format (table, json, csv, summary)");
    println!("  {ENV_PREFIX}_VERBOSE       Enable debug logging (true/false)");
    println!("  OPENAI_API_KEY                  Default key variable for openai backends");
    println!("  RUST_LOG                        Overrides the log filter");
    println!();
    println!("Variables are also read from ./.env; the process environment wins.");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_SUITE=./suite.yaml");
    println!("  export {ENV_PREFIX}_CONCURRENCY=4");
    println!("  reasoning-harness run");
}
