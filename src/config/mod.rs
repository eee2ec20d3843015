//! Configuration module
//!
//! Handles loading suites, run settings and environment overrides.

mod env;
mod file;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::cli::RunArgs;

pub use env::{load_dotenv, print_env_help, EnvConfig};
pub use file::SuiteFile;

/// Configuration errors
///
/// Always fatal: a run never starts while one of these is outstanding.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("No suite file found; create one with `reasoning-harness config init`")]
    NotFound,

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("Invalid setting {name}: {message}")]
    InvalidSetting { name: &'static str, message: String },

    #[error("No test cases to run")]
    NoTestCases,

    #[error("Test case #{index} has an empty id")]
    EmptyTestId { index: usize },

    #[error("Test case '{0}' has an empty prompt")]
    EmptyPrompt(String),

    #[error("Duplicate test case id: {0}")]
    DuplicateTestId(String),

    #[error("No model backends configured")]
    NoBackends,

    #[error("Backend #{index} has an empty name")]
    EmptyBackendName { index: usize },

    #[error("Duplicate backend name: {0}")]
    DuplicateBackend(String),

    #[error("Backend '{backend}' has no model set")]
    MissingModel { backend: String },

    #[error("Backend '{backend}' needs the {var} environment variable")]
    MissingApiKey { backend: String, var: String },

    #[error("Backend '{backend}' could not be initialised: {message}")]
    BackendInit { backend: String, message: String },

    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    #[error("Unknown test case: {0}")]
    UnknownTestCase(String),

    #[error("No test case has tag: {0}")]
    UnknownTag(String),
}

/// Upper bound on concurrent backend calls
pub const MAX_CONCURRENCY: usize = 1024;

/// Run settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Per-call timeout in seconds
    pub timeout_secs: u64,

    /// Maximum concurrent backend calls (1 = sequential)
    pub concurrency: usize,

    /// Directory holding result logs (platform data dir when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_dir: Option<PathBuf>,

    /// Default output format
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            concurrency: 1,
            results_dir: None,
            format: "table".to_string(),
        }
    }
}

impl AppConfig {
    /// Check settings that would make a run meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "timeout_secs",
                message: "must be at least 1".to_string(),
            });
        }
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::InvalidSetting {
                name: "concurrency",
                message: format!("must be between 1 and {MAX_CONCURRENCY}"),
            });
        }
        Ok(())
    }

    /// Apply environment overrides (environment wins over the file)
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(timeout) = env.timeout {
            self.timeout_secs = timeout;
        }
        if let Some(concurrency) = env.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(dir) = &env.results_dir {
            self.results_dir = Some(PathBuf::from(dir));
        }
        if let Some(format) = &env.format {
            self.format = format.clone();
        }
    }

    /// Apply command-line flags (flags win over everything)
    pub fn apply_args(&mut self, args: &RunArgs) {
        if let Some(timeout) = args.timeout {
            self.timeout_secs = timeout;
        }
        if let Some(concurrency) = args.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(format) = &args.format {
            self.format = format.clone();
        }
    }

    /// Effective settings for a run: file, then environment, then flags
    pub fn resolve(file: &AppConfig, env: &EnvConfig, args: &RunArgs) -> Result<Self, ConfigError> {
        let mut settings = file.clone();
        settings.apply_env(env);
        settings.apply_args(args);
        settings.validate()?;
        Ok(settings)
    }
}
