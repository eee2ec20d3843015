//! Suite file management
//!
//! Handles finding, loading, and validating suite files. A suite holds the
//! run settings, the backends to compare and the test cases to send them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{AppConfig, ConfigError};
use crate::models::{validate_cases, BackendConfig, BackendKind, TestCase};

/// Suite file locations (in order of precedence)
const SUITE_LOCATIONS: &[&str] = &[
    "./reasoning-harness.yaml",
    "./reasoning-harness.yml",
    "./reasoning-harness.json",
    "./.reasoning-harness/suite.yaml",
    "~/.config/reasoning-harness/suite.yaml",
];

const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Full suite file structure
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuiteFile {
    /// Version of suite file format
    #[serde(default = "default_version")]
    pub version: String,

    /// Run settings
    #[serde(default)]
    pub settings: AppConfig,

    /// Model backends to compare
    #[serde(default)]
    pub backends: Vec<BackendConfig>,

    /// Prompts to send to every backend
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for SuiteFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            settings: AppConfig::default(),
            backends: Vec::new(),
            cases: Vec::new(),
        }
    }
}

impl SuiteFile {
    /// Find a suite file in standard locations
    pub fn find() -> Option<PathBuf> {
        SUITE_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load from an explicit path or the first standard location
    pub fn locate(path: Option<&Path>) -> Result<(PathBuf, Self), ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::find().ok_or(ConfigError::NotFound)?,
        };
        let suite = Self::load(&path)?;
        Ok((path, suite))
    }

    /// Load and validate a suite file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let suite: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        suite.validate()?;
        debug!(
            "Loaded suite {} ({} backends, {} cases)",
            path.display(),
            suite.backends.len(),
            suite.cases.len()
        );
        Ok(suite)
    }

    /// Save suite to file
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        use anyhow::Context;

        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize suite")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize suite")?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write suite file: {}", path.display()))?;

        Ok(())
    }

    /// Validate suite contents
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_VERSIONS.contains(&self.version.as_str()) {
            return Err(ConfigError::UnsupportedVersion(self.version.clone()));
        }

        self.settings.validate()?;
        validate_backends(&self.backends)?;
        validate_cases(&self.cases)
    }

    /// Narrow the suite to the named backends, case ids and tags
    ///
    /// Empty filters select everything. File order is preserved.
    pub fn select(
        &self,
        backend_names: &[String],
        case_ids: &[String],
        tags: &[String],
    ) -> Result<(Vec<BackendConfig>, Vec<TestCase>), ConfigError> {
        for name in backend_names {
            if self.backend(name).is_none() {
                return Err(ConfigError::UnknownBackend(name.clone()));
            }
        }
        for id in case_ids {
            if self.case(id).is_none() {
                return Err(ConfigError::UnknownTestCase(id.clone()));
            }
        }
        for tag in tags {
            if !self.cases.iter().any(|c| c.has_tag(tag)) {
                return Err(ConfigError::UnknownTag(tag.clone()));
            }
        }

        let backends = self
            .backends
            .iter()
            .filter(|b| backend_names.is_empty() || backend_names.contains(&b.name))
            .cloned()
            .collect();

        let cases = self
            .cases
            .iter()
            .filter(|c| case_ids.is_empty() || case_ids.contains(&c.id))
            .filter(|c| tags.is_empty() || tags.iter().any(|t| c.has_tag(t)))
            .cloned()
            .collect::<Vec<_>>();

        if cases.is_empty() {
            return Err(ConfigError::NoTestCases);
        }

        Ok((backends, cases))
    }

    /// Generate example suite
    pub fn example() -> Self {
        let mut o3 = BackendConfig::openai("o3-mini", "o3-mini");
        if let BackendKind::Openai {
            reasoning_effort, ..
        } = &mut o3.kind
        {
            *reasoning_effort = Some("medium".to_string());
        }

        Self {
            version: default_version(),
            settings: AppConfig::default(),
            backends: vec![BackendConfig::ollama("deepseek-r1", "deepseek-r1:1.5b"), o3],
            cases: vec![
                TestCase::new("arithmetic", "What is 2+2? Answer with a number only.")
                    .with_expected("4")
                    .with_tag("math"),
                TestCase::new(
                    "bat-and-ball",
                    "A bat and a ball cost $1.10 in total. The bat costs $1.00 more \
                     than the ball. How much does the ball cost?",
                )
                .with_expected("0.05")
                .with_tag("math")
                .with_tag("trick"),
                TestCase::new(
                    "nlp-advances",
                    "What are the latest advancements in natural language processing?",
                )
                .with_tag("open"),
            ],
        }
    }

    /// Get backend by name
    pub fn backend(&self, name: &str) -> Option<&BackendConfig> {
        self.backends.iter().find(|b| b.name == name)
    }

    /// Get test case by id
    pub fn case(&self, id: &str) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.id == id)
    }
}

/// Reject backend sets that cannot produce attributable results
fn validate_backends(backends: &[BackendConfig]) -> Result<(), ConfigError> {
    if backends.is_empty() {
        return Err(ConfigError::NoBackends);
    }

    let mut seen = HashSet::new();
    for (index, backend) in backends.iter().enumerate() {
        if backend.name.trim().is_empty() {
            return Err(ConfigError::EmptyBackendName { index });
        }
        if !seen.insert(backend.name.as_str()) {
            return Err(ConfigError::DuplicateBackend(backend.name.clone()));
        }
        if backend.kind.model().is_some_and(|m| m.trim().is_empty()) {
            return Err(ConfigError::MissingModel {
                backend: backend.name.clone(),
            });
        }
    }

    Ok(())
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
