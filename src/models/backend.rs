//! Backend configuration models
//!
//! Describes the model endpoints a suite can be run against.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default local Ollama endpoint
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// Default OpenAI-compatible API base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default environment variable holding the OpenAI API key
pub const DEFAULT_OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// A named model backend entry from the suite file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Name recorded in every result produced by this backend
    pub name: String,

    #[serde(flatten)]
    pub kind: BackendKind,
}

/// Supported backend kinds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendKind {
    /// Local Ollama server (`/api/generate`)
    Ollama {
        model: String,
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
    },

    /// OpenAI-compatible chat completions API
    Openai {
        model: String,
        #[serde(default = "default_openai_base_url")]
        base_url: String,
        #[serde(default = "default_openai_key_env")]
        api_key_env: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reasoning_effort: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_completion_tokens: Option<u32>,
    },

    /// Always answers with the same text
    Static { response: String },

    /// Answers with the prompt itself
    Echo,
}

fn default_ollama_endpoint() -> String {
    DEFAULT_OLLAMA_ENDPOINT.to_string()
}

fn default_openai_base_url() -> String {
    DEFAULT_OPENAI_BASE_URL.to_string()
}

fn default_openai_key_env() -> String {
    DEFAULT_OPENAI_KEY_ENV.to_string()
}

impl BackendKind {
    /// Short kind label
    pub fn label(&self) -> &'static str {
        match self {
            BackendKind::Ollama { .. } => "ollama",
            BackendKind::Openai { .. } => "openai",
            BackendKind::Static { .. } => "static",
            BackendKind::Echo => "echo",
        }
    }

    /// Remote model identifier, if the kind talks to a model
    pub fn model(&self) -> Option<&str> {
        match self {
            BackendKind::Ollama { model, .. } | BackendKind::Openai { model, .. } => Some(model),
            BackendKind::Static { .. } | BackendKind::Echo => None,
        }
    }

    /// Whether invoking this backend leaves the process
    pub fn is_remote(&self) -> bool {
        matches!(self, BackendKind::Ollama { .. } | BackendKind::Openai { .. })
    }
}

impl BackendConfig {
    pub fn ollama(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BackendKind::Ollama {
                model: model.into(),
                endpoint: default_ollama_endpoint(),
            },
        }
    }

    pub fn openai(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BackendKind::Openai {
                model: model.into(),
                base_url: default_openai_base_url(),
                api_key_env: default_openai_key_env(),
                reasoning_effort: None,
                max_completion_tokens: None,
            },
        }
    }

    pub fn fixed(name: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BackendKind::Static {
                response: response.into(),
            },
        }
    }

    pub fn echo(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BackendKind::Echo,
        }
    }
}

impl fmt::Display for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.model() {
            Some(model) => write!(f, "{} ({} {})", self.name, self.kind.label(), model),
            None => write!(f, "{} ({})", self.name, self.kind.label()),
        }
    }
}
