//! Model backends
//!
//! A backend turns a prompt into a completion. Remote backends talk to
//! Ollama or an OpenAI-compatible API; the fixed backends answer locally
//! and are used for dry runs.

mod fixed;
mod ollama;
mod openai;
mod reasoning;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::config::ConfigError;
use crate::http::HttpClient;
use crate::models::{BackendConfig, BackendKind};

pub use fixed::{EchoBackend, StaticBackend};
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
pub use reasoning::split_reasoning;

/// Errors from a single backend call
///
/// Recorded in the result for the failing pair; never aborts a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Connection failed to {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    Request(String),
}

/// Text produced by a backend for one prompt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    /// Final answer
    pub text: String,
    /// Reasoning trace, when the model exposes one
    pub reasoning: Option<String>,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reasoning: None,
        }
    }

    /// Split `<think>` blocks out of raw model output
    pub fn from_raw(raw: &str) -> Self {
        let (text, reasoning) = split_reasoning(raw);
        Self { text, reasoning }
    }

    /// Prefer a reasoning trace delivered out of band by the API
    pub fn with_reasoning(mut self, reasoning: Option<String>) -> Self {
        if let Some(reasoning) = reasoning.filter(|r| !r.trim().is_empty()) {
            self.reasoning = Some(reasoning.trim().to_string());
        }
        self
    }
}

/// A reasoning-model endpoint
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Name recorded in results
    fn name(&self) -> &str;

    /// Submit a prompt and wait for the completion
    async fn invoke(&self, prompt: &str) -> Result<Completion, BackendError>;
}

/// Build a backend from its suite entry
pub fn build(
    config: &BackendConfig,
    timeout_secs: u64,
) -> Result<Arc<dyn ModelBackend>, ConfigError> {
    debug!("Building backend {}", config);

    let backend: Arc<dyn ModelBackend> = match &config.kind {
        BackendKind::Ollama { model, endpoint } => Arc::new(OllamaBackend::new(
            &config.name,
            model,
            endpoint,
            http_client(&config.name, timeout_secs)?,
        )),
        BackendKind::Openai {
            model,
            base_url,
            api_key_env,
            reasoning_effort,
            max_completion_tokens,
        } => {
            let api_key = std::env::var(api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingApiKey {
                    backend: config.name.clone(),
                    var: api_key_env.clone(),
                })?;

            Arc::new(
                OpenAiBackend::new(
                    &config.name,
                    model,
                    base_url,
                    api_key,
                    http_client(&config.name, timeout_secs)?,
                )
                .with_reasoning_effort(reasoning_effort.clone())
                .with_max_completion_tokens(*max_completion_tokens),
            )
        }
        BackendKind::Static { response } => Arc::new(StaticBackend::new(&config.name, response)),
        BackendKind::Echo => Arc::new(EchoBackend::new(&config.name)),
    };

    Ok(backend)
}

/// Build every backend, failing on the first configuration problem
pub fn build_all(
    configs: &[BackendConfig],
    timeout_secs: u64,
) -> Result<Vec<Arc<dyn ModelBackend>>, ConfigError> {
    configs.iter().map(|c| build(c, timeout_secs)).collect()
}

fn http_client(backend: &str, timeout_secs: u64) -> Result<HttpClient, ConfigError> {
    HttpClient::with_timeout(timeout_secs).map_err(|e| ConfigError::BackendInit {
        backend: backend.to_string(),
        message: format!("{e:#}"),
    })
}
