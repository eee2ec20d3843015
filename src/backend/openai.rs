//! OpenAI-compatible chat completions backend
//!
//! Sends the prompt as a single user message. Reasoning models (o1, o3-mini)
//! reject sampling parameters, so none are sent; `reasoning_effort` and
//! `max_completion_tokens` are passed through when configured.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{BackendError, Completion, ModelBackend};
use crate::http::HttpClient;

/// Model behind an OpenAI-compatible API
#[derive(Clone)]
pub struct OpenAiBackend {
    name: String,
    model: String,
    base_url: String,
    api_key: String,
    reasoning_effort: Option<String>,
    max_completion_tokens: Option<u32>,
    client: HttpClient,
}

impl OpenAiBackend {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        client: HttpClient,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            reasoning_effort: None,
            max_completion_tokens: None,
            client,
        }
    }

    pub fn with_reasoning_effort(mut self, effort: Option<String>) -> Self {
        self.reasoning_effort = effort;
        self
    }

    pub fn with_max_completion_tokens(mut self, tokens: Option<u32>) -> Self {
        self.max_completion_tokens = tokens;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, prompt: &str) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });
        if let Some(effort) = &self.reasoning_effort {
            body["reasoning_effort"] = json!(effort);
        }
        if let Some(tokens) = self.max_completion_tokens {
            body["max_completion_tokens"] = json!(tokens);
        }
        body
    }
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, prompt: &str) -> Result<Completion, BackendError> {
        debug!("[{}] chat completion with {}", self.name, self.model);
        let data = self
            .client
            .post_json(
                &self.completions_url(),
                &self.request_body(prompt),
                Some(&self.api_key),
            )
            .await?;

        let message = data
            .pointer("/choices/0/message")
            .ok_or_else(|| BackendError::InvalidResponse("no choices returned".to_string()))?;

        let text = match message.get("content").and_then(|v| v.as_str()) {
            Some(text) => text,
            None => {
                let refusal = message
                    .get("refusal")
                    .and_then(|v| v.as_str())
                    .unwrap_or("message has no content");
                return Err(BackendError::InvalidResponse(refusal.to_string()));
            }
        };

        // DeepSeek's API returns the trace beside the answer
        let reasoning = message
            .get("reasoning_content")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(Completion::from_raw(text).with_reasoning(reasoning))
    }
}
