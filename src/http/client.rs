//! HTTP client for model APIs
//!
//! Thin JSON-over-HTTP wrapper shared by the remote backends. Transport
//! failures are mapped onto [`BackendError`] so they can be recorded per call.

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::backend::BackendError;

const USER_AGENT: &str = concat!("reasoning-harness/", env!("CARGO_PKG_VERSION"));

/// Longest API error body kept in an error message
const MAX_ERROR_BODY: usize = 300;

/// HTTP client for backend calls
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    timeout_secs: u64,
}

impl HttpClient {
    /// Create client with custom timeout
    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    /// POST a JSON body and decode a JSON response
    pub async fn post_json(
        &self,
        url: &str,
        body: &Value,
        bearer: Option<&str>,
    ) -> std::result::Result<Value, BackendError> {
        debug!("Sending POST request to {}", url);

        let mut request = self.client.post(url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let start = Instant::now();
        let response = request.send().await.map_err(|e| self.classify(e, url))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(e, url))?;

        debug!(
            "Response: {} {} in {}ms",
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| BackendError::InvalidResponse(format!("body is not JSON: {e}")))
    }

    fn classify(&self, error: reqwest::Error, url: &str) -> BackendError {
        if error.is_timeout() {
            BackendError::Timeout(self.timeout_secs)
        } else if error.is_connect() {
            BackendError::Connection(url.to_string())
        } else {
            BackendError::Request(error.to_string())
        }
    }
}

/// Pull the provider's message out of an error body
fn api_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let message = json
            .pointer("/error/message")
            .or_else(|| json.get("error"))
            .and_then(|v| v.as_str());
        if let Some(message) = message {
            return message.to_string();
        }
    }

    let body = body.trim();
    if body.chars().count() > MAX_ERROR_BODY {
        let cut: String = body.chars().take(MAX_ERROR_BODY).collect();
        format!("{cut}…")
    } else {
        body.to_string()
    }
}
