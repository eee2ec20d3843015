//! Ollama backend
//!
//! Calls a local Ollama server's non-streaming `/api/generate` endpoint.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{BackendError, Completion, ModelBackend};
use crate::http::HttpClient;

/// Model served by an Ollama instance
#[derive(Clone, Debug)]
pub struct OllamaBackend {
    name: String,
    model: String,
    endpoint: String,
    client: HttpClient,
}

impl OllamaBackend {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
        client: HttpClient,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            endpoint: endpoint.into(),
            client,
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, prompt: &str) -> Result<Completion, BackendError> {
        let payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        debug!("[{}] generate with {}", self.name, self.model);
        let data = self
            .client
            .post_json(&self.generate_url(), &payload, None)
            .await?;

        let text = data
            .get("response")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                BackendError::InvalidResponse("missing `response` field".to_string())
            })?;

        // newer servers return the trace separately when thinking is enabled
        let thinking = data
            .get("thinking")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(Completion::from_raw(text).with_reasoning(thinking))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> OllamaBackend {
        OllamaBackend::new(
            "deepseek-r1",
            "deepseek-r1:1.5b",
            format!("{}/", server.uri()),
            HttpClient::with_timeout(5).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_generate_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_json(json!({
                "model": "deepseek-r1:1.5b",
                "prompt": "2+2?",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "deepseek-r1:1.5b",
                "response": "<think>\n2 and 2 make 4\n</think>\n\n4",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = backend(&server).invoke("2+2?").await.unwrap();
        assert_eq!(completion.text, "4");
        assert_eq!(completion.reasoning.as_deref(), Some("2 and 2 make 4"));
    }

    #[tokio::test]
    async fn test_separate_thinking_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "4",
                "thinking": "simple addition",
                "done": true
            })))
            .mount(&server)
            .await;

        let completion = backend(&server).invoke("2+2?").await.unwrap();
        assert_eq!(completion.text, "4");
        assert_eq!(completion.reasoning.as_deref(), Some("simple addition"));
    }

    #[tokio::test]
    async fn test_missing_response_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
            .mount(&server)
            .await;

        let err = backend(&server).invoke("2+2?").await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_model_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"error": "model 'deepseek-r1:1.5b' not found"})),
            )
            .mount(&server)
            .await;

        let err = backend(&server).invoke("2+2?").await.unwrap_err();
        assert_eq!(
            err,
            BackendError::Api {
                status: 404,
                message: "model 'deepseek-r1:1.5b' not found".to_string()
            }
        );
    }
}
