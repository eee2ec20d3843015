//! Local backends that never leave the process

use async_trait::async_trait;

use super::{BackendError, Completion, ModelBackend};

/// Always answers with the configured response
#[derive(Clone, Debug)]
pub struct StaticBackend {
    name: String,
    response: String,
}

impl StaticBackend {
    pub fn new(name: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: response.into(),
        }
    }
}

#[async_trait]
impl ModelBackend for StaticBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, _prompt: &str) -> Result<Completion, BackendError> {
        Ok(Completion::from_raw(&self.response))
    }
}

/// Answers with the prompt it was given
#[derive(Clone, Debug)]
pub struct EchoBackend {
    name: String,
}

impl EchoBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl ModelBackend for EchoBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, prompt: &str) -> Result<Completion, BackendError> {
        Ok(Completion::new(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_backend() {
        let backend = StaticBackend::new("four", "<think>easy</think>4");
        let completion = tokio_test::block_on(backend.invoke("2+2?")).unwrap();
        assert_eq!(completion.text, "4");
        assert_eq!(completion.reasoning.as_deref(), Some("easy"));
    }

    #[test]
    fn test_echo_backend() {
        let backend = EchoBackend::new("echo");
        let completion = tokio_test::block_on(backend.invoke("hello")).unwrap();
        assert_eq!(completion, Completion::new("hello"));
        assert_eq!(backend.name(), "echo");
    }
}
