//! LLM provider implementations
//!
//! Hosted and local backends plus a scripted provider for tests.

use crate::llm::{ChatRequest, ChatResponse, LlmProvider};
use crate::BrochureError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

// OpenAI-compatible chat completions (hosted OpenAI, Ollama's /v1 endpoint)
pub mod openai;

// Ollama's native /api/chat endpoint
pub mod ollama;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

enum MockReply {
    Content(String),
    Failure(String),
}

/// Mock LLM provider for testing.
///
/// Replies are handed out in the order they were queued; every request is
/// recorded so tests can check what was sent.
pub struct MockProvider {
    name: String,
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(MockReply::Content(content.into()));
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(MockReply::Failure(message.into()));
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn push(&self, reply: MockReply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, BrochureError> {
        let model = request.model.clone();
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let reply = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front());

        match reply {
            Some(MockReply::Content(content)) => Ok(ChatResponse {
                content,
                model,
                usage: None,
            }),
            Some(MockReply::Failure(message)) => Err(BrochureError::external("mock", message)),
            None => Err(BrochureError::external("mock", "no scripted reply left")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_replays_in_order() {
        let provider = MockProvider::new()
            .with_response("first")
            .with_failure("boom")
            .with_response("third");

        let request = ChatRequest::new("m", "sys", "user");
        assert_eq!(provider.complete(request.clone()).await.unwrap().content, "first");
        assert!(provider.complete(request.clone()).await.is_err());
        assert_eq!(provider.complete(request.clone()).await.unwrap().content, "third");
        assert!(provider.complete(request).await.is_err());

        assert_eq!(provider.requests().len(), 4);
        assert_eq!(provider.name(), "mock");
    }
}
