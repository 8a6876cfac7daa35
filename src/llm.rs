//! Chat-style LLM call contract shared by every provider.
//!
//! A [`ChatRequest`] carries the model name, an ordered list of messages and a
//! JSON-mode flag. Providers return the text of the first completion; turning that
//! text into typed data is done right after the call with [`parse_json_content`],
//! so untyped JSON never travels further than the caller that asked for it.

use crate::BrochureError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Ask the backend for a response that is a single JSON document.
    pub json_mode: bool,
}

impl ChatRequest {
    /// The common system + user pair.
    pub fn new(model: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            json_mode: false,
        }
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    /// Content of the last user message, if any.
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

/// Token usage information
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the name of the provider
    fn name(&self) -> &str;

    /// Send one chat request and return the first completion.
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, BrochureError>;
}

/// Parses a JSON-mode completion.
///
/// A surrounding markdown code fence is tolerated; anything else that is not a
/// single valid JSON document is a [`BrochureError::MalformedModelResponse`].
pub fn parse_json_content(content: &str) -> Result<Value, BrochureError> {
    let body = strip_code_fence(content.trim());
    serde_json::from_str(body).map_err(|e| {
        BrochureError::MalformedModelResponse(format!("response is not valid JSON: {e}"))
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return text;
    };
    // drop the info string, e.g. "json"
    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim(),
        None => inner.trim(),
    }
}
