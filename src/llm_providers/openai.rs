//! OpenAI-compatible provider built on async-openai.
//!
//! Works against the hosted OpenAI API and against any server exposing the same
//! chat-completions endpoint, such as a local Ollama at `http://localhost:11434/v1`.

use super::*;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionResponseFormat, ChatCompletionResponseFormatType,
    CreateChatCompletionRequestArgs,
};
use async_openai::{config::OpenAIConfig, Client};
use crate::llm::{ChatMessage, Role, TokenUsage};
use tracing::{debug, instrument};

pub const LOCAL_OPENAI_BASE: &str = "http://localhost:11434/v1";

/// Ollama ignores the key but the client insists on sending one.
const LOCAL_API_KEY: &str = "ollama";

pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    name: String,
}

impl OpenAiProvider {
    /// Hosted OpenAI with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self::from_config(config, "openai")
    }

    /// Local OpenAI-compatible server, Ollama by default.
    pub fn local(api_base: impl Into<String>) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(LOCAL_API_KEY);
        Self::from_config(config, "local")
    }

    /// Create from custom client configuration
    pub fn from_config(config: OpenAIConfig, name: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            name: name.into(),
        }
    }

    fn to_openai_message(&self, message: &ChatMessage) -> Result<ChatCompletionRequestMessage, BrochureError> {
        let converted = match message.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map(ChatCompletionRequestMessage::System),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map(ChatCompletionRequestMessage::User),
            Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map(ChatCompletionRequestMessage::Assistant),
        };
        converted.map_err(|e| BrochureError::external(&self.name, format!("Failed to build message: {e}")))
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(level = "debug", skip_all, fields(provider = %self.name, model = %request.model))]
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, BrochureError> {
        let messages = request
            .messages
            .iter()
            .map(|m| self.to_openai_message(m))
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&request.model).messages(messages);
        if request.json_mode {
            builder.response_format(ChatCompletionResponseFormat {
                r#type: ChatCompletionResponseFormatType::JsonObject,
            });
        }
        let openai_request = builder
            .build()
            .map_err(|e| BrochureError::external(&self.name, format!("Failed to build request: {e}")))?;

        let response = self
            .client
            .chat()
            .create(openai_request)
            .await
            .map_err(|e| BrochureError::external(&self.name, format!("API request failed: {e}")))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| BrochureError::external(&self.name, "No content in response"))?;

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        debug!(content_length = content.len(), usage = ?usage, "Received completion");

        Ok(ChatResponse {
            content,
            model: response.model,
            usage,
        })
    }
}
