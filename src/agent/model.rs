//! Chat model abstraction used by the agent loop.

use crate::config::Settings;
use crate::error::{CurioError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestMessage, ChatCompletionTool,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// One assistant turn: optional text plus any requested tool calls.
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ChatCompletionMessageToolCall>,
}

/// Trait for chat models that support tool calling.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the next assistant turn for a conversation.
    async fn complete(
        &self,
        messages: &[ChatCompletionRequestMessage],
        tools: &[ChatCompletionTool],
    ) -> Result<ModelTurn>;
}

/// OpenAI chat-completions model.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    /// Create a model from settings. Fails when no API key is configured.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.agent.model.clone(),
            temperature: settings.agent.temperature,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, messages, tools), fields(model = %self.model, messages = messages.len()))]
    async fn complete(
        &self,
        messages: &[ChatCompletionRequestMessage],
        tools: &[ChatCompletionTool],
    ) -> Result<ModelTurn> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .messages(messages.to_vec())
            .tools(tools.to_vec())
            .build()
            .map_err(|e| CurioError::Agent(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| CurioError::OpenAI(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CurioError::Agent("No response from model".to_string()))?;

        debug!(
            "Model turn: finish_reason={:?}, tool_calls={}",
            choice.finish_reason,
            choice.message.tool_calls.as_ref().map_or(0, Vec::len)
        );

        Ok(ModelTurn {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
        })
    }
}
