//! Chat language model abstraction.

use crate::config::ComposerSettings;
use crate::error::{AskrError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// A single-turn chat completion.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `user` under the given `system` prompt and return the text reply.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// OpenAI chat completions.
pub struct OpenAIChat {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChat {
    pub fn new(model: &str, temperature: f32, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(timeout)?,
            model: model.to_string(),
            temperature,
        })
    }

    /// Create a chat model from configuration.
    pub fn from_settings(settings: &ComposerSettings) -> Result<Self> {
        Self::new(
            &settings.model,
            settings.temperature,
            Duration::from_secs(settings.timeout_secs),
        )
    }
}

#[async_trait]
impl LanguageModel for OpenAIChat {
    #[instrument(skip(self, system, user), fields(model = %self.model))]
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| AskrError::Composer(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| AskrError::Composer(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| AskrError::Composer(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            AskrError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| AskrError::Composer("Empty response from LLM".to_string()))?
            .clone();

        debug!("Completion returned {} chars", content.len());

        Ok(content)
    }
}
