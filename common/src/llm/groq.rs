use crate::error::{AskError, Result};
use crate::llm::model::{LanguageModel, Message, ModelConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// client for groq's openai-compatible chat completions endpoint
pub struct GroqClient {
    http: Client,
    config: ModelConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl GroqClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .user_agent(concat!("askdb/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AskError::Config(format!("failed to build http client: {}", e)))?;

        tracing::info!(model = %config.model, base_url = %config.base_url, "groq client initialized");

        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LanguageModel for GroqClient {
    #[tracing::instrument(skip(self, messages), fields(message_count = messages.len(), llm.model = %self.config.model))]
    async fn generate(&self, messages: Vec<Message>) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AskError::Generation("model api key is not configured".to_string()))?;

        let body = ChatRequest {
            model: &self.config.model,
            messages: &messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AskError::Generation(format!("request to model api failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AskError::Generation(format!(
                "model api returned {}: {}",
                status, detail
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AskError::Generation(format!("invalid model api response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AskError::Generation("model returned no completion".to_string()))?;

        tracing::debug!("generated {} chars", content.len());

        Ok(content)
    }

    fn is_configured(&self) -> bool {
        self.config.has_api_key()
    }
}
