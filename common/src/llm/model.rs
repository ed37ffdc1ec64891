use crate::error::{AskError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            temperature: 0.1,
            max_tokens: 1024,
        }
    }
}

impl ModelConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(AskError::Config("model name is empty".to_string()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AskError::Config(format!(
                "model base url must be http(s): {}",
                self.base_url
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AskError::Config(format!(
                "temperature must be within 0..=2, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(AskError::Config("max tokens must be positive".to_string()));
        }
        Ok(())
    }
}

/// chat-style text generation backend
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// returns the text of the first completion
    async fn generate(&self, messages: Vec<Message>) -> Result<String>;

    /// whether the backend has a credential to call the remote api with
    fn is_configured(&self) -> bool;
}
