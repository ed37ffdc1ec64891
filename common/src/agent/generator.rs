use crate::agent::parser::strip_code_fences;
use crate::agent::prompt::PromptPayload;
use crate::error::{AskError, Result};
use crate::llm::LanguageModel;
use std::sync::Arc;

/// turns a composed prompt into executable sql text via a language model
#[derive(Clone)]
pub struct SqlGenerator {
    model: Arc<dyn LanguageModel>,
}

impl SqlGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_configured()
    }

    #[tracing::instrument(skip(self, payload), fields(system_len = payload.system.len(), question_len = payload.user.len()))]
    pub async fn generate(&self, payload: &PromptPayload) -> Result<String> {
        let output = self.model.generate(payload.messages()).await?;

        let sql = strip_code_fences(&output);
        if sql.is_empty() {
            return Err(AskError::Generation(
                "model returned empty output".to_string(),
            ));
        }

        tracing::info!(sql_length = sql.len(), "sql generated");
        Ok(sql)
    }
}
