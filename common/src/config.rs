use crate::error::{AskError, Result};
use crate::llm::ModelConfig;

/// fully assembled service configuration, built by the binary from cli/env
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub model: ModelConfig,
    pub allowed_origins: Vec<String>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        validate_database_url(&self.database_url)?;
        self.model.validate()?;

        if self.allowed_origins.is_empty() {
            return Err(AskError::Config(
                "at least one allowed origin is required (use * for any)".to_string(),
            ));
        }
        if self.allowed_origins.iter().any(|o| o.trim().is_empty()) {
            return Err(AskError::Config(
                "allowed origins must not contain empty entries".to_string(),
            ));
        }

        Ok(())
    }
}

pub fn validate_database_url(url: &str) -> Result<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AskError::Config("database url is not set".to_string()));
    }
    if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
        return Err(AskError::Config(
            "database url must use the postgres:// or postgresql:// scheme".to_string(),
        ));
    }
    Ok(())
}

/// split a comma separated origin list, trimming whitespace
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
