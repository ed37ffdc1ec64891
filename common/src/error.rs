use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AskError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database connection failed: {0}")]
    Connection(String),

    #[error("failed to generate sql: {0}")]
    Generation(String),

    #[error("sql execution failed: {0}")]
    Execution(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AskError {
    /// true when the failure is attributable to the question (the sql it produced
    /// could not run), false for infrastructure and service failures
    pub fn is_client_error(&self) -> bool {
        matches!(self, AskError::Execution(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AskError::Config(_) => "config",
            AskError::Connection(_) => "connection",
            AskError::Generation(_) => "generation",
            AskError::Execution(_) => "execution",
            AskError::Unexpected(_) => "unexpected",
        }
    }
}

impl From<serde_json::Error> for AskError {
    fn from(e: serde_json::Error) -> Self {
        AskError::Unexpected(format!("json error: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, AskError>;

/// pipeline stage that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Introspection,
    Generation,
    Execution,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Introspection => "introspection",
            Stage::Generation => "generation",
            Stage::Execution => "execution",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// failure of a single pipeline run, tagged with the stage that aborted it
#[derive(Error, Debug, Clone)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: AskError,
}

impl StageError {
    pub fn new(stage: Stage, source: AskError) -> Self {
        Self { stage, source }
    }

    pub fn is_client_error(&self) -> bool {
        self.source.is_client_error()
    }
}
