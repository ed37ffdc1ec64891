pub mod agent;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod normalize;
pub mod pipeline;
pub mod tracing;

pub use config::AppConfig;
pub use error::{AskError, Result, Stage, StageError};
pub use pipeline::{HealthReport, QueryPipeline, QueryResponse};
