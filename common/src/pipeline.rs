use crate::agent::{compose, SqlGenerator};
use crate::db::Database;
use crate::error::{Stage, StageError};
use crate::normalize::{normalize, Row};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub sql: String,
    pub results: Vec<Row>,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub database_ok: bool,
    pub model_configured: bool,
    pub detail: Option<String>,
}

pub fn explanation_for(question: &str) -> String {
    format!("Generated and executed query for: {}", question)
}

/// question in, rows out. Holds no per-request state.
#[derive(Clone)]
pub struct QueryPipeline {
    db: Arc<dyn Database>,
    generator: SqlGenerator,
}

impl QueryPipeline {
    pub fn new(db: Arc<dyn Database>, generator: SqlGenerator) -> Self {
        Self { db, generator }
    }

    #[tracing::instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn run(&self, question: &str) -> Result<QueryResponse, StageError> {
        let start = Instant::now();
        tracing::info!("received question: {}", question);

        let snapshot = self
            .db
            .snapshot()
            .await
            .map_err(|e| StageError::new(Stage::Introspection, e))?;
        let schema_text = snapshot.render();
        tracing::debug!(schema_len = schema_text.len(), "schema rendered");

        let payload = compose(question, &schema_text);

        let sql = self
            .generator
            .generate(&payload)
            .await
            .map_err(|e| StageError::new(Stage::Generation, e))?;
        tracing::info!("generated sql: {}", sql);

        let raw = self
            .db
            .execute(&sql)
            .await
            .map_err(|e| StageError::new(Stage::Execution, e))?;

        let results = normalize(raw);
        tracing::info!(
            row_count = results.rows.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "question answered"
        );

        Ok(QueryResponse {
            sql,
            results: results.rows,
            explanation: explanation_for(question),
        })
    }

    pub async fn schema(&self) -> Result<String, StageError> {
        let snapshot = self
            .db
            .snapshot()
            .await
            .map_err(|e| StageError::new(Stage::Introspection, e))?;
        Ok(snapshot.render())
    }

    pub async fn health(&self) -> HealthReport {
        let model_configured = self.generator.is_configured();
        match self.db.ping().await {
            Ok(()) => HealthReport {
                database_ok: true,
                model_configured,
                detail: None,
            },
            Err(e) => {
                tracing::warn!("database probe failed: {}", e);
                HealthReport {
                    database_ok: false,
                    model_configured,
                    detail: Some(e.to_string()),
                }
            }
        }
    }
}
