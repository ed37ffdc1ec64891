pub mod executor;
pub mod introspect;
pub mod postgres;
pub mod value;

pub use introspect::{ColumnDescriptor, SchemaSnapshot, TableDescriptor};
pub use postgres::PgDatabase;
pub use value::{Number, RawResultSet, RawValue, Temporal};

use crate::error::{AskError, Result};
use async_trait::async_trait;

/// the database a pipeline run talks to. Every call opens and releases its own connection.
#[async_trait]
pub trait Database: Send + Sync {
    async fn snapshot(&self) -> Result<SchemaSnapshot>;

    async fn execute(&self, sql: &str) -> Result<RawResultSet>;

    /// connectivity probe used by health checks
    async fn ping(&self) -> Result<()>;
}

/// split driver failures into client-attributable (the statement) and infrastructure
pub(crate) fn classify_sqlx_error(e: sqlx::Error) -> AskError {
    match e {
        sqlx::Error::Database(db) => {
            let msg = match db.code() {
                Some(code) => format!("{} (sqlstate {})", db.message(), code),
                None => db.message().to_string(),
            };
            AskError::Execution(msg)
        }
        sqlx::Error::RowNotFound
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_) => AskError::Execution(e.to_string()),
        sqlx::Error::Configuration(_)
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => AskError::Connection(e.to_string()),
        other => AskError::Unexpected(other.to_string()),
    }
}
