//! Relational sink capability: the pipeline only needs DROP/CREATE semantics,
//! batched INSERTs committed per batch, and arbitrary SELECTs decoded as text.

pub mod mysql;
pub mod sql;

use async_trait::async_trait;
use thiserror::Error;

pub use mysql::MySqlSink;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait RelationalSink: Send + Sync {
    /// Run a single DDL/DML statement, returning affected rows.
    async fn execute(&self, sql: &str) -> Result<u64, SinkError>;

    /// Run `insert_sql` once per row inside a single transaction, committed
    /// before returning. Placeholders bind the row's cells in order.
    async fn insert_batch(&self, insert_sql: &str, rows: &[Vec<String>]) -> Result<u64, SinkError>;

    /// Run a SELECT and return every value as text (NULL becomes `""`).
    async fn query(&self, sql: &str) -> Result<Vec<Vec<String>>, SinkError>;
}
