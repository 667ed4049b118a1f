//! sqlx-backed MySQL implementation of the relational sink.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::Row;

use super::{RelationalSink, SinkError};

#[derive(Debug, Clone)]
pub struct MySqlSink {
    pool: MySqlPool,
}

impl MySqlSink {
    /// Connect a pool to the MySQL server. The URL should not pin a default
    /// schema: every statement the pipeline issues is database-qualified, and
    /// the ephemeral database is dropped at run end.
    pub async fn connect(url: &str, pool_size: u32) -> Result<Self, SinkError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl RelationalSink for MySqlSink {
    async fn execute(&self, sql: &str) -> Result<u64, SinkError> {
        let result = sqlx::query(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn insert_batch(&self, insert_sql: &str, rows: &[Vec<String>]) -> Result<u64, SinkError> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0u64;
        for row in rows {
            let mut query = sqlx::query(insert_sql);
            for cell in row {
                query = query.bind(cell.as_str());
            }
            affected += query.execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }

    async fn query(&self, sql: &str) -> Result<Vec<Vec<String>>, SinkError> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let mut cells = Vec::with_capacity(row.len());
            for idx in 0..row.len() {
                let value: Option<String> = row.try_get(idx)?;
                cells.push(value.unwrap_or_default());
            }
            out.push(cells);
        }
        Ok(out)
    }
}
