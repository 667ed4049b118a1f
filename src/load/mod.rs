//! Table replacement and batched loading.
//!
//! Every run is a destructive full refresh: the working table is dropped and
//! recreated from the inferred schema, then rows are inserted in fixed-size
//! batches, each committed on its own. A mid-load failure leaves earlier
//! batches durably inserted; a retry must go through [`replace_table`] again
//! before reloading.

use thiserror::Error;
use tracing::info;

use crate::schema::TableSchema;
use crate::sink::{sql, RelationalSink, SinkError};

/// Rows per committed transaction.
pub const BATCH_SIZE: usize = 1000;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("creating table `{table}` failed: {source}")]
    SchemaCreation {
        table: String,
        #[source]
        source: SinkError,
    },
    #[error("batch {batch_index} failed for table `{table}`: {source}")]
    BatchInsert {
        table: String,
        batch_index: usize,
        #[source]
        source: SinkError,
    },
}

/// Drop any existing table of this name and recreate it from the inferred
/// schema. Safe to run even if the table never existed.
pub async fn replace_table(
    sink: &dyn RelationalSink,
    db: &str,
    schema: &TableSchema,
) -> Result<(), LoadError> {
    let failed = |source: SinkError| LoadError::SchemaCreation {
        table: schema.table.clone(),
        source,
    };

    sink.execute(&sql::drop_table(db, &schema.table))
        .await
        .map_err(failed)?;
    sink.execute(&sql::create_table(db, schema))
        .await
        .map_err(failed)?;
    info!(table = %schema.table, columns = schema.columns.len(), "table replaced");
    Ok(())
}

/// Insert `rows` into the working table in `batch_size` chunks, one committed
/// transaction per chunk. Returns the total inserted row count.
pub async fn load_rows(
    sink: &dyn RelationalSink,
    db: &str,
    schema: &TableSchema,
    rows: &[Vec<String>],
    batch_size: usize,
) -> Result<u64, LoadError> {
    let insert_sql = sql::insert_row(db, schema);
    let mut total = 0u64;

    for (batch_index, batch) in rows.chunks(batch_size).enumerate() {
        let inserted = sink
            .insert_batch(&insert_sql, batch)
            .await
            .map_err(|source| LoadError::BatchInsert {
                table: schema.table.clone(),
                batch_index,
                source,
            })?;
        total += inserted;
        info!(table = %schema.table, batch = batch_index, rows = inserted, "batch committed");
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::schema::{Column, ColumnType};

    /// Records per-batch sizes; fails the batch at `fail_at` if set.
    struct CountingSink {
        batches: Mutex<Vec<usize>>,
        fail_at: Option<usize>,
        statements: Mutex<Vec<String>>,
    }

    impl CountingSink {
        fn new(fail_at: Option<usize>) -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail_at,
                statements: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RelationalSink for CountingSink {
        async fn execute(&self, sql: &str) -> Result<u64, SinkError> {
            self.statements.lock().unwrap().push(sql.to_string());
            Ok(0)
        }

        async fn insert_batch(
            &self,
            _insert_sql: &str,
            rows: &[Vec<String>],
        ) -> Result<u64, SinkError> {
            let mut batches = self.batches.lock().unwrap();
            if self.fail_at == Some(batches.len()) {
                return Err(SinkError::Other("forced batch failure".into()));
            }
            batches.push(rows.len());
            Ok(rows.len() as u64)
        }

        async fn query(&self, _sql: &str) -> Result<Vec<Vec<String>>, SinkError> {
            Ok(Vec::new())
        }
    }

    fn schema() -> TableSchema {
        TableSchema {
            table: "recv".into(),
            columns: vec![Column {
                name: "Issued_On".into(),
                ty: ColumnType::Text,
            }],
        }
    }

    fn rows(n: usize) -> Vec<Vec<String>> {
        (0..n).map(|i| vec![format!("2025-08-{:02}", i % 28 + 1)]).collect()
    }

    #[tokio::test]
    async fn batches_partition_exactly() {
        let sink = CountingSink::new(None);
        let total = load_rows(&sink, "db", &schema(), &rows(2500), 1000)
            .await
            .unwrap();
        assert_eq!(total, 2500);
        assert_eq!(*sink.batches.lock().unwrap(), vec![1000, 1000, 500]);
    }

    #[tokio::test]
    async fn odd_batch_sizes_still_sum_to_total() {
        let sink = CountingSink::new(None);
        let total = load_rows(&sink, "db", &schema(), &rows(7), 3).await.unwrap();
        assert_eq!(total, 7);
        assert_eq!(*sink.batches.lock().unwrap(), vec![3, 3, 1]);
    }

    #[tokio::test]
    async fn failing_batch_reports_its_index() {
        let sink = CountingSink::new(Some(1));
        let err = load_rows(&sink, "db", &schema(), &rows(2500), 1000)
            .await
            .unwrap_err();
        match err {
            LoadError::BatchInsert { batch_index, .. } => assert_eq!(batch_index, 1),
            other => panic!("unexpected error: {other}"),
        }
        // The first batch was already committed before the failure.
        assert_eq!(*sink.batches.lock().unwrap(), vec![1000]);
    }

    #[tokio::test]
    async fn replace_drops_then_creates() {
        let sink = CountingSink::new(None);
        replace_table(&sink, "db", &schema()).await.unwrap();
        let statements = sink.statements.lock().unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("DROP TABLE IF EXISTS"));
        assert!(statements[1].starts_with("CREATE TABLE"));
    }
}
