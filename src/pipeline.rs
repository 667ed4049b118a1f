//! One full load-aggregate-publish run.
//!
//! Dataset loads are isolated: a dataset that fails to fetch or load is
//! recorded and skipped, the rest proceed. A publish failure after retries is
//! fatal to the run. Whatever happens, the ephemeral database is dropped at
//! the end.

use anyhow::Result;
use tracing::{error, info, warn};

use crate::aggregate::{self, ReportWindow, METRICS};
use crate::config::Config;
use crate::fetch::{load_dataset, SourceFetch};
use crate::load::{self, BATCH_SIZE};
use crate::publish::{PublishOutcome, PublishTarget, Publisher, SheetWriter};
use crate::schema::derive_schema;
use crate::sink::{sql, RelationalSink};

/// What happened to each dataset and metric, surfaced at run end.
#[derive(Debug, Default)]
pub struct RunReport {
    pub loaded: Vec<(String, u64)>,
    pub skipped: Vec<(String, String)>,
    pub published: Vec<(String, PublishOutcome)>,
}

impl RunReport {
    fn table_loaded(&self, table: &str) -> bool {
        self.loaded.iter().any(|(t, _)| t == table)
    }
}

pub struct Pipeline<'a> {
    config: &'a Config,
    fetcher: &'a dyn SourceFetch,
    sink: &'a dyn RelationalSink,
    publisher: Publisher<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        fetcher: &'a dyn SourceFetch,
        sink: &'a dyn RelationalSink,
        writer: &'a dyn SheetWriter,
    ) -> Self {
        Self {
            config,
            fetcher,
            sink,
            publisher: Publisher::new(writer),
        }
    }

    pub fn with_publisher(
        config: &'a Config,
        fetcher: &'a dyn SourceFetch,
        sink: &'a dyn RelationalSink,
        publisher: Publisher<'a>,
    ) -> Self {
        Self {
            config,
            fetcher,
            sink,
            publisher,
        }
    }

    /// Run the whole pipeline, then drop the ephemeral database no matter how
    /// the body ended. A cleanup failure is logged and never replaces the
    /// body's result.
    pub async fn run(&self, window: ReportWindow) -> Result<RunReport> {
        let body = self.run_body(window).await;

        if let Err(e) = self
            .sink
            .execute(&sql::drop_database(&self.config.database))
            .await
        {
            warn!(error = %e, db = %self.config.database, "cleanup failed, stale schema may remain");
        } else {
            info!(db = %self.config.database, "ephemeral database dropped");
        }

        body
    }

    async fn run_body(&self, window: ReportWindow) -> Result<RunReport> {
        let mut report = RunReport::default();
        let db = &self.config.database;

        self.sink.execute(&sql::create_database(db)).await?;

        // Load each dataset independently; one failure skips that dataset only.
        for source in &self.config.sources {
            match self.load_one(source.table, &source.sheet_id, db).await {
                Ok(rows) => {
                    info!(table = source.table, rows, "dataset loaded");
                    report.loaded.push((source.table.to_string(), rows));
                }
                Err(e) => {
                    error!(table = source.table, error = %e, "dataset skipped");
                    report.skipped.push((source.table.to_string(), e.to_string()));
                }
            }
        }

        for metric in METRICS {
            if !report.table_loaded(metric.table) {
                warn!(table = metric.table, "metric skipped, working table not loaded");
                report
                    .published
                    .push((metric.worksheet.to_string(), PublishOutcome::SkippedNotLoaded));
                continue;
            }

            let result = aggregate::run_metric(self.sink, db, metric, window).await?;
            let target = PublishTarget {
                spreadsheet_id: self.config.output_spreadsheet.clone(),
                worksheet: metric.worksheet.to_string(),
            };
            let outcome = self.publisher.publish(&target, &result).await?;
            report
                .published
                .push((metric.worksheet.to_string(), outcome));
        }

        if !report.skipped.is_empty() {
            warn!(
                skipped = report.skipped.len(),
                datasets = ?report.skipped,
                "run finished with skipped datasets"
            );
        }
        info!(
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            published = report.published.len(),
            "run complete"
        );

        Ok(report)
    }

    async fn load_one(&self, table: &str, sheet_id: &str, db: &str) -> Result<u64> {
        let raw = load_dataset(self.fetcher, sheet_id, table).await?;
        let schema = derive_schema(table, &raw)?;
        load::replace_table(self.sink, db, &schema).await?;
        let rows = load::load_rows(self.sink, db, &schema, &raw.rows, BATCH_SIZE).await?;
        Ok(rows)
    }
}
