//! Republishing aggregates to spreadsheet worksheets.
//!
//! The publish cycle is full-replace: clear the worksheet, write header and
//! rows from a fixed origin, then stamp a completion timestamp into a fixed
//! marker cell. An empty aggregate skips the cycle entirely so a previously
//! successful publish is never erased.

pub mod sheets;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use thiserror::Error;
use tracing::info;

use crate::aggregate::AggregateResult;
use crate::retry::RetryPolicy;

pub use sheets::SheetsClient;

/// Where the rows land and where the completion stamp goes.
pub const WRITE_ORIGIN: &str = "A1";
pub const TIMESTAMP_CELL: &str = "AC2";

#[derive(Debug, Error)]
pub enum PublishError {
    /// Expected to resolve after a delay (rate limiting, temporary outage).
    #[error("transient publish failure: {0}")]
    Transient(String),
    #[error("publish failed: {0}")]
    Fatal(String),
}

impl PublishError {
    pub fn is_transient(&self) -> bool {
        matches!(self, PublishError::Transient(_))
    }
}

/// A write target for one aggregate result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub spreadsheet_id: String,
    pub worksheet: String,
}

/// Destination write capability. Implementations must classify rate limiting
/// and temporary unavailability as [`PublishError::Transient`] so the retry
/// policy can act on it.
#[async_trait]
pub trait SheetWriter: Send + Sync {
    async fn clear(&self, target: &PublishTarget) -> Result<(), PublishError>;
    async fn write_rows(
        &self,
        target: &PublishTarget,
        origin: &str,
        rows: &[Vec<String>],
    ) -> Result<(), PublishError>;
    async fn write_cell(
        &self,
        target: &PublishTarget,
        cell: &str,
        value: &str,
    ) -> Result<(), PublishError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Written { rows: usize },
    /// The aggregate had no rows in the window; the destination was left as is.
    SkippedEmpty,
    /// The metric's working table never loaded this run, so no aggregate ran.
    SkippedNotLoaded,
}

pub struct Publisher<'a> {
    writer: &'a dyn SheetWriter,
    retry: RetryPolicy,
    /// Courtesy pauses against the destination's request quota: one before
    /// the clear, one before the timestamp write.
    clear_delay: Duration,
    stamp_delay: Duration,
}

impl<'a> Publisher<'a> {
    pub fn new(writer: &'a dyn SheetWriter) -> Self {
        Self {
            writer,
            retry: RetryPolicy::default(),
            clear_delay: Duration::from_secs(5),
            stamp_delay: Duration::from_secs(2),
        }
    }

    pub fn with_timing(
        writer: &'a dyn SheetWriter,
        retry: RetryPolicy,
        clear_delay: Duration,
        stamp_delay: Duration,
    ) -> Self {
        Self {
            writer,
            retry,
            clear_delay,
            stamp_delay,
        }
    }

    /// Publish one aggregate to its target. Empty results are skipped without
    /// touching the destination. Retry exhaustion surfaces as a fatal error.
    pub async fn publish(
        &self,
        target: &PublishTarget,
        result: &AggregateResult,
    ) -> Result<PublishOutcome, PublishError> {
        if result.is_empty() {
            info!(worksheet = %target.worksheet, "aggregate empty, publish skipped");
            return Ok(PublishOutcome::SkippedEmpty);
        }

        let attempt = self
            .retry
            .run(|| self.publish_once(target, result), PublishError::is_transient)
            .await;

        match attempt {
            Ok(()) => Ok(PublishOutcome::Written {
                rows: result.rows.len(),
            }),
            Err(err) if err.is_transient() => Err(PublishError::Fatal(format!(
                "retries exhausted after {} attempts: {err}",
                self.retry.max_attempts
            ))),
            Err(err) => Err(err),
        }
    }

    async fn publish_once(
        &self,
        target: &PublishTarget,
        result: &AggregateResult,
    ) -> Result<(), PublishError> {
        tokio::time::sleep(self.clear_delay).await;
        self.writer.clear(target).await?;

        let mut grid = Vec::with_capacity(result.rows.len() + 1);
        grid.push(result.columns.clone());
        grid.extend(result.rows.iter().cloned());
        self.writer.write_rows(target, WRITE_ORIGIN, &grid).await?;

        tokio::time::sleep(self.stamp_delay).await;
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.writer
            .write_cell(target, TIMESTAMP_CELL, &stamp)
            .await?;

        info!(
            worksheet = %target.worksheet,
            rows = result.rows.len(),
            stamp = %stamp,
            "published"
        );
        Ok(())
    }
}
