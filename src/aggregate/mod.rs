//! Grouped monthly summaries over the loaded working tables.

use chrono::{Datelike, NaiveDateTime};

use crate::sink::{sql, RelationalSink, SinkError};

const WINDOW_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reporting time range. Passed explicitly so tests can pin a fixed window
/// instead of depending on the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ReportWindow {
    /// Calendar-month-to-date ending at `now`.
    pub fn month_to_date(now: NaiveDateTime) -> Self {
        let start = now
            .date()
            .with_day(1)
            .expect("day 1 exists in every month")
            .and_hms_opt(0, 0, 0)
            .expect("midnight exists");
        Self { start, end: now }
    }

    pub fn start_str(&self) -> String {
        self.start.format(WINDOW_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(WINDOW_FORMAT).to_string()
    }
}

/// One published metric: which working table it reads, which quantity/value
/// columns it sums, and which worksheet receives the result.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    pub table: &'static str,
    pub qty_column: &'static str,
    pub value_column: &'static str,
    pub worksheet: &'static str,
}

/// The two published summaries. Adjustments are loaded for ad-hoc queries but
/// have no published metric.
pub const METRICS: &[MetricSpec] = &[
    MetricSpec {
        table: "issues",
        qty_column: "IssueQty",
        value_column: "IssueValue",
        worksheet: "DF_ISSUE",
    },
    MetricSpec {
        table: "recv",
        qty_column: "ReceiveQty",
        value_column: "ReceiveValue",
        worksheet: "DF_RECV",
    },
];

/// Aggregate output as a text grid: a header row plus one row per group key,
/// ordered by Issued_On descending then Company descending. Empty is a valid
/// result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl AggregateResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Run the grouped SUM query for one metric over the reporting window.
pub async fn run_metric(
    sink: &dyn RelationalSink,
    db: &str,
    metric: &MetricSpec,
    window: ReportWindow,
) -> Result<AggregateResult, SinkError> {
    let query = sql::grouped_summary(
        db,
        metric.table,
        metric.qty_column,
        metric.value_column,
        &window.start_str(),
        &window.end_str(),
    );
    let rows = sink.query(&query).await?;

    Ok(AggregateResult {
        columns: vec![
            "Company".into(),
            "Product".into(),
            "Code".into(),
            "Issued_On".into(),
            format!("Total_{}", metric.qty_column),
            format!("Total_{}", metric.value_column),
        ],
        rows,
    })
}
