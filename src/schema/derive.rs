use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::debug;

use super::{Column, ColumnType, TableSchema};
use crate::fetch::RawTable;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("table `{0}` has no columns")]
    NoColumns(String),
}

/// For each column, look at every row:
///  - An empty cell counts as text, so a column with missing values always
///    lands as text and `""` stays insertable.
///  - On the first cell, remember its type.
///  - On subsequent cells, widen integer/decimal mixes to decimal; any other
///    disagreement stops the scan and marks the column inconsistent.
///  - Inconsistent columns, and columns with no rows at all, default to text.
pub fn derive_schema(table_name: &str, raw: &RawTable) -> Result<TableSchema, SchemaError> {
    if raw.columns.is_empty() {
        return Err(SchemaError::NoColumns(table_name.to_string()));
    }

    let mut columns = Vec::with_capacity(raw.columns.len());

    for (idx, name) in raw.columns.iter().enumerate() {
        let mut seen: Option<ColumnType> = None;

        for row in &raw.rows {
            let cell = row.get(idx).map(|s| s.as_str()).unwrap_or("");
            let ty = classify(cell);

            seen = Some(match seen {
                None => ty,
                Some(prev) if prev == ty => prev,
                Some(prev) => match widen(prev, ty) {
                    Some(wider) => wider,
                    None => {
                        debug!(
                            table = table_name,
                            column = %name,
                            "conflicting cell types {:?} vs {:?}, defaulting to text",
                            prev,
                            ty
                        );
                        ColumnType::Text
                    }
                },
            });
            if seen == Some(ColumnType::Text) {
                break;
            }
        }

        let ty = seen.unwrap_or_else(|| {
            debug!(table = table_name, column = %name, "no rows, defaulting to text");
            ColumnType::Text
        });
        columns.push(Column {
            name: name.clone(),
            ty,
        });
    }

    Ok(TableSchema {
        table: table_name.to_string(),
        columns,
    })
}

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Classify a single cell. Empty cells are text by definition.
fn classify(raw: &str) -> ColumnType {
    let v = raw.trim().trim_matches('"');
    if v.is_empty() {
        return ColumnType::Text;
    }
    if v.parse::<i64>().is_ok() {
        return ColumnType::Integer;
    }
    if v.parse::<f64>().is_ok() {
        return ColumnType::Decimal;
    }
    if v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("false") {
        return ColumnType::Boolean;
    }
    if TIMESTAMP_FORMATS
        .iter()
        .any(|f| NaiveDateTime::parse_from_str(v, f).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|f| NaiveDate::parse_from_str(v, f).is_ok())
    {
        return ColumnType::Timestamp;
    }
    ColumnType::Text
}

fn widen(a: ColumnType, b: ColumnType) -> Option<ColumnType> {
    match (a, b) {
        (ColumnType::Integer, ColumnType::Decimal) | (ColumnType::Decimal, ColumnType::Integer) => {
            Some(ColumnType::Decimal)
        }
        _ => None,
    }
}
