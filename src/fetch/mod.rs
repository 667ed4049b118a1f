//! Source loading: fetch a raw tabular payload and normalize it into the
//! shape the rest of the pipeline expects.

pub mod csv_export;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub use csv_export::CsvExportFetcher;

/// One raw dataset: a header row plus untyped string cells. Missing cells are
/// the empty string, never a null marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("source `{source_id}` unavailable: {reason}")]
    Unavailable { source_id: String, reason: String },
    #[error("source `{source_id}` returned an empty payload")]
    Empty { source_id: String },
    #[error("source `{source_id}` payload malformed: {reason}")]
    Malformed { source_id: String, reason: String },
}

/// Capability to fetch one raw tabular payload by source id. The transport
/// behind it is an external collaborator.
#[async_trait]
pub trait SourceFetch: Send + Sync {
    async fn fetch(&self, source_id: &str) -> Result<RawTable, FetchError>;
}

/// Canonical name of the leading time column. The first source column is
/// assumed to be the transaction date regardless of its header.
pub const ISSUED_ON: &str = "Issued_On";

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \-]+").expect("valid regex"));
static NON_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("valid regex"));

/// Clean a raw column label into an identifier: trim, collapse runs of spaces
/// and hyphens to a single underscore, strip everything else outside
/// `[A-Za-z0-9_]`.
pub fn normalize_column_name(raw: &str) -> String {
    let underscored = SEPARATORS.replace_all(raw.trim(), "_");
    NON_IDENT.replace_all(&underscored, "").into_owned()
}

/// Fetch `source_id` and normalize the result: cleaned unique column names,
/// first column renamed to [`ISSUED_ON`], every row padded to the header
/// width with empty strings.
pub async fn load_dataset(
    fetcher: &dyn SourceFetch,
    source_id: &str,
    dataset: &str,
) -> Result<RawTable, FetchError> {
    let mut table = fetcher.fetch(source_id).await?;

    if table.columns.is_empty() {
        return Err(FetchError::Empty {
            source_id: dataset.to_string(),
        });
    }

    table.columns = normalize_columns(&table.columns);
    if table.columns[0] != ISSUED_ON {
        table.columns[0] = ISSUED_ON.to_string();
    }

    let width = table.columns.len();
    for row in &mut table.rows {
        row.resize(width, String::new());
    }

    Ok(table)
}

/// Normalize every label, keeping names unique. A label that cleans to
/// nothing gets a positional name; collisions get a numeric suffix.
fn normalize_columns(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for (idx, label) in raw.iter().enumerate() {
        let mut name = normalize_column_name(label);
        if name.is_empty() {
            name = format!("Column_{}", idx);
        }
        if out.contains(&name) {
            let mut n = 2;
            while out.contains(&format!("{}_{}", name, n)) {
                n += 1;
            }
            name = format!("{}_{}", name, n);
        }
        out.push(name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedFetcher(RawTable);

    #[async_trait]
    impl SourceFetch for FixedFetcher {
        async fn fetch(&self, _source_id: &str) -> Result<RawTable, FetchError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn normalization_strips_and_collapses() {
        assert_eq!(normalize_column_name("  Issue Qty  "), "Issue_Qty");
        assert_eq!(normalize_column_name("unit-price"), "unit_price");
        assert_eq!(normalize_column_name("Qty (pcs)"), "Qty_pcs");
        assert_eq!(normalize_column_name("a - b"), "a_b");
        assert_eq!(normalize_column_name("Code#1!"), "Code1");
    }

    #[test]
    fn normalized_names_are_identifiers() {
        let re = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
        for raw in ["Issue Qty.", "rate %", "a--b  c", "x(y)z", "total $ value"] {
            let name = normalize_column_name(raw);
            assert!(re.is_match(&name), "{:?} -> {:?}", raw, name);
        }
    }

    #[tokio::test]
    async fn first_column_becomes_issued_on() {
        let fetcher = FixedFetcher(RawTable {
            columns: vec!["Txn Date".into(), "Company".into()],
            rows: vec![vec!["2025-08-01".into(), "Acme".into()]],
        });
        let table = load_dataset(&fetcher, "id", "recv").await.unwrap();
        assert_eq!(table.columns, vec!["Issued_On", "Company"]);
    }

    #[tokio::test]
    async fn short_rows_are_padded_with_empty_strings() {
        let fetcher = FixedFetcher(RawTable {
            columns: vec!["Issued_On".into(), "Company".into(), "Qty".into()],
            rows: vec![vec!["2025-08-01".into()]],
        });
        let table = load_dataset(&fetcher, "id", "recv").await.unwrap();
        assert_eq!(table.rows[0], vec!["2025-08-01", "", ""]);
    }

    #[tokio::test]
    async fn duplicate_and_blank_headers_stay_unique() {
        let fetcher = FixedFetcher(RawTable {
            columns: vec!["Date".into(), "Qty".into(), "Qty".into(), "%%".into()],
            rows: vec![],
        });
        let table = load_dataset(&fetcher, "id", "recv").await.unwrap();
        assert_eq!(table.columns, vec!["Issued_On", "Qty", "Qty_2", "Column_3"]);
    }

    #[tokio::test]
    async fn headerless_payload_is_empty() {
        let fetcher = FixedFetcher(RawTable {
            columns: vec![],
            rows: vec![],
        });
        let err = load_dataset(&fetcher, "id", "recv").await.unwrap_err();
        assert!(matches!(err, FetchError::Empty { .. }));
    }
}
