//! CSV-export transport: fetches a spreadsheet's CSV export over HTTP and
//! parses it into a [`RawTable`].

use std::io::Cursor;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{FetchError, RawTable, SourceFetch};

/// Fetches the `gviz` CSV export of a Google spreadsheet worksheet.
pub struct CsvExportFetcher {
    client: Client,
    worksheet: String,
}

impl CsvExportFetcher {
    pub fn new(client: Client, worksheet: impl Into<String>) -> Self {
        Self {
            client,
            worksheet: worksheet.into(),
        }
    }

    fn export_url(&self, sheet_id: &str) -> Result<Url, FetchError> {
        let raw = format!(
            "https://docs.google.com/spreadsheets/d/{}/gviz/tq?tqx=out:csv&sheet={}",
            sheet_id, self.worksheet
        );
        Url::parse(&raw).map_err(|e| FetchError::Malformed {
            source_id: sheet_id.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl SourceFetch for CsvExportFetcher {
    async fn fetch(&self, source_id: &str) -> Result<RawTable, FetchError> {
        let url = self.export_url(source_id)?;
        debug!(source = source_id, "fetching csv export");

        let unavailable = |e: reqwest::Error| FetchError::Unavailable {
            source_id: source_id.to_string(),
            reason: e.to_string(),
        };
        let body = self
            .client
            .get(url)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?
            .text()
            .await
            .map_err(unavailable)?;

        parse_csv(source_id, &body)
    }
}

/// Parse CSV text into a [`RawTable`]. The first record is the header row.
pub fn parse_csv(source_id: &str, text: &str) -> Result<RawTable, FetchError> {
    let malformed = |e: csv::Error| FetchError::Malformed {
        source_id: source_id.to_string(),
        reason: e.to_string(),
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(Cursor::new(text.as_bytes()));

    let columns: Vec<String> = rdr
        .headers()
        .map_err(malformed)?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if columns.is_empty() || columns.iter().all(|c| c.trim().is_empty()) {
        return Err(FetchError::Empty {
            source_id: source_id.to_string(),
        });
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(malformed)?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    Ok(RawTable { columns, rows })
}
