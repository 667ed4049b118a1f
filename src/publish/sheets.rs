//! Sheets values-REST implementation of the destination write capability.
//!
//! Only the value surface is implemented here; credential acquisition is an
//! external concern and the access token arrives through configuration.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::debug;
use url::Url;

use super::{PublishError, PublishTarget, SheetWriter};

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

pub struct SheetsClient {
    client: Client,
    token: String,
}

impl SheetsClient {
    pub fn new(client: Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }

    fn values_url(&self, target: &PublishTarget, range: &str, op: &str) -> Result<Url, PublishError> {
        // Url::parse percent-encodes worksheet names containing spaces.
        let raw = format!(
            "{}/{}/values/{}!{}{}",
            API_BASE, target.spreadsheet_id, target.worksheet, range, op
        );
        Url::parse(&raw).map_err(|e| PublishError::Fatal(format!("bad range url: {e}")))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(), PublishError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            // Transport-level failures are worth a retry.
            .map_err(|e| PublishError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        if is_transient_status(status) {
            Err(PublishError::Transient(format!("{status}: {body}")))
        } else {
            Err(PublishError::Fatal(format!("{status}: {body}")))
        }
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl SheetWriter for SheetsClient {
    async fn clear(&self, target: &PublishTarget) -> Result<(), PublishError> {
        // Clearing the worksheet-wide range wipes the full addressable region.
        let raw = format!(
            "{}/{}/values/{}:clear",
            API_BASE, target.spreadsheet_id, target.worksheet
        );
        let url =
            Url::parse(&raw).map_err(|e| PublishError::Fatal(format!("bad clear url: {e}")))?;
        debug!(worksheet = %target.worksheet, "clearing worksheet");
        self.send(self.client.post(url)).await
    }

    async fn write_rows(
        &self,
        target: &PublishTarget,
        origin: &str,
        rows: &[Vec<String>],
    ) -> Result<(), PublishError> {
        let url = self.values_url(target, origin, "?valueInputOption=USER_ENTERED")?;
        debug!(worksheet = %target.worksheet, rows = rows.len(), "writing rows");
        self.send(self.client.put(url).json(&json!({ "values": rows })))
            .await
    }

    async fn write_cell(
        &self,
        target: &PublishTarget,
        cell: &str,
        value: &str,
    ) -> Result<(), PublishError> {
        let url = self.values_url(target, cell, "?valueInputOption=USER_ENTERED")?;
        self.send(self.client.put(url).json(&json!({ "values": [[value]] })))
            .await
    }
}
