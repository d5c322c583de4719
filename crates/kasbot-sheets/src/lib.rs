//! # kasbot-sheets
//!
//! Reads the group balance from a Google Sheets cell via the Sheets v4 REST API.
//! Docs: <https://developers.google.com/sheets/api/reference/rest>

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use kasbot_core::{
    amount::{parse_amount, ExternalAmount},
    config::SheetConfig,
    error::KasbotError,
    traits::AmountSource,
};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Spreadsheet metadata, limited to sheet properties.
#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
    #[serde(default)]
    index: i64,
}

/// `values.get` response. `values` is omitted when the range is empty.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Amount source backed by the first sheet of a spreadsheet.
pub struct SheetsSource {
    config: SheetConfig,
    client: reqwest::Client,
}

impl SheetsSource {
    /// Create a new source from config.
    pub fn new(config: SheetConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn spreadsheet_url(&self) -> String {
        format!(
            "{}/spreadsheets/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.spreadsheet_id)
        )
    }

    /// Attach credentials: access token first, then API key.
    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = self.config.access_token.as_deref().filter(|t| !t.is_empty()) {
            req.bearer_auth(token)
        } else if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            req.query(&[("key", key)])
        } else {
            req
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, KasbotError> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| KasbotError::Fetch(format!("sheets request failed: {e}")))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Err(KasbotError::Fetch(format!(
                "sheets authentication failed ({status}): {body}"
            )));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(KasbotError::Fetch(format!(
                "sheets API error {status}: {body}"
            )));
        }

        resp.json()
            .await
            .map_err(|e| KasbotError::Fetch(format!("sheets response parse failed: {e}")))
    }

    /// Title of the first sheet by position.
    async fn first_sheet_title(&self) -> Result<String, KasbotError> {
        let req = self
            .client
            .get(self.spreadsheet_url())
            .query(&[("fields", "sheets.properties(title,index)")]);
        let meta: SpreadsheetMeta = self.get_json(req).await?;

        meta.sheets
            .into_iter()
            .map(|s| s.properties)
            .min_by_key(|p| p.index)
            .map(|p| p.title)
            .ok_or_else(|| KasbotError::Fetch("spreadsheet has no sheets".into()))
    }

    /// Read the configured cell. Returns the resolved A1 range and the raw value.
    async fn fetch_cell(&self) -> Result<(String, Value), KasbotError> {
        let title = self.first_sheet_title().await?;
        let range = a1_range(&title, &self.config.range);
        debug!("sheets: reading {range}");

        let url = format!(
            "{}/values/{}",
            self.spreadsheet_url(),
            urlencoding::encode(&range)
        );
        let req = self
            .client
            .get(url)
            .query(&[("valueRenderOption", "FORMATTED_VALUE")]);
        let values: ValueRange = self.get_json(req).await?;

        let cell = values
            .values
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .ok_or_else(|| KasbotError::Fetch(format!("range {range} is empty")))?;

        Ok((range, cell))
    }
}

/// Turn a cell into an amount. Text goes through the currency parser; numbers
/// are taken as they are, since their JSON form uses `.` as the decimal point.
fn amount_from_cell(range: &str, cell: Value) -> Result<ExternalAmount, KasbotError> {
    match cell {
        Value::String(s) => parse_amount(&s),
        Value::Number(n) => {
            let value = n.as_f64().ok_or_else(|| {
                KasbotError::Fetch(format!("number in {range} out of range: {n}"))
            })?;
            Ok(ExternalAmount {
                value,
                display: n.to_string(),
            })
        }
        other => Err(KasbotError::Fetch(format!(
            "unexpected cell value in {range}: {other}"
        ))),
    }
}

/// Build an A1 range for a cell on a named sheet, quoting the title.
pub fn a1_range(sheet_title: &str, cell: &str) -> String {
    format!("'{}'!{cell}", sheet_title.replace('\'', "''"))
}

#[async_trait]
impl AmountSource for SheetsSource {
    fn name(&self) -> &str {
        "google-sheets"
    }

    async fn fetch_latest_amount(&self) -> Result<ExternalAmount, KasbotError> {
        let (range, cell) = self.fetch_cell().await?;
        amount_from_cell(&range, cell)
    }
}
