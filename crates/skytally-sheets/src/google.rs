//! Google Sheets REST backend
//!
//! Direct Sheets API v4 implementation with Bearer token authentication.

use crate::backend::{RowFormat, SheetsBackend, TabInfo, marker_color};
use crate::error::{PublishError, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value as Json, json};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
const SHEET_URL_BASE: &str = "https://docs.google.com/spreadsheets/d";
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Browser URL of a spreadsheet document.
pub fn spreadsheet_url(spreadsheet_id: &str) -> String {
    format!("{}/{}", SHEET_URL_BASE, spreadsheet_id)
}

/// Quote a tab title for A1 notation: `'title'` with inner quotes doubled.
pub fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Configuration for the Sheets backend
#[derive(Debug, Clone)]
pub struct GoogleSheetsConfig {
    pub spreadsheet_id: String,
    pub access_token: String,
    pub api_base: String,
}

impl GoogleSheetsConfig {
    pub fn new(spreadsheet_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            access_token: access_token.into(),
            api_base: SHEETS_API_BASE.to_string(),
        }
    }

    /// Read the OAuth access token from `GOOGLE_OAUTH_ACCESS_TOKEN`
    /// (e.g. `gcloud auth print-access-token`).
    pub fn from_env(spreadsheet_id: impl Into<String>) -> Result<Self> {
        let token = std::env::var(ACCESS_TOKEN_ENV)
            .map_err(|_| PublishError::MissingEnvVar(ACCESS_TOKEN_ENV.to_string()))?;
        Ok(Self::new(spreadsheet_id, token))
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

/// Google Sheets backend
pub struct GoogleSheetsBackend {
    client: reqwest::Client,
    config: GoogleSheetsConfig,
    base: Url,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

impl From<SheetProperties> for TabInfo {
    fn from(p: SheetProperties) -> Self {
        TabInfo {
            sheet_id: p.sheet_id,
            title: p.title,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateReply {
    add_sheet: Option<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<BatchUpdateReply>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl GoogleSheetsBackend {
    pub fn new(config: GoogleSheetsConfig) -> Result<Self> {
        let base = Url::parse(&config.api_base)
            .map_err(|e| PublishError::InvalidConfig(format!("{}: {}", config.api_base, e)))?;
        if base.cannot_be_a_base() {
            return Err(PublishError::InvalidConfig(format!(
                "{} cannot be used as an API base",
                config.api_base
            )));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            config,
            base,
        })
    }

    fn endpoint(&self, tail: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| PublishError::InvalidConfig(self.config.api_base.clone()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets"])
            .extend(tail);
        Ok(url)
    }

    fn values_endpoint(&self, range: &str) -> Result<Url> {
        self.endpoint(&[self.config.spreadsheet_id.as_str(), "values", range])
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<reqwest::Response> {
        let response = request
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(self.classify(status.as_u16(), &body, context))
    }

    fn classify(&self, status: u16, body: &str, context: &str) -> PublishError {
        let detail = serde_json::from_str::<ApiErrorResponse>(body)
            .ok()
            .map(|r| r.error);
        let message = detail
            .as_ref()
            .map(|d| d.message.clone())
            .unwrap_or_else(|| body.trim().to_string());
        let exhausted = detail
            .as_ref()
            .is_some_and(|d| d.status == "RESOURCE_EXHAUSTED");

        match status {
            429 => PublishError::QuotaExhausted(message),
            _ if exhausted => PublishError::QuotaExhausted(message),
            401 | 403 => PublishError::PermissionDenied {
                spreadsheet_id: self.config.spreadsheet_id.clone(),
                message,
            },
            404 => PublishError::NotFound(format!("{}: {}", context, message)),
            _ => PublishError::Api { status, message },
        }
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| PublishError::MalformedResponse(e.to_string()))
    }

    async fn batch_update(&self, requests: Vec<Json>) -> Result<BatchUpdateResponse> {
        let path = format!("{}:batchUpdate", self.config.spreadsheet_id);
        let url = self.endpoint(&[path.as_str()])?;
        let response = self
            .send(
                self.client.post(url).json(&json!({ "requests": requests })),
                "spreadsheet",
            )
            .await?;
        Self::parse(response).await
    }
}

fn format_request(sheet_id: i64, format: &RowFormat) -> Json {
    let mut range = json!({ "sheetId": sheet_id, "startRowIndex": format.start_row });
    if let Some(end) = format.end_row {
        range["endRowIndex"] = json!(end);
    }
    // An empty format with the field mask set clears the background.
    let cell_format = match marker_color(format.marker) {
        Some(color) => json!({ "backgroundColor": color }),
        None => json!({}),
    };
    json!({
        "repeatCell": {
            "range": range,
            "cell": { "userEnteredFormat": cell_format },
            "fields": "userEnteredFormat.backgroundColor",
        }
    })
}

/// Clear cell values from `from_row` down. The range is open-ended, so the
/// API clamps it to the tab's grid whatever its size.
fn clear_request(sheet_id: i64, from_row: usize) -> Json {
    json!({
        "updateCells": {
            "range": { "sheetId": sheet_id, "startRowIndex": from_row },
            "fields": "userEnteredValue",
        }
    })
}

#[async_trait]
impl SheetsBackend for GoogleSheetsBackend {
    fn name(&self) -> &str {
        "google-sheets"
    }

    fn spreadsheet_id(&self) -> &str {
        &self.config.spreadsheet_id
    }

    async fn list_tabs(&self) -> Result<Vec<TabInfo>> {
        let url = self.endpoint(&[self.config.spreadsheet_id.as_str()])?;
        let request = self
            .client
            .get(url)
            .query(&[("fields", "sheets.properties(sheetId,title)")]);
        let response = self.send(request, "spreadsheet").await?;
        let spreadsheet: SpreadsheetResponse = Self::parse(response).await?;

        Ok(spreadsheet
            .sheets
            .into_iter()
            .map(|s| s.properties.into())
            .collect())
    }

    async fn add_tab(&self, title: &str) -> Result<TabInfo> {
        let reply = self
            .batch_update(vec![json!({ "addSheet": { "properties": { "title": title } } })])
            .await?;

        let tab: TabInfo = reply
            .replies
            .into_iter()
            .find_map(|r| r.add_sheet)
            .map(|s| s.properties.into())
            .ok_or_else(|| PublishError::MalformedResponse("addSheet reply missing".to_string()))?;

        tracing::debug!(tab = %tab.title, sheet_id = tab.sheet_id, "tab created");
        Ok(tab)
    }

    async fn clear_tab(&self, tab: &TabInfo, from_row: usize) -> Result<()> {
        self.batch_update(vec![clear_request(tab.sheet_id, from_row)])
            .await?;
        tracing::debug!(tab = %tab.title, from_row, "tab cleared");
        Ok(())
    }

    async fn write_rows(
        &self,
        tab: &TabInfo,
        start_row: usize,
        rows: &[Vec<String>],
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let range = format!("{}!A{}", quote_title(&tab.title), start_row + 1);
        let url = self.values_endpoint(&range)?;
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": rows,
        });
        let request = self
            .client
            .put(url)
            .query(&[("valueInputOption", "RAW")])
            .json(&body);
        self.send(request, &tab.title).await?;

        tracing::debug!(tab = %tab.title, start_row, rows = rows.len(), "rows written");
        Ok(())
    }

    async fn read_rows(&self, tab: &TabInfo) -> Result<Vec<Vec<String>>> {
        let url = self.values_endpoint(&quote_title(&tab.title))?;
        let response = self.send(self.client.get(url), &tab.title).await?;
        let range: ValueRange = Self::parse(response).await?;
        Ok(range.values)
    }

    async fn format_rows(&self, tab: &TabInfo, formats: &[RowFormat]) -> Result<()> {
        if formats.is_empty() {
            return Ok(());
        }
        let requests = formats
            .iter()
            .map(|f| format_request(tab.sheet_id, f))
            .collect();
        self.batch_update(requests).await?;
        Ok(())
    }
}
