//! Google Sheets API v4 client.
//!
//! Only the four calls the analyzer needs are implemented: reading a value
//! range, listing sheet titles, adding a sheet, and overwriting values.

use crate::error::{SurveyError, SurveyResult};
use crate::models::RawTable;
use crate::sheets::range::{a1_origin, a1_range};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Connection settings for the Sheets API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    /// OAuth bearer token with the spreadsheets scope.
    pub token: String,
    pub timeout_seconds: u64,
    /// Rows requested when probing a sheet for its extent.
    pub max_rows: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "https://sheets.googleapis.com".to_string(),
            token: String::new(),
            timeout_seconds: 30,
            max_rows: 1000,
        }
    }
}

/// `ValueRange` resource.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

/// Id and title of one sheet (tab).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default)]
    pub sheet_id: i64,
    pub title: String,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<Reply>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reply {
    add_sheet: Option<SheetEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: Vec<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValuesResponse {
    #[serde(default)]
    updated_range: String,
    #[serde(default)]
    updated_rows: usize,
}

/// What a save did to the destination spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub sheet_id: i64,
    /// True when the sheet had to be added.
    pub created: bool,
    pub updated_range: String,
    pub updated_rows: usize,
}

/// The sheet whose title equals `title` exactly. No trimming or prefix matching.
fn find_sheet<'a>(sheets: &'a [SheetProperties], title: &str) -> Option<&'a SheetProperties> {
    sheets.iter().find(|s| s.title == title)
}

/// Thin client over the Sheets REST API.
pub struct SheetsClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl SheetsClient {
    pub fn new(config: ClientConfig) -> SurveyResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SurveyError::UpstreamUnavailable {
                detail: format!("cannot create HTTP client: {}", e),
            })?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Find the populated extent of `sheet`: `A1:<last column><last row>`.
    pub async fn data_range(&self, spreadsheet_id: &str, sheet: &str, width: usize) -> SurveyResult<String> {
        let scan = a1_range(sheet, width, self.config.max_rows);
        let values = self.get_values(spreadsheet_id, &scan).await?;

        if values.is_empty() {
            return Err(SurveyError::SourceEmpty {
                target: format!("{}/{}", spreadsheet_id, sheet),
            });
        }

        Ok(a1_range(sheet, width, values.len()))
    }

    /// Read the responses of `sheet` as a header plus data rows.
    pub async fn load_table(&self, spreadsheet_id: &str, sheet: &str, width: usize) -> SurveyResult<RawTable> {
        let range = self.data_range(spreadsheet_id, sheet, width).await?;
        info!("Reading {} from {}", range, spreadsheet_id);

        let values = self.get_values(spreadsheet_id, &range).await?;
        match RawTable::from_values(values) {
            Some(table) if !table.is_empty() => Ok(table),
            _ => Err(SurveyError::SourceEmpty {
                target: format!("{}/{}", spreadsheet_id, sheet),
            }),
        }
    }

    /// Titles and ids of every sheet in a spreadsheet.
    pub async fn sheets(&self, spreadsheet_id: &str) -> SurveyResult<Vec<SheetProperties>> {
        let url = self.url(&[spreadsheet_id])?;
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.config.token)
            .query(&[("fields", "sheets.properties(sheetId,title)")])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let meta: SpreadsheetMeta = Self::checked(response, spreadsheet_id)
            .await?
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;

        Ok(meta.sheets.into_iter().map(|s| s.properties).collect())
    }

    /// Copy `table` into `sheet` of the destination, creating the sheet when
    /// no sheet has exactly that title, then overwriting from `A1`.
    pub async fn save_table(&self, spreadsheet_id: &str, sheet: &str, table: &RawTable) -> SurveyResult<SaveOutcome> {
        let sheets = self.sheets(spreadsheet_id).await?;

        let (sheet_id, created) = match find_sheet(&sheets, sheet) {
            Some(props) => {
                debug!("Reusing sheet {} ({})", props.title, props.sheet_id);
                (props.sheet_id, false)
            }
            None => {
                info!("Adding sheet {} to {}", sheet, spreadsheet_id);
                (self.add_sheet(spreadsheet_id, sheet).await?, true)
            }
        };

        let update = self
            .update_values(spreadsheet_id, &a1_origin(sheet), table.to_values())
            .await?;

        Ok(SaveOutcome {
            sheet_id,
            created,
            updated_range: update.updated_range,
            updated_rows: update.updated_rows,
        })
    }

    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> SurveyResult<Vec<Vec<String>>> {
        let url = self.url(&[spreadsheet_id, "values", range])?;
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let body: ValueRange = Self::checked(response, range)
            .await?
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> SurveyResult<i64> {
        let url = self.url(&[&format!("{}:batchUpdate", spreadsheet_id)])?;
        let body = json!({
            "requests": [
                { "addSheet": { "properties": { "title": title } } }
            ]
        });

        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let reply: BatchUpdateResponse = Self::checked(response, spreadsheet_id)
            .await?
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;

        reply
            .replies
            .into_iter()
            .find_map(|r| r.add_sheet)
            .map(|s| s.properties.sheet_id)
            .ok_or_else(|| SurveyError::UpstreamUnavailable {
                detail: format!("addSheet for {} returned no sheet", title),
            })
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> SurveyResult<UpdateValuesResponse> {
        let url = self.url(&[spreadsheet_id, "values", range])?;
        let body = ValueRangeBody {
            range,
            major_dimension: "ROWS",
            values,
        };

        let response = self
            .http_client
            .put(url)
            .bearer_auth(&self.config.token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Self::checked(response, range)
            .await?
            .json()
            .await
            .map_err(|e| self.transport_error(e))
    }

    /// `<api_base>/v4/spreadsheets/<segments...>` with each segment escaped.
    fn url(&self, segments: &[&str]) -> SurveyResult<Url> {
        let invalid = || SurveyError::UpstreamUnavailable {
            detail: format!("invalid API base URL {}", self.config.api_base),
        };

        let mut url = Url::parse(&self.config.api_base).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["v4", "spreadsheets"])
            .extend(segments);
        Ok(url)
    }

    fn transport_error(&self, e: reqwest::Error) -> SurveyError {
        let detail = if e.is_timeout() {
            format!("request timed out after {}s", self.config.timeout_seconds)
        } else if e.is_connect() {
            format!("cannot connect to {}", self.config.api_base)
        } else if e.is_decode() {
            format!("unexpected response: {}", e)
        } else {
            e.to_string()
        };
        SurveyError::UpstreamUnavailable { detail }
    }

    /// Map an HTTP error status onto the error taxonomy.
    async fn checked(response: reqwest::Response, target: &str) -> SurveyResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!("Sheets API returned {}: {}", status, body);
        Err(status_error(status, target, &body))
    }
}

fn status_error(status: StatusCode, target: &str, body: &str) -> SurveyError {
    let target = target.to_string();
    match status {
        StatusCode::NOT_FOUND => SurveyError::SourceNotFound { target },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SurveyError::AccessDenied { target },
        StatusCode::BAD_REQUEST => SurveyError::MalformedRange {
            range: target,
            detail: api_message(body).unwrap_or_else(|| "bad request".to_string()),
        },
        _ => SurveyError::UpstreamUnavailable {
            detail: format!(
                "HTTP {}: {}",
                status,
                api_message(body).unwrap_or_default()
            ),
        },
    }
}

/// `error.message` of a Google API error body.
fn api_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json["error"]["message"].as_str().map(String::from)
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_base: &str) -> SheetsClient {
        SheetsClient::new(ClientConfig {
            api_base: api_base.to_string(),
            token: "test-token".to_string(),
            timeout_seconds: 2,
            max_rows: 1000,
        })
        .unwrap()
    }

    fn props(sheet_id: i64, title: &str) -> SheetProperties {
        SheetProperties {
            sheet_id,
            title: title.to_string(),
        }
    }

    #[test]
    fn test_find_sheet_requires_exact_title() {
        let sheets = vec![
            props(1, "대구중 "),
            props(2, "대구중학교"),
            props(3, "대구초"),
            props(4, "대구중"),
        ];
        assert_eq!(find_sheet(&sheets, "대구중").map(|s| s.sheet_id), Some(4));

        let near_misses = &sheets[..3];
        assert!(find_sheet(near_misses, "대구중").is_none());
        assert!(find_sheet(&[], "대구중").is_none());
    }

    #[test]
    fn test_url_escapes_range() {
        let client = client("https://sheets.googleapis.com");
        let url = client
            .url(&["abc", "values", "'설문지 응답 시트1'!A1:AC10"])
            .unwrap();

        let path = url.path();
        assert!(path.starts_with("/v4/spreadsheets/abc/values/"));
        assert!(!path.contains(' '));
        assert!(path.ends_with("A1:AC10"));
    }

    #[test]
    fn test_url_with_trailing_slash_base() {
        let client = client("http://localhost:8080/");
        let url = client.url(&["abc:batchUpdate"]).unwrap();
        assert_eq!(url.path(), "/v4/spreadsheets/abc:batchUpdate");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "x", ""),
            SurveyError::SourceNotFound { .. }
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "x", ""),
            SurveyError::AccessDenied { .. }
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "x", ""),
            SurveyError::UpstreamUnavailable { .. }
        ));

        let body = r#"{"error": {"code": 400, "message": "Unable to parse range: x!A1"}}"#;
        match status_error(StatusCode::BAD_REQUEST, "x!A1", body) {
            SurveyError::MalformedRange { detail, .. } => {
                assert_eq!(detail, "Unable to parse range: x!A1")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(json!("그렇다.")), "그렇다.");
        assert_eq!(cell_text(json!(4)), "4");
        assert_eq!(cell_text(Value::Null), "");
    }

    #[test]
    fn test_parse_spreadsheet_meta() {
        let body = r#"{"sheets": [
            {"properties": {"sheetId": 0, "title": "설문지 응답 시트1"}},
            {"properties": {"sheetId": 42, "title": "대구초"}}
        ]}"#;
        let meta: SpreadsheetMeta = serde_json::from_str(body).unwrap();
        assert_eq!(meta.sheets[1].properties.sheet_id, 42);
        assert_eq!(meta.sheets[1].properties.title, "대구초");
    }

    #[test]
    fn test_unreachable_service_is_upstream_error() {
        let client = client("http://127.0.0.1:9");
        let result = tokio_test::block_on(client.load_table("abc", "sheet", 29));
        match result {
            Err(err) => assert!(err.is_retryable(), "unexpected {:?}", err),
            Ok(_) => panic!("expected failure"),
        }
    }
}
