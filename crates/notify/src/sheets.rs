//! Results spreadsheet sink.
//!
//! Each delivery inserts fresh rows directly below the header row, fills
//! them in the 17-column layout and formats the run-time column as a time
//! of day, all in a single `batchUpdate` call.

use crate::error::{NotifyError, Result};
use crate::sink::ResultSink;
use async_trait::async_trait;
use bito_qa_core::case_report::RUN_TIME_COLUMN;
use bito_qa_core::{CaseReport, SheetsConfig};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;

/// Display pattern applied to the run-time column.
pub const RUN_TIME_PATTERN: &str = "h:mm:ss.000";

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// First data row, zero-based; row 0 holds the headers.
const FIRST_DATA_ROW: usize = 1;
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Fields of a service-account key file used for the token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// # Errors
    /// Returns an auth error if the file is unreadable or not a key file.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            NotifyError::auth(format!("cannot read credentials {}: {e}", path.display()))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            NotifyError::auth(format!("invalid credentials {}: {e}", path.display()))
        })
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// How the sink obtains a bearer token.
#[derive(Clone)]
pub enum TokenSource {
    Static(String),
    ServiceAccount(ServiceAccountKey),
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(_) => f.write_str("TokenSource::Static(..)"),
            Self::ServiceAccount(key) => f
                .debug_struct("TokenSource::ServiceAccount")
                .field("client_email", &key.client_email)
                .finish_non_exhaustive(),
        }
    }
}

/// Signs the RS256 assertion exchanged for an access token.
///
/// # Errors
/// Returns an auth error if the private key is not valid PEM.
pub fn sign_assertion(key: &ServiceAccountKey, issued_at: i64) -> Result<String> {
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: SHEETS_SCOPE,
        aud: &key.token_uri,
        iat: issued_at,
        exp: issued_at + ASSERTION_LIFETIME_SECS,
    };
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(jsonwebtoken::encode(
        &Header::new(Algorithm::RS256),
        &claims,
        &encoding_key,
    )?)
}

/// Inserts report rows at the top of one worksheet.
#[derive(Clone)]
pub struct SheetsNotifier {
    api_url: String,
    spreadsheet_id: String,
    worksheet_id: i64,
    token: TokenSource,
    http: reqwest::Client,
}

impl std::fmt::Debug for SheetsNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsNotifier")
            .field("api_url", &self.api_url)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("worksheet_id", &self.worksheet_id)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl SheetsNotifier {
    /// Builds a sink with an explicit token source.
    ///
    /// # Errors
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: &SheetsConfig, token: TokenSource, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            worksheet_id: config.worksheet_id,
            token,
            http,
        })
    }

    /// Builds a sink from configuration, preferring a static token over a key file.
    ///
    /// # Errors
    /// Returns a configuration error if neither credential is set, or an auth
    /// error if the key file cannot be read.
    pub async fn from_config(config: &SheetsConfig, timeout: Duration) -> Result<Self> {
        let token = match (&config.access_token, &config.credentials_path) {
            (Some(token), _) => TokenSource::Static(token.clone()),
            (None, Some(path)) => TokenSource::ServiceAccount(ServiceAccountKey::from_file(path).await?),
            (None, None) => {
                return Err(NotifyError::configuration(
                    "sheets needs either access_token or credentials_path",
                ))
            }
        };
        Self::new(config, token, timeout)
    }

    async fn access_token(&self) -> Result<String> {
        match &self.token {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::ServiceAccount(key) => {
                let assertion = sign_assertion(key, Utc::now().timestamp())?;
                let response = self
                    .http
                    .post(&key.token_uri)
                    .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(NotifyError::auth(format!(
                        "token exchange failed with HTTP {}: {body}",
                        status.as_u16()
                    )));
                }

                let token: TokenResponse = response.json().await?;
                Ok(token.access_token)
            }
        }
    }

    /// Inserts `reports` as new rows below the header, newest first.
    ///
    /// # Errors
    /// Returns an auth, network or HTTP error; nothing is retried.
    pub async fn insert_reports(&self, reports: &[CaseReport]) -> Result<()> {
        if reports.is_empty() {
            return Ok(());
        }

        let token = self.access_token().await?;
        let url = format!(
            "{}/spreadsheets/{}:batchUpdate",
            self.api_url, self.spreadsheet_id
        );
        let body = batch_update_body(self.worksheet_id, reports);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NotifyError::http("sheets", status.as_u16(), text));
        }

        tracing::info!(
            spreadsheet = %self.spreadsheet_id,
            rows = reports.len(),
            "Spreadsheet updated"
        );
        Ok(())
    }
}

#[async_trait]
impl ResultSink for SheetsNotifier {
    fn name(&self) -> &'static str {
        "sheets"
    }

    async fn deliver(&self, reports: &[CaseReport]) -> Result<()> {
        self.insert_reports(reports).await
    }
}

/// The three requests of one delivery: insert rows, fill them, format run time.
#[must_use]
pub fn batch_update_body(worksheet_id: i64, reports: &[CaseReport]) -> Value {
    let end_row = FIRST_DATA_ROW + reports.len();
    let rows: Vec<Value> = reports
        .iter()
        .map(|report| {
            let values: Vec<Value> = report.sheet_row().iter().map(cell_data).collect();
            json!({ "values": values })
        })
        .collect();

    json!({
        "requests": [
            {
                "insertDimension": {
                    "range": {
                        "sheetId": worksheet_id,
                        "dimension": "ROWS",
                        "startIndex": FIRST_DATA_ROW,
                        "endIndex": end_row
                    },
                    "inheritFromBefore": false
                }
            },
            {
                "updateCells": {
                    "start": {
                        "sheetId": worksheet_id,
                        "rowIndex": FIRST_DATA_ROW,
                        "columnIndex": 0
                    },
                    "rows": rows,
                    "fields": "userEnteredValue"
                }
            },
            {
                "repeatCell": {
                    "range": {
                        "sheetId": worksheet_id,
                        "startRowIndex": FIRST_DATA_ROW,
                        "endRowIndex": end_row,
                        "startColumnIndex": RUN_TIME_COLUMN,
                        "endColumnIndex": RUN_TIME_COLUMN + 1
                    },
                    "cell": {
                        "userEnteredFormat": {
                            "numberFormat": { "type": "TIME", "pattern": RUN_TIME_PATTERN }
                        }
                    },
                    "fields": "userEnteredFormat.numberFormat"
                }
            }
        ]
    })
}

fn cell_data(value: &Value) -> Value {
    match value {
        Value::Number(n) => json!({ "userEnteredValue": { "numberValue": n } }),
        Value::Bool(b) => json!({ "userEnteredValue": { "boolValue": b } }),
        Value::String(s) => json!({ "userEnteredValue": { "stringValue": s } }),
        other => json!({ "userEnteredValue": { "stringValue": other.to_string() } }),
    }
}
