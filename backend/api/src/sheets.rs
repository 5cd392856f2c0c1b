//! Google Sheets `values` client — reads, appends, and updates cell ranges.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the API returns a rate-limit or
//!   server error response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Service-account tokens from the metadata server are cached until
//!   shortly before expiry; a static token from the environment is used
//!   as-is for local development.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::errors::{ApiError, Result};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;
const MAX_ATTEMPTS: u32 = 4;

/// Seconds knocked off a token's lifetime before we refresh it.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

// ─────────────────────────────────────────────────────────
// REST response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[allow(dead_code)]
    range: Option<String>,
    values: Option<Vec<Vec<Value>>>,
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

/// Render a cell value as the string the row codec expects.
///
/// The API returns strings for formatted reads, but numbers can slip
/// through with other render options; normalise instead of failing.
fn cell_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

// ─────────────────────────────────────────────────────────
// Token provider
// ─────────────────────────────────────────────────────────

/// Where Sheets API bearer tokens come from.
pub enum TokenProvider {
    /// Fixed token from the environment (local development).
    Static(String),
    /// Short-lived service-account tokens from the GCE metadata server.
    Metadata {
        base_url: String,
        cached: Mutex<Option<(String, Instant)>>,
    },
}

impl TokenProvider {
    pub fn from_config(token: Option<String>, metadata_url: &str) -> Self {
        match token {
            Some(t) => Self::Static(t),
            None => Self::Metadata {
                base_url: metadata_url.to_string(),
                cached: Mutex::new(None),
            },
        }
    }

    async fn token(&self, http: &Client) -> Result<String> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::Metadata { base_url, cached } => {
                let mut guard = cached.lock().await;
                if let Some((token, expires_at)) = guard.as_ref() {
                    if Instant::now() < *expires_at {
                        return Ok(token.clone());
                    }
                }

                let url = format!(
                    "{base_url}/computeMetadata/v1/instance/service-accounts/default/token"
                );
                let response = http
                    .get(&url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(ApiError::Persistence(format!(
                        "metadata server returned {} for token request",
                        response.status()
                    )));
                }
                let token: MetadataToken = response.json().await?;
                let lifetime = token
                    .expires_in
                    .saturating_sub(TOKEN_EXPIRY_MARGIN_SECS)
                    .max(1);
                let expires_at = Instant::now() + Duration::from_secs(lifetime);
                debug!("Refreshed service-account token, valid {lifetime}s");
                *guard = Some((token.access_token.clone(), expires_at));
                Ok(token.access_token)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────

pub struct SheetsClient {
    http: Client,
    base_url: String,
    spreadsheet_id: String,
    token: TokenProvider,
}

impl SheetsClient {
    pub fn new(http: Client, base_url: String, spreadsheet_id: String, token: TokenProvider) -> Self {
        Self {
            http,
            base_url,
            spreadsheet_id,
            token,
        }
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{range}{suffix}",
            self.base_url, self.spreadsheet_id
        )
    }

    /// Fetch all rows of `range`, normalised to strings.
    pub async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(range, "");
        let body = self.send_with_retry(|token| self.http.get(&url).bearer_auth(token)).await?;
        let parsed: ValueRange = serde_json::from_value(body)?;
        let rows = parsed
            .values
            .unwrap_or_default()
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();
        Ok(rows)
    }

    /// Append `rows` after the last data row of `range`.
    pub async fn append_values(&self, range: &str, rows: &[Vec<String>]) -> Result<()> {
        let url = self.values_url(range, ":append?valueInputOption=RAW");
        let payload = json!({ "values": rows });
        self.send_with_retry(|token| self.http.post(&url).bearer_auth(token).json(&payload))
            .await?;
        Ok(())
    }

    /// Overwrite exactly the cells of `range` with `rows`.
    pub async fn update_values(&self, range: &str, rows: &[Vec<String>]) -> Result<()> {
        let url = self.values_url(range, "?valueInputOption=RAW");
        let payload = json!({ "values": rows });
        self.send_with_retry(|token| self.http.put(&url).bearer_auth(token).json(&payload))
            .await?;
        Ok(())
    }

    /// Issue a request, retrying rate-limit and server errors with
    /// exponential back-off. Client errors (bad range, revoked token) are
    /// not retried — they will not get better on their own.
    async fn send_with_retry<F>(&self, build: F) -> Result<Value>
    where
        F: Fn(&str) -> reqwest::RequestBuilder,
    {
        let mut backoff = INITIAL_BACKOFF_SECS;
        let mut attempt = 1;
        loop {
            let token = self.token.token(&self.http).await?;
            let result = build(&token).send().await;

            let retryable = match &result {
                Ok(response) => {
                    let status = response.status();
                    status.as_u16() == 429 || status.is_server_error()
                }
                Err(e) => e.is_timeout() || e.is_connect(),
            };

            match result {
                Ok(response) if response.status().is_success() => {
                    return Ok(response.json().await?);
                }
                Ok(response) if !retryable => {
                    return Err(ApiError::Persistence(format!(
                        "Sheets API returned {} for {}",
                        response.status(),
                        response.url()
                    )));
                }
                Ok(response) if attempt >= MAX_ATTEMPTS => {
                    return Err(ApiError::Persistence(format!(
                        "Sheets API still returning {} after {attempt} attempts",
                        response.status()
                    )));
                }
                Err(e) if !retryable || attempt >= MAX_ATTEMPTS => {
                    return Err(ApiError::Persistence(format!("Sheets API request failed: {e}")));
                }
                _ => {
                    warn!("Sheets API attempt {attempt} failed, retrying in {backoff}s");
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                    attempt += 1;
                }
            }
        }
    }
}
