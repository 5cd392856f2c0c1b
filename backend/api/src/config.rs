//! Application configuration loaded from environment variables.

use crate::errors::{ApiError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Identifier of the Google Sheets workbook acting as the database
    pub spreadsheet_id: String,
    /// Base URL of the Sheets REST API (overridable for tests)
    pub sheets_api_url: String,
    /// Base URL of the LINE platform API (overridable for tests)
    pub line_api_url: String,
    /// Static OAuth access token for the Sheets API; when absent the GCE
    /// metadata server is asked for service-account tokens
    pub google_access_token: Option<String>,
    /// Base URL of the metadata server used for token refresh
    pub metadata_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// How long (in seconds) table reads stay memoized
    pub cache_ttl_secs: u64,
    /// Expose the cache inspection endpoints (development only)
    pub dev_endpoints: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            spreadsheet_id: env_var("GOOGLE_SHEET_ID").map_err(|_| {
                ApiError::Config("GOOGLE_SHEET_ID environment variable is required".to_string())
            })?,
            sheets_api_url: env_var("SHEETS_API_URL")
                .unwrap_or_else(|_| "https://sheets.googleapis.com".to_string()),
            line_api_url: env_var("LINE_API_URL")
                .unwrap_or_else(|_| "https://api.line.me".to_string()),
            google_access_token: env_var("GOOGLE_ACCESS_TOKEN").ok(),
            metadata_url: env_var("METADATA_SERVER_URL")
                .unwrap_or_else(|_| "http://metadata.google.internal".to_string()),
            api_port: env_var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid API_PORT".to_string()))?,
            cache_ttl_secs: env_var("CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid CACHE_TTL_SECS".to_string()))?,
            dev_endpoints: env_var("DEV_ENDPOINTS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| ApiError::Config(format!("Missing env var: {key}")))
}
