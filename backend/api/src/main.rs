//! Club management backend — entry point.
//!
//! Serves the payment-tracking REST API over a Google Sheets workbook
//! acting as the database. Table reads go through a TTL cache that is
//! invalidated on every write; identity comes from LINE access tokens
//! resolved against the RegisteredMembers table.

mod api;
mod auth;
mod cache;
mod config;
mod db;
mod errors;
mod sheets;
mod store;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, put};
use axum::Router;
use reqwest::Client;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auth::LineClient;
use cache::{CachedStore, SystemClock, TtlCache};
use config::Config;
use sheets::{SheetsClient, TokenProvider};
use store::SheetsStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    // Load config from environment.
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // HTTP client shared between the Sheets store and the LINE client.
    let http = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    // ─── Row store + read-through cache ───────────────────
    let token = TokenProvider::from_config(config.google_access_token.clone(), &config.metadata_url);
    let sheets = SheetsClient::new(
        http.clone(),
        config.sheets_api_url.clone(),
        config.spreadsheet_id.clone(),
        token,
    );
    let cache = Arc::new(TtlCache::new(
        Duration::from_secs(config.cache_ttl_secs),
        Arc::new(SystemClock),
    ));
    let store = CachedStore::new(Arc::new(SheetsStore::new(sheets)), cache.clone());

    // ─── REST API ─────────────────────────────────────────
    let state = Arc::new(api::ApiState {
        store,
        cache,
        line: LineClient::new(http, config.line_api_url.clone()),
        dev_endpoints: config.dev_endpoints,
    });

    let app = Router::new()
        .route("/health", get(api::health))
        .route("/api/events", get(api::list_events).post(api::create_event))
        .route("/api/events/:event_id", put(api::update_event))
        .route("/api/events/:event_id/payments", get(api::event_payments))
        .route("/api/payments/:tracking_id", put(api::update_payment))
        .route("/api/my/payments", get(api::my_payments))
        .route("/api/members/authorized", get(api::authorized_members))
        .route("/api/management/dashboard", get(api::dashboard))
        .route(
            "/api/cache-status",
            get(api::cache_status).delete(api::clear_cache),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
