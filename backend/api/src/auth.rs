//! LINE-backed identity resolution.
//!
//! The session provider is external: clients hold a LINE access token and
//! send it as a bearer header. We verify it against the LINE profile
//! endpoint, then look the LINE user id up in the RegisteredMembers table
//! to attach role and registration state.
//!
//! A missing or rejected token resolves to "no user" so the policy layer
//! answers 401; a verified-but-unregistered identity resolves to an
//! unregistered [`CurrentUser`] and becomes 403 there.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use club_ledger::policy::{CurrentUser, Registration};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::db;
use crate::errors::{ApiError, Result};
use crate::store::RowStore;

/// Profile payload from `GET /v2/profile`.
#[derive(Debug, Clone, Deserialize)]
pub struct LineProfile {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "pictureUrl")]
    pub picture_url: Option<String>,
}

pub struct LineClient {
    http: Client,
    base_url: String,
}

impl LineClient {
    pub fn new(http: Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Verify an access token with LINE. `None` means the token was
    /// rejected (expired or revoked) — the caller should be treated as
    /// unauthenticated, not as an error.
    pub async fn get_profile(&self, access_token: &str) -> Result<Option<LineProfile>> {
        let url = format!("{}/v2/profile", self.base_url);
        let response = self.http.get(&url).bearer_auth(access_token).send().await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.json().await?)),
            status if status.as_u16() == 401 => {
                debug!("LINE rejected an access token");
                Ok(None)
            }
            status => Err(ApiError::Persistence(format!(
                "LINE profile endpoint returned {status}"
            ))),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the request's identity, or `None` when no valid token arrived.
pub async fn resolve_user(
    line: &LineClient,
    store: &dyn RowStore,
    headers: &HeaderMap,
) -> Result<Option<CurrentUser>> {
    let Some(token) = bearer_token(headers) else {
        return Ok(None);
    };
    let Some(profile) = line.get_profile(token).await? else {
        return Ok(None);
    };

    let user = match db::find_registered_member_by_line_id(store, &profile.user_id).await? {
        Some(member) => CurrentUser::registered(
            profile.user_id,
            profile.display_name,
            profile.picture_url,
            &member,
        ),
        None => {
            warn!("Authenticated LINE user {} is not registered", profile.user_id);
            CurrentUser {
                line_user_id: profile.user_id,
                display_name: profile.display_name,
                picture_url: profile.picture_url,
                registration: Registration::Unregistered,
            }
        }
    };
    Ok(Some(user))
}
