//! Axum REST API handlers.
//!
//! Handlers are thin: resolve the caller, gate through the access policy,
//! read snapshots via the cached store, compute through the ledger and
//! aggregator, write back, return the full entity. All domain decisions
//! live in `club-ledger`; all HTTP translation lives in `errors`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use club_ledger::events::{self, EventChanges, EventDraft};
use club_ledger::ledger::{self, Collector, Participant, PaymentUpdate};
use club_ledger::policy::{self, CurrentUser, ADMIN_ONLY, ALL_ROLES, COLLECTORS};
use club_ledger::{
    AuthorizedMember, Event, EventStatus, EventType, LedgerError, PaymentMethod, PaymentRecord,
    PaymentSummary, Role,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{self, LineClient};
use crate::cache::{CacheEntryInfo, CachedStore, TtlCache};
use crate::db;
use crate::errors::{ApiError, Result};

pub struct ApiState {
    pub store: CachedStore,
    pub cache: Arc<TtlCache>,
    pub line: LineClient,
    pub dev_endpoints: bool,
}

/// Resolve the caller and require one of `allowed`.
async fn require_role(
    state: &ApiState,
    headers: &HeaderMap,
    allowed: &[Role],
) -> Result<CurrentUser> {
    let user = auth::resolve_user(&state.line, &state.store, headers).await?;
    let user = policy::require_role(user.as_ref(), allowed)?;
    Ok(user.clone())
}

// ─────────────────────────────────────────────────────────
// Request shapes
// ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct EventsQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub event_name: String,
    pub event_date: NaiveDate,
    pub event_type: EventType,
    pub required_amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub participant_line_user_ids: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub event_type: Option<EventType>,
    #[serde(default)]
    pub required_amount: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<EventStatus>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub paid_amount: f64,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Optimistic-lock guard: the `updatedDate` the client last saw.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct ClearCacheQuery {
    pub key: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub success: bool,
    pub events: Vec<Event>,
    pub total: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventResponse {
    pub success: bool,
    #[serde(rename = "eventID")]
    pub event_id: String,
    pub message: String,
    pub participants_added: usize,
}

#[derive(Serialize)]
pub struct UpdateEventResponse {
    pub success: bool,
    pub event: Event,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    #[serde(rename = "eventID")]
    pub event_id: String,
    pub event_name: String,
    pub event_date: NaiveDate,
    pub required_amount: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentListResponse {
    pub event_info: EventInfo,
    pub payments: Vec<PaymentRecord>,
    pub summary: PaymentSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentResponse {
    pub success: bool,
    pub message: String,
    pub updated_record: PaymentRecord,
}

#[derive(Serialize)]
pub struct MyPaymentsResponse {
    pub success: bool,
    pub payments: Vec<PaymentRecord>,
}

#[derive(Serialize)]
pub struct MembersResponse {
    pub success: bool,
    pub members: Vec<AuthorizedMember>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_events: usize,
    pub active_events: usize,
    pub total_members: usize,
    pub authorized_members: usize,
    pub pending_registrations: usize,
    pub total_amount: f64,
    pub collection_rate: f64,
}

#[derive(Serialize)]
pub struct CacheStatusResponse {
    pub entries: Vec<CacheEntryInfo>,
}

#[derive(Serialize)]
pub struct ClearCacheResponse {
    pub success: bool,
    pub message: String,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /api/events`
///
/// Admin listing of all events, optionally filtered by status.
pub async fn list_events(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(query): Query<EventsQuery>,
) -> Result<Response> {
    require_role(&state, &headers, ADMIN_ONLY).await?;

    let filter = match query.status.as_deref() {
        None => None,
        Some(s) => Some(EventStatus::parse(s).ok_or_else(|| {
            LedgerError::Validation(format!("unknown event status {s:?}"))
        })?),
    };

    let mut events = db::get_events(&state.store).await?;
    if let Some(status) = filter {
        events.retain(|e| e.status == status);
    }
    let total = events.len();

    Ok(Json(EventsResponse {
        success: true,
        events,
        total,
    })
    .into_response())
}

/// `POST /api/events`
///
/// Creates the event and one unpaid tracking record per participant.
pub async fn create_event(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<CreateEventRequest>,
) -> Result<Response> {
    let user = require_role(&state, &headers, ADMIN_ONLY).await?;
    let now = Utc::now();

    // Resolve display names so tracking rows are readable without joins.
    let members = db::get_registered_members(&state.store).await?;
    let participants: Vec<Participant> = body
        .participant_line_user_ids
        .iter()
        .map(|line_user_id| {
            let display_name = members
                .iter()
                .find(|m| &m.line_user_id == line_user_id)
                .map(|m| m.line_display_name.clone())
                .unwrap_or_default();
            Participant {
                line_user_id: line_user_id.clone(),
                display_name,
            }
        })
        .collect();

    let draft = EventDraft {
        event_name: body.event_name,
        event_date: body.event_date,
        event_type: body.event_type,
        required_amount: body.required_amount,
        description: body.description,
        created_by: user.collector_name().to_string(),
    };
    let (event, records) = events::create_event(draft, &participants, now)?;

    db::insert_event_with_records(&state.store, &event, &records).await?;
    info!(
        "Event {} created with {} participants by {}",
        event.event_id,
        records.len(),
        user.line_user_id
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateEventResponse {
            success: true,
            event_id: event.event_id,
            message: "event created".to_string(),
            participants_added: records.len(),
        }),
    )
        .into_response())
}

/// `PUT /api/events/:event_id`
///
/// Admin edit of event fields; status changes go through the lifecycle
/// state machine. Amount edits do not rewrite existing tracking records.
pub async fn update_event(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
    Json(body): Json<UpdateEventRequest>,
) -> Result<Response> {
    require_role(&state, &headers, ADMIN_ONLY).await?;
    let now = Utc::now();

    let (row_index, event) = db::find_event(&state.store, &event_id)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("event {event_id}")))?;

    let changes = EventChanges {
        event_name: body.event_name,
        event_date: body.event_date,
        event_type: body.event_type,
        required_amount: body.required_amount,
        description: body.description,
        status: body.status,
    };
    let updated = events::apply_changes(&event, &changes, now)?;

    db::write_event(&state.store, row_index, &updated).await?;

    Ok(Json(UpdateEventResponse {
        success: true,
        event: updated,
    })
    .into_response())
}

/// `GET /api/events/:event_id/payments`
///
/// Collector view: every tracking record of the event plus the summary.
pub async fn event_payments(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<Response> {
    require_role(&state, &headers, COLLECTORS).await?;

    let (_, event) = db::find_event(&state.store, &event_id)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("event {event_id}")))?;

    let payments = db::get_payment_tracking(&state.store, Some(&event_id)).await?;
    let summary = ledger::summarize(&payments);

    Ok(Json(PaymentListResponse {
        event_info: EventInfo {
            event_id: event.event_id,
            event_name: event.event_name,
            event_date: event.event_date,
            required_amount: event.required_amount,
        },
        payments,
        summary,
    })
    .into_response())
}

/// `PUT /api/payments/:tracking_id`
///
/// Records a payment, then refreshes the owning event's cached totals.
pub async fn update_payment(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(tracking_id): Path<String>,
    Json(body): Json<UpdatePaymentRequest>,
) -> Result<Response> {
    let user = require_role(&state, &headers, COLLECTORS).await?;
    let now = Utc::now();

    let snapshot = db::get_payment_tracking(&state.store, None).await?;
    let row_index = snapshot
        .iter()
        .position(|r| r.tracking_id == tracking_id)
        .ok_or_else(|| LedgerError::NotFound(format!("payment record {tracking_id}")))?;

    let collector = Collector {
        line_user_id: user.line_user_id.clone(),
        display_name: user.collector_name().to_string(),
    };
    let update = PaymentUpdate {
        paid_amount: body.paid_amount,
        method: body.payment_method,
        payment_date: body.payment_date,
        notes: body.notes,
        expected_last_updated: body.last_updated,
    };
    let updated = ledger::record_payment(&snapshot, &tracking_id, update, &collector, now)?;

    db::write_payment_update(&state.store, row_index, &updated).await?;

    // The event's cached totals are stale now; refresh them from the
    // post-write record set.
    match db::find_event(&state.store, &updated.event_id).await? {
        Some((event_row, event)) => {
            let mut records = snapshot;
            records[row_index] = updated.clone();
            let mut refreshed = events::recompute_totals(&event, &records);
            refreshed.updated_date = now;
            db::write_event_totals(&state.store, event_row, &refreshed).await?;
        }
        None => {
            warn!(
                "Payment {} references missing event {}, totals not refreshed",
                tracking_id, updated.event_id
            );
        }
    }

    Ok(Json(UpdatePaymentResponse {
        success: true,
        message: "payment recorded".to_string(),
        updated_record: updated,
    })
    .into_response())
}

/// `GET /api/my/payments`
///
/// Any registered member's own records, in sheet order.
pub async fn my_payments(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Response> {
    let user = require_role(&state, &headers, ALL_ROLES).await?;

    let payments: Vec<PaymentRecord> = db::get_payment_tracking(&state.store, None)
        .await?
        .into_iter()
        .filter(|p| p.member_line_user_id == user.line_user_id)
        .collect();

    Ok(Json(MyPaymentsResponse {
        success: true,
        payments,
    })
    .into_response())
}

/// `GET /api/members/authorized`
pub async fn authorized_members(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Response> {
    require_role(&state, &headers, ADMIN_ONLY).await?;

    let members = db::get_authorized_members(&state.store).await?;
    Ok(Json(MembersResponse {
        success: true,
        members,
    })
    .into_response())
}

/// `GET /api/management/dashboard`
///
/// Cross-table statistics for the admin landing page.
pub async fn dashboard(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Response> {
    require_role(&state, &headers, ADMIN_ONLY).await?;

    let (events, authorized, registered, pending) = tokio::join!(
        db::get_events(&state.store),
        db::get_authorized_members(&state.store),
        db::get_registered_members(&state.store),
        db::get_pending_registrations(&state.store),
    );
    let (events, authorized, registered, pending) = (events?, authorized?, registered?, pending?);

    let total_amount: f64 = events.iter().map(|e| e.collected_amount).sum();
    let total_required: f64 = events
        .iter()
        .map(|e| e.required_amount * f64::from(e.participant_count))
        .sum();
    let collection_rate = if total_required > 0.0 {
        total_amount / total_required * 100.0
    } else {
        0.0
    };

    Ok(Json(DashboardStats {
        total_events: events.len(),
        active_events: events
            .iter()
            .filter(|e| e.status == EventStatus::Active)
            .count(),
        total_members: registered.len(),
        authorized_members: authorized.len(),
        pending_registrations: pending
            .iter()
            .filter(|p| p.status == club_ledger::RegistrationStatus::Pending)
            .count(),
        total_amount,
        collection_rate,
    })
    .into_response())
}

// ─────────────────────────────────────────────────────────
// Cache inspection (development only)
// ─────────────────────────────────────────────────────────

fn require_dev(state: &ApiState) -> Result<()> {
    if state.dev_endpoints {
        Ok(())
    } else {
        Err(ApiError::Ledger(LedgerError::Authorization(
            "cache inspection is disabled outside development".to_string(),
        )))
    }
}

/// `GET /api/cache-status`
pub async fn cache_status(State(state): State<Arc<ApiState>>) -> Result<Response> {
    require_dev(&state)?;
    Ok(Json(CacheStatusResponse {
        entries: state.cache.entries(),
    })
    .into_response())
}

/// `DELETE /api/cache-status`
pub async fn clear_cache(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ClearCacheQuery>,
) -> Result<Response> {
    require_dev(&state)?;
    let message = match query.key.as_deref() {
        Some(key) => {
            state.cache.invalidate(key);
            format!("cleared cache entries matching {key:?}")
        }
        None => {
            state.cache.clear();
            "cleared all cache entries".to_string()
        }
    };
    Ok(Json(ClearCacheResponse {
        success: true,
        message,
    })
    .into_response())
}
