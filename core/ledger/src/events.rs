//! # Event aggregator
//!
//! Keeps an event's derived fields consistent with its payment records and
//! guards the lifecycle state machine. Like the ledger, everything here is
//! a pure projection over in-memory state; persistence is the caller's
//! concern.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::errors::{LedgerError, Result};
use crate::ledger::{self, Participant};
use crate::types::{Event, EventStatus, EventType, PaymentRecord};

/// Caller-supplied fields of a new event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub event_name: String,
    pub event_date: NaiveDate,
    pub event_type: EventType,
    pub required_amount: f64,
    pub description: Option<String>,
    pub created_by: String,
}

/// Partial edit of an existing event. `None` fields stay unchanged; a
/// status change goes through [`transition`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub event_type: Option<EventType>,
    pub required_amount: Option<f64>,
    pub description: Option<String>,
    pub status: Option<EventStatus>,
}

/// Unique event id: creation time plus a random suffix.
pub fn event_id(at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("event_{}_{}", at.timestamp_millis(), &suffix[..8])
}

/// Whether `to` is reachable from `from` in the lifecycle state machine.
///
/// Planning -> Active -> Completed, with Cancelled reachable from Planning
/// or Active. Terminal states have no exits; staying put is not a
/// transition.
pub fn can_transition(from: EventStatus, to: EventStatus) -> bool {
    matches!(
        (from, to),
        (EventStatus::Planning, EventStatus::Active)
            | (EventStatus::Planning, EventStatus::Cancelled)
            | (EventStatus::Active, EventStatus::Completed)
            | (EventStatus::Active, EventStatus::Cancelled)
    )
}

/// Move an event to `target`, or fail with `InvalidTransition`.
pub fn transition(event: &Event, target: EventStatus, now: DateTime<Utc>) -> Result<Event> {
    if !can_transition(event.status, target) {
        return Err(LedgerError::InvalidTransition {
            from: event.status,
            to: target,
        });
    }
    Ok(Event {
        status: target,
        updated_date: now,
        ..event.clone()
    })
}

/// Refresh the event's cached totals from its payment records.
///
/// `collected_amount` becomes the sum of `paid_amount` over the records
/// whose `event_id` matches; `collection_progress` is that sum over the
/// planned total (`required_amount * participant_count`), as a percentage,
/// 0 when the planned total is 0. Idempotent — `updated_date` is left
/// alone so re-projection never looks like a write.
pub fn recompute_totals(event: &Event, records: &[PaymentRecord]) -> Event {
    let collected_amount: f64 = records
        .iter()
        .filter(|r| r.event_id == event.event_id)
        .map(|r| r.paid_amount)
        .sum();

    let total_required = event.required_amount * f64::from(event.participant_count);
    let collection_progress = if total_required > 0.0 {
        collected_amount / total_required * 100.0
    } else {
        0.0
    };

    Event {
        collected_amount,
        collection_progress: Some(collection_progress),
        ..event.clone()
    }
}

/// Validate a draft and build the event together with one unpaid tracking
/// record per participant.
///
/// Returns both so the caller can persist them together. Persisting is not
/// atomic in the row store — see the crate docs on partial creation.
pub fn create_event(
    draft: EventDraft,
    participants: &[Participant],
    now: DateTime<Utc>,
) -> Result<(Event, Vec<PaymentRecord>)> {
    if draft.event_name.trim().is_empty() {
        return Err(LedgerError::Validation("event name is required".to_string()));
    }
    if !draft.required_amount.is_finite() || draft.required_amount < 0.0 {
        return Err(LedgerError::Validation(format!(
            "required amount must be a non-negative number, got {}",
            draft.required_amount
        )));
    }

    let id = event_id(now);
    let records = ledger::create_records_for_event(&id, draft.required_amount, participants, now)?;

    let event = Event {
        event_id: id,
        event_name: draft.event_name,
        event_date: draft.event_date,
        event_type: draft.event_type,
        required_amount: draft.required_amount,
        description: draft.description,
        status: EventStatus::Planning,
        created_by: draft.created_by,
        created_date: now,
        updated_date: now,
        participant_count: participants.len() as u32,
        collected_amount: 0.0,
        collection_progress: None,
    };

    Ok((event, records))
}

/// Apply a partial edit, routing any status change through the state
/// machine. A `status` equal to the current one is a no-op rather than an
/// invalid self-transition, so clients may echo the full event back.
///
/// Changing `required_amount` only affects records created afterwards —
/// existing records keep their snapshot.
pub fn apply_changes(event: &Event, changes: &EventChanges, now: DateTime<Utc>) -> Result<Event> {
    let mut updated = event.clone();

    if let Some(name) = &changes.event_name {
        if name.trim().is_empty() {
            return Err(LedgerError::Validation("event name is required".to_string()));
        }
        updated.event_name = name.clone();
    }
    if let Some(date) = changes.event_date {
        updated.event_date = date;
    }
    if let Some(kind) = changes.event_type {
        updated.event_type = kind;
    }
    if let Some(amount) = changes.required_amount {
        if !amount.is_finite() || amount < 0.0 {
            return Err(LedgerError::Validation(format!(
                "required amount must be a non-negative number, got {amount}"
            )));
        }
        updated.required_amount = amount;
    }
    if let Some(description) = &changes.description {
        updated.description = if description.is_empty() {
            None
        } else {
            Some(description.clone())
        };
    }
    if let Some(target) = changes.status {
        if target != updated.status {
            updated = transition(&updated, target, now)?;
        }
    }

    updated.updated_date = now;
    Ok(updated)
}
