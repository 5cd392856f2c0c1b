//! # Payment ledger
//!
//! Single source of truth for deriving and mutating payment-record state.
//!
//! Everything here is a pure function over an in-memory table snapshot: the
//! caller reads the snapshot, the ledger computes the new record, and the
//! caller writes it back. The one mutation rule the ledger enforces
//! unconditionally is that `payment_status` is recomputed from the amounts
//! on every change — it is not even accepted as input.

use chrono::{DateTime, Utc};

use crate::errors::{LedgerError, Result};
use crate::types::{PaymentMethod, PaymentRecord, PaymentStatus, PaymentSummary};

/// The authenticated actor recording a payment. The ledger stamps the
/// collector columns from this, never from request fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collector {
    pub line_user_id: String,
    pub display_name: String,
}

/// A member selected to participate in an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub line_user_id: String,
    pub display_name: String,
}

/// Caller-supplied fields of a payment mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentUpdate {
    pub paid_amount: f64,
    pub method: PaymentMethod,
    /// Defaults to the mutation time when omitted.
    pub payment_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// Optimistic-lock guard: when present, the stored record's
    /// `updated_date` must still match or the write is rejected.
    pub expected_last_updated: Option<DateTime<Utc>>,
}

/// Derive the payment status from the amounts.
///
/// `unpaid` iff nothing was paid, `paid` iff the requirement is met,
/// `partial` otherwise. A zero-cost obligation is trivially satisfied, so
/// `required_amount == 0` is always `paid` — including when `paid_amount`
/// is also 0.
pub fn compute_status(paid_amount: f64, required_amount: f64) -> PaymentStatus {
    if required_amount <= 0.0 {
        PaymentStatus::Paid
    } else if paid_amount <= 0.0 {
        PaymentStatus::Unpaid
    } else if paid_amount >= required_amount {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    }
}

/// Aggregate a record set into totals and per-status counts.
///
/// The empty set yields all-zero totals and a 0 collection rate.
pub fn summarize(records: &[PaymentRecord]) -> PaymentSummary {
    let total_required: f64 = records.iter().map(|r| r.required_amount).sum();
    let total_collected: f64 = records.iter().map(|r| r.paid_amount).sum();

    let mut unpaid_count = 0u32;
    let mut partial_count = 0u32;
    let mut paid_count = 0u32;
    for record in records {
        match record.payment_status {
            PaymentStatus::Unpaid => unpaid_count += 1,
            PaymentStatus::Partial => partial_count += 1,
            PaymentStatus::Paid => paid_count += 1,
        }
    }

    let collection_rate = if total_required > 0.0 {
        total_collected / total_required * 100.0
    } else {
        0.0
    };

    PaymentSummary {
        total_required,
        total_collected,
        unpaid_count,
        partial_count,
        paid_count,
        collection_rate,
    }
}

/// Deterministic tracking id: event + member + creation time.
pub fn tracking_id(event_id: &str, member_line_user_id: &str, at: DateTime<Utc>) -> String {
    format!(
        "track_{event_id}_{member_line_user_id}_{}",
        at.timestamp_millis()
    )
}

/// Apply a payment mutation against a table snapshot.
///
/// Fails with `Validation` on a negative or non-finite amount, `NotFound`
/// when the tracking id is absent from the snapshot, and `Conflict` when
/// the caller's optimistic-lock timestamp no longer matches. Returns the
/// full updated record so callers can render without re-reading storage.
///
/// The owning event's cached totals become stale after this — refreshing
/// them is the aggregator's job, not the ledger's.
pub fn record_payment(
    records: &[PaymentRecord],
    tracking_id: &str,
    update: PaymentUpdate,
    collector: &Collector,
    now: DateTime<Utc>,
) -> Result<PaymentRecord> {
    if !update.paid_amount.is_finite() || update.paid_amount < 0.0 {
        return Err(LedgerError::Validation(format!(
            "paid amount must be a non-negative number, got {}",
            update.paid_amount
        )));
    }

    let current = records
        .iter()
        .find(|r| r.tracking_id == tracking_id)
        .ok_or_else(|| LedgerError::NotFound(format!("payment record {tracking_id}")))?;

    if let Some(expected) = update.expected_last_updated {
        if expected != current.updated_date {
            return Err(LedgerError::Conflict(format!(
                "payment record {tracking_id} was modified at {}, expected {}",
                current.updated_date.to_rfc3339(),
                expected.to_rfc3339()
            )));
        }
    }

    Ok(PaymentRecord {
        paid_amount: update.paid_amount,
        payment_status: compute_status(update.paid_amount, current.required_amount),
        payment_date: Some(update.payment_date.unwrap_or(now)),
        collected_by: Some(collector.line_user_id.clone()),
        collector_name: Some(collector.display_name.clone()),
        payment_method: Some(update.method),
        notes: update.notes,
        updated_date: now,
        ..current.clone()
    })
}

/// Create one unpaid tracking record per participant.
///
/// `required_amount` is snapshot into each record; later event edits do not
/// reach back into these rows. An event without participants cannot track
/// payments, so an empty list is a `Validation` error.
pub fn create_records_for_event(
    event_id: &str,
    required_amount: f64,
    participants: &[Participant],
    now: DateTime<Utc>,
) -> Result<Vec<PaymentRecord>> {
    if participants.is_empty() {
        return Err(LedgerError::Validation(
            "an event needs at least one participant".to_string(),
        ));
    }
    if !required_amount.is_finite() || required_amount < 0.0 {
        return Err(LedgerError::Validation(format!(
            "required amount must be a non-negative number, got {required_amount}"
        )));
    }

    Ok(participants
        .iter()
        .map(|p| PaymentRecord {
            tracking_id: tracking_id(event_id, &p.line_user_id, now),
            event_id: event_id.to_string(),
            member_line_user_id: p.line_user_id.clone(),
            member_display_name: p.display_name.clone(),
            required_amount,
            paid_amount: 0.0,
            payment_status: compute_status(0.0, required_amount),
            payment_date: None,
            collected_by: None,
            collector_name: None,
            payment_method: None,
            notes: None,
            created_date: now,
            updated_date: now,
        })
        .collect())
}
