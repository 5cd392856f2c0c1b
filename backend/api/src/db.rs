//! Typed table access over the row store.
//!
//! Reads decode through the core row codec; a persistence failure on a
//! read path is downgraded to an empty snapshot (the workbook may simply
//! not exist yet) with a warning. Decode failures and every write failure
//! propagate — silently losing a payment update is not acceptable.

use club_ledger::rows::{
    decode_rows, event_totals_cells, payment_update_cells, ColSpan, RowCodec, Table,
    EVENT_TOTALS_SPAN, PAYMENT_UPDATE_SPAN,
};
use club_ledger::{
    AuthorizedMember, Event, PaymentRecord, PendingRegistration, RegisteredMember,
};
use tracing::warn;

use crate::errors::{ApiError, Result};
use crate::store::RowStore;

/// Full-row span of the Events table, for whole-event rewrites.
const EVENT_ROW_SPAN: ColSpan = ColSpan::new(0, 11);

/// Read and decode a whole table, downgrading I/O failures to empty.
async fn read_table<T: RowCodec>(store: &dyn RowStore) -> Result<Vec<T>> {
    let rows = match store.get_all(T::TABLE).await {
        Ok(rows) => rows,
        Err(e @ (ApiError::Persistence(_) | ApiError::Http(_))) => {
            warn!("Read of {} failed, treating as empty: {e}", T::TABLE.name());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };
    decode_rows(&rows).map_err(ApiError::from)
}

// ─────────────────────────────────────────────────────────
// Reads
// ─────────────────────────────────────────────────────────

pub async fn get_events(store: &dyn RowStore) -> Result<Vec<Event>> {
    read_table(store).await
}

/// Locate an event by id, returning its 0-based row index alongside it.
pub async fn find_event(store: &dyn RowStore, event_id: &str) -> Result<Option<(usize, Event)>> {
    let events = get_events(store).await?;
    Ok(events
        .into_iter()
        .enumerate()
        .find(|(_, e)| e.event_id == event_id))
}

/// All tracking records, optionally narrowed to one event.
pub async fn get_payment_tracking(
    store: &dyn RowStore,
    event_id: Option<&str>,
) -> Result<Vec<PaymentRecord>> {
    let records: Vec<PaymentRecord> = read_table(store).await?;
    Ok(match event_id {
        Some(id) => records.into_iter().filter(|r| r.event_id == id).collect(),
        None => records,
    })
}

pub async fn get_authorized_members(store: &dyn RowStore) -> Result<Vec<AuthorizedMember>> {
    read_table(store).await
}

pub async fn get_registered_members(store: &dyn RowStore) -> Result<Vec<RegisteredMember>> {
    read_table(store).await
}

pub async fn get_pending_registrations(
    store: &dyn RowStore,
) -> Result<Vec<PendingRegistration>> {
    read_table(store).await
}

pub async fn find_registered_member_by_line_id(
    store: &dyn RowStore,
    line_user_id: &str,
) -> Result<Option<RegisteredMember>> {
    let members = get_registered_members(store).await?;
    Ok(members.into_iter().find(|m| m.line_user_id == line_user_id))
}

// ─────────────────────────────────────────────────────────
// Writes
// ─────────────────────────────────────────────────────────

/// Persist a new event together with its tracking records.
///
/// The two appends are not transactional: a failure after the event row
/// lands leaves an event without records. The event goes first so a
/// partial failure is at least visible in the events list rather than as
/// orphaned tracking rows.
pub async fn insert_event_with_records(
    store: &dyn RowStore,
    event: &Event,
    records: &[PaymentRecord],
) -> Result<()> {
    store.append(Table::Events, vec![event.to_row()]).await?;
    let rows: Vec<Vec<String>> = records.iter().map(RowCodec::to_row).collect();
    store.append(Table::PaymentTracking, rows).await?;
    Ok(())
}

/// Rewrite the mutable tail (E..N) of one tracking row.
pub async fn write_payment_update(
    store: &dyn RowStore,
    row_index: usize,
    record: &PaymentRecord,
) -> Result<()> {
    store
        .update_range(
            Table::PaymentTracking,
            row_index,
            PAYMENT_UPDATE_SPAN,
            payment_update_cells(record),
        )
        .await
}

/// Rewrite the derived-totals tail (J..L) of one event row.
pub async fn write_event_totals(
    store: &dyn RowStore,
    row_index: usize,
    event: &Event,
) -> Result<()> {
    store
        .update_range(Table::Events, row_index, EVENT_TOTALS_SPAN, event_totals_cells(event))
        .await
}

/// Rewrite an entire event row (admin edits).
pub async fn write_event(store: &dyn RowStore, row_index: usize, event: &Event) -> Result<()> {
    store
        .update_range(Table::Events, row_index, EVENT_ROW_SPAN, event.to_row())
        .await
}
