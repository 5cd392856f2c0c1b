//! # Row codec
//!
//! Schema-checked translation between entities and the row-oriented store.
//!
//! Each logical table has a fixed column order; the helpers here are the
//! single place that knows it. Decoding validates shape instead of silently
//! indexing into whatever the sheet returned, so column drift surfaces as a
//! [`LedgerError::Schema`] instead of corrupt entities.
//!
//! Two storage quirks are handled deliberately:
//!
//! * The spreadsheet API drops trailing empty cells, so rows shorter than
//!   the schema are padded with empty strings before decoding.
//! * Empty numeric cells decode as 0; a non-numeric cell is an error.
//!
//! Timestamps are stored as RFC 3339, event dates as `YYYY-MM-DD`, and
//! optional text columns as empty strings.

use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::{LedgerError, Result};
use crate::types::{
    AuthorizedMember, Event, EventStatus, EventType, MemberStatus, PaymentMethod, PaymentRecord,
    PaymentStatus, PendingRegistration, RegisteredMember, RegistrationStatus, Role,
};

/// The five logical tables backing the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Events,
    PaymentTracking,
    AuthorizedMembers,
    RegisteredMembers,
    PendingRegistrations,
}

impl Table {
    /// Stable table name, used for store addressing and cache keys.
    pub fn name(self) -> &'static str {
        match self {
            Self::Events => "Events",
            Self::PaymentTracking => "PaymentTracking",
            Self::AuthorizedMembers => "AuthorizedMembers",
            Self::RegisteredMembers => "RegisteredMembers",
            Self::PendingRegistrations => "PendingRegistrations",
        }
    }

    /// Number of columns in the table schema.
    pub fn column_count(self) -> usize {
        match self {
            Self::Events => 12,
            Self::PaymentTracking => 14,
            Self::AuthorizedMembers => 10,
            Self::RegisteredMembers => 10,
            Self::PendingRegistrations => 10,
        }
    }
}

/// An inclusive 0-based column span within a table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColSpan {
    pub start: usize,
    pub end: usize,
}

impl ColSpan {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn width(self) -> usize {
        self.end - self.start + 1
    }
}

/// Columns `requiredAmount..updatedDate` (E..N) of a tracking row — the
/// slice rewritten when a payment is recorded. The identity columns A..D
/// are never touched.
pub const PAYMENT_UPDATE_SPAN: ColSpan = ColSpan::new(4, 13);

/// Columns `updatedDate..collectedAmount` (J..L) of an event row — the
/// slice rewritten when the aggregator refreshes derived totals.
pub const EVENT_TOTALS_SPAN: ColSpan = ColSpan::new(9, 11);

/// Entity <-> row translation for one logical table.
///
/// `to_row` always emits exactly `TABLE.column_count()` cells in schema
/// order; `from_row` accepts rows that are short (trailing empties dropped
/// by the store) but rejects type and enum mismatches.
pub trait RowCodec: Sized {
    const TABLE: Table;

    fn to_row(&self) -> Vec<String>;
    fn from_row(row: &[String]) -> Result<Self>;
}

// ─────────────────────────────────────────────────────────
// Cell parsing helpers
// ─────────────────────────────────────────────────────────

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

fn opt_text(row: &[String], idx: usize) -> Option<String> {
    let s = cell(row, idx);
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn schema_err(table: Table, column: &str, value: &str, expected: &str) -> LedgerError {
    LedgerError::Schema(format!(
        "{}: column {column} holds {value:?}, expected {expected}",
        table.name()
    ))
}

fn parse_f64(table: Table, column: &str, s: &str) -> Result<f64> {
    if s.is_empty() {
        return Ok(0.0);
    }
    s.parse::<f64>()
        .map_err(|_| schema_err(table, column, s, "a number"))
}

fn parse_u32(table: Table, column: &str, s: &str) -> Result<u32> {
    if s.is_empty() {
        return Ok(0);
    }
    s.parse::<u32>()
        .map_err(|_| schema_err(table, column, s, "an unsigned integer"))
}

fn parse_datetime(table: Table, column: &str, s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| schema_err(table, column, s, "an RFC 3339 timestamp"))
}

fn parse_opt_datetime(table: Table, column: &str, s: &str) -> Result<Option<DateTime<Utc>>> {
    if s.is_empty() {
        return Ok(None);
    }
    parse_datetime(table, column, s).map(Some)
}

fn parse_date(table: Table, column: &str, s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| schema_err(table, column, s, "a YYYY-MM-DD date"))
}

fn fmt_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn fmt_opt_datetime(dt: Option<DateTime<Utc>>) -> String {
    dt.map(fmt_datetime).unwrap_or_default()
}

fn fmt_opt(s: &Option<String>) -> String {
    s.clone().unwrap_or_default()
}

// ─────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────

impl RowCodec for Event {
    const TABLE: Table = Table::Events;

    fn to_row(&self) -> Vec<String> {
        vec![
            self.event_id.clone(),
            self.event_name.clone(),
            self.event_date.format("%Y-%m-%d").to_string(),
            self.event_type.as_str().to_string(),
            self.required_amount.to_string(),
            fmt_opt(&self.description),
            self.status.as_str().to_string(),
            self.created_by.clone(),
            fmt_datetime(self.created_date),
            fmt_datetime(self.updated_date),
            self.participant_count.to_string(),
            self.collected_amount.to_string(),
        ]
    }

    fn from_row(row: &[String]) -> Result<Self> {
        let t = Self::TABLE;
        Ok(Event {
            event_id: cell(row, 0).to_string(),
            event_name: cell(row, 1).to_string(),
            event_date: parse_date(t, "eventDate", cell(row, 2))?,
            event_type: EventType::parse(cell(row, 3))
                .ok_or_else(|| schema_err(t, "eventType", cell(row, 3), "an event type"))?,
            required_amount: parse_f64(t, "requiredAmount", cell(row, 4))?,
            description: opt_text(row, 5),
            status: EventStatus::parse(cell(row, 6))
                .ok_or_else(|| schema_err(t, "status", cell(row, 6), "an event status"))?,
            created_by: cell(row, 7).to_string(),
            created_date: parse_datetime(t, "createdDate", cell(row, 8))?,
            updated_date: parse_datetime(t, "updatedDate", cell(row, 9))?,
            participant_count: parse_u32(t, "participantCount", cell(row, 10))?,
            collected_amount: parse_f64(t, "collectedAmount", cell(row, 11))?,
            collection_progress: None,
        })
    }
}

/// Cells for [`EVENT_TOTALS_SPAN`], in schema order.
pub fn event_totals_cells(event: &Event) -> Vec<String> {
    vec![
        fmt_datetime(event.updated_date),
        event.participant_count.to_string(),
        event.collected_amount.to_string(),
    ]
}

// ─────────────────────────────────────────────────────────
// PaymentTracking
// ─────────────────────────────────────────────────────────

impl RowCodec for PaymentRecord {
    const TABLE: Table = Table::PaymentTracking;

    fn to_row(&self) -> Vec<String> {
        vec![
            self.tracking_id.clone(),
            self.event_id.clone(),
            self.member_line_user_id.clone(),
            self.member_display_name.clone(),
            self.required_amount.to_string(),
            self.paid_amount.to_string(),
            self.payment_status.as_str().to_string(),
            fmt_opt_datetime(self.payment_date),
            fmt_opt(&self.collected_by),
            fmt_opt(&self.collector_name),
            self.payment_method.map(|m| m.as_str()).unwrap_or("").to_string(),
            fmt_opt(&self.notes),
            fmt_datetime(self.created_date),
            fmt_datetime(self.updated_date),
        ]
    }

    fn from_row(row: &[String]) -> Result<Self> {
        let t = Self::TABLE;
        let method = match cell(row, 10) {
            "" => None,
            s => Some(
                PaymentMethod::parse(s)
                    .ok_or_else(|| schema_err(t, "paymentMethod", s, "a payment method"))?,
            ),
        };
        Ok(PaymentRecord {
            tracking_id: cell(row, 0).to_string(),
            event_id: cell(row, 1).to_string(),
            member_line_user_id: cell(row, 2).to_string(),
            member_display_name: cell(row, 3).to_string(),
            required_amount: parse_f64(t, "requiredAmount", cell(row, 4))?,
            paid_amount: parse_f64(t, "paidAmount", cell(row, 5))?,
            payment_status: PaymentStatus::parse(cell(row, 6))
                .ok_or_else(|| schema_err(t, "paymentStatus", cell(row, 6), "a payment status"))?,
            payment_date: parse_opt_datetime(t, "paymentDate", cell(row, 7))?,
            collected_by: opt_text(row, 8),
            collector_name: opt_text(row, 9),
            payment_method: method,
            notes: opt_text(row, 11),
            created_date: parse_datetime(t, "createdDate", cell(row, 12))?,
            updated_date: parse_datetime(t, "updatedDate", cell(row, 13))?,
        })
    }
}

/// Cells for [`PAYMENT_UPDATE_SPAN`], in schema order. The identity
/// columns (trackingID..memberDisplayName) are never rewritten.
pub fn payment_update_cells(record: &PaymentRecord) -> Vec<String> {
    record.to_row()[PAYMENT_UPDATE_SPAN.start..=PAYMENT_UPDATE_SPAN.end].to_vec()
}

// ─────────────────────────────────────────────────────────
// AuthorizedMembers
// ─────────────────────────────────────────────────────────

impl RowCodec for AuthorizedMember {
    const TABLE: Table = Table::AuthorizedMembers;

    fn to_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.real_name.clone(),
            fmt_opt(&self.line_display_name),
            fmt_opt(&self.phone),
            self.role.as_str().to_string(),
            fmt_opt(&self.department),
            self.authorized_by.clone(),
            self.authorized_date.clone(),
            self.status.as_str().to_string(),
            fmt_opt(&self.notes),
        ]
    }

    fn from_row(row: &[String]) -> Result<Self> {
        let t = Self::TABLE;
        Ok(AuthorizedMember {
            id: parse_u32(t, "id", cell(row, 0))?,
            real_name: cell(row, 1).to_string(),
            line_display_name: opt_text(row, 2),
            phone: opt_text(row, 3),
            role: Role::parse(cell(row, 4))
                .ok_or_else(|| schema_err(t, "role", cell(row, 4), "a role"))?,
            department: opt_text(row, 5),
            authorized_by: cell(row, 6).to_string(),
            authorized_date: cell(row, 7).to_string(),
            status: MemberStatus::parse(cell(row, 8))
                .ok_or_else(|| schema_err(t, "status", cell(row, 8), "a member status"))?,
            notes: opt_text(row, 9),
        })
    }
}

// ─────────────────────────────────────────────────────────
// RegisteredMembers
// ─────────────────────────────────────────────────────────

impl RowCodec for RegisteredMember {
    const TABLE: Table = Table::RegisteredMembers;

    fn to_row(&self) -> Vec<String> {
        vec![
            self.member_id.to_string(),
            self.line_user_id.clone(),
            self.line_display_name.clone(),
            fmt_opt(&self.line_picture_url),
            self.real_name.clone(),
            self.role.as_str().to_string(),
            self.register_date.clone(),
            self.last_login_date.clone(),
            self.status.as_str().to_string(),
            self.matched_from_id.to_string(),
        ]
    }

    fn from_row(row: &[String]) -> Result<Self> {
        let t = Self::TABLE;
        Ok(RegisteredMember {
            member_id: parse_u32(t, "memberID", cell(row, 0))?,
            line_user_id: cell(row, 1).to_string(),
            line_display_name: cell(row, 2).to_string(),
            line_picture_url: opt_text(row, 3),
            real_name: cell(row, 4).to_string(),
            role: Role::parse(cell(row, 5))
                .ok_or_else(|| schema_err(t, "role", cell(row, 5), "a role"))?,
            register_date: cell(row, 6).to_string(),
            last_login_date: cell(row, 7).to_string(),
            status: MemberStatus::parse(cell(row, 8))
                .ok_or_else(|| schema_err(t, "status", cell(row, 8), "a member status"))?,
            matched_from_id: parse_u32(t, "matchedFromID", cell(row, 9))?,
        })
    }
}

// ─────────────────────────────────────────────────────────
// PendingRegistrations
// ─────────────────────────────────────────────────────────

impl RowCodec for PendingRegistration {
    const TABLE: Table = Table::PendingRegistrations;

    fn to_row(&self) -> Vec<String> {
        vec![
            self.request_id.to_string(),
            self.line_user_id.clone(),
            self.line_display_name.clone(),
            fmt_opt(&self.line_picture_url),
            self.request_date.clone(),
            self.status.as_str().to_string(),
            fmt_opt(&self.reviewed_by),
            fmt_opt(&self.review_date),
            self.selected_authorized_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            fmt_opt(&self.notes),
        ]
    }

    fn from_row(row: &[String]) -> Result<Self> {
        let t = Self::TABLE;
        let selected = match cell(row, 8) {
            "" => None,
            s => Some(parse_u32(t, "selectedAuthorizedID", s)?),
        };
        Ok(PendingRegistration {
            request_id: parse_u32(t, "requestID", cell(row, 0))?,
            line_user_id: cell(row, 1).to_string(),
            line_display_name: cell(row, 2).to_string(),
            line_picture_url: opt_text(row, 3),
            request_date: cell(row, 4).to_string(),
            status: RegistrationStatus::parse(cell(row, 5))
                .ok_or_else(|| schema_err(t, "status", cell(row, 5), "a registration status"))?,
            reviewed_by: opt_text(row, 6),
            review_date: opt_text(row, 7),
            selected_authorized_id: selected,
            notes: opt_text(row, 9),
        })
    }
}

/// Decode a whole table snapshot, keeping the original row order.
pub fn decode_rows<T: RowCodec>(rows: &[Vec<String>]) -> Result<Vec<T>> {
    rows.iter().map(|r| T::from_row(r)).collect()
}
