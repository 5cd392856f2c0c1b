//! # Types
//!
//! Shared data structures used across the ledger, aggregator, and policy.
//!
//! ## Design decisions
//!
//! ### Status as a pure function
//!
//! [`PaymentStatus`] is never trusted from caller input: it is recomputed
//! from `paid_amount` / `required_amount` on every mutation by the ledger.
//! The persisted column exists only so the sheet stays human-readable.
//!
//! ### Status as a Finite-State Machine
//!
//! [`EventStatus`] enforces a strict forward-only lifecycle:
//!
//! ```text
//! Planning ──► Active ──► Completed
//!     │           │
//!     └───────────┴──► Cancelled
//! ```
//!
//! Transitions out of the terminal states (`Completed`, `Cancelled`) are
//! rejected by the aggregator.
//!
//! ### Snapshot amounts
//!
//! `PaymentRecord::required_amount` is a snapshot of the event's per-person
//! amount taken at record creation, not a live reference. Editing the event
//! later must not rewrite existing records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────
// Enums
// ─────────────────────────────────────────────────────────

/// Kind of collectible occasion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A competitive match or tournament outing.
    Match,
    /// A club meal or dinner gathering.
    Meal,
    /// Anything else.
    Other,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Meal => "meal",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "match" => Some(Self::Match),
            "meal" => Some(Self::Meal),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Being organised; participants may still change.
    Planning,
    /// Collection in progress.
    Active,
    /// Collection finished.
    Completed,
    /// Called off. A status change, not a deletion — the rows stay.
    Cancelled,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "planning" => Some(Self::Planning),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state of a single tracking record.
///
/// Derived from the amounts — see [`crate::ledger::compute_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Partial => "partial",
            Self::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(Self::Unpaid),
            "partial" => Some(Self::Partial),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }
}

/// How a payment was handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Other,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Transfer => "transfer",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(Self::Cash),
            "transfer" => Some(Self::Transfer),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Club role, resolved from the RegisteredMembers table.
///
/// Roles are a flat enumeration, not a rank — each permission predicate in
/// [`crate::policy`] lists the qualifying roles explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Collector,
    Member,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Collector => "collector",
            Self::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "collector" => Some(Self::Collector),
            "member" => Some(Self::Member),
            _ => None,
        }
    }
}

/// Active/inactive flag on member rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Inactive,
}

impl MemberStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Review state of a pending registration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Entities
// ─────────────────────────────────────────────────────────

/// A collectible occasion with a per-participant required amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "eventID")]
    pub event_id: String,
    pub event_name: String,
    pub event_date: NaiveDate,
    pub event_type: EventType,
    /// Amount each participant owes.
    pub required_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: EventStatus,
    pub created_by: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub participant_count: u32,
    /// Cached sum of `paid_amount` over the event's tracking records,
    /// refreshed by the aggregator. Not guaranteed instantaneously
    /// consistent between refreshes.
    pub collected_amount: f64,
    /// 0–100 projection; computed on demand, never persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_progress: Option<f64>,
}

/// One member's obligation and payment state for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(rename = "trackingID")]
    pub tracking_id: String,
    #[serde(rename = "eventID")]
    pub event_id: String,
    #[serde(rename = "memberLineUserID")]
    pub member_line_user_id: String,
    pub member_display_name: String,
    /// Snapshot of the event's per-person amount at creation.
    pub required_amount: f64,
    pub paid_amount: f64,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collected_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collector_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

/// Aggregate collection statistics over a set of tracking records.
///
/// Derived on demand — never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub total_required: f64,
    pub total_collected: f64,
    pub unpaid_count: u32,
    pub partial_count: u32,
    pub paid_count: u32,
    /// 0–100. Defined as 0 when `total_required` is 0.
    pub collection_rate: f64,
}

// ─────────────────────────────────────────────────────────
// Identity rows (read-only for the core)
// ─────────────────────────────────────────────────────────
//
// Member-management writes belong to an out-of-scope flow; the core only
// reads these tables to resolve roles and display names. Their free-form
// date columns stay strings rather than parsed timestamps.

/// A person allowed to register, as maintained by the club admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizedMember {
    pub id: u32,
    pub real_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub authorized_by: String,
    pub authorized_date: String,
    pub status: MemberStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A member who completed LINE registration and was matched to an
/// authorized entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredMember {
    #[serde(rename = "memberID")]
    pub member_id: u32,
    #[serde(rename = "lineUserID")]
    pub line_user_id: String,
    pub line_display_name: String,
    #[serde(rename = "linePictureURL", skip_serializing_if = "Option::is_none")]
    pub line_picture_url: Option<String>,
    pub real_name: String,
    pub role: Role,
    pub register_date: String,
    pub last_login_date: String,
    pub status: MemberStatus,
    #[serde(rename = "matchedFromID")]
    pub matched_from_id: u32,
}

/// A registration request awaiting admin review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRegistration {
    #[serde(rename = "requestID")]
    pub request_id: u32,
    #[serde(rename = "lineUserID")]
    pub line_user_id: String,
    pub line_display_name: String,
    #[serde(rename = "linePictureURL", skip_serializing_if = "Option::is_none")]
    pub line_picture_url: Option<String>,
    pub request_date: String,
    pub status: RegistrationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_date: Option<String>,
    #[serde(rename = "selectedAuthorizedID", skip_serializing_if = "Option::is_none")]
    pub selected_authorized_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
