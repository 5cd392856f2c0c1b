//! Domain error taxonomy shared by the ledger, aggregator, and policy.
//!
//! Persistence failures are deliberately absent — the core never performs
//! I/O, so storage errors belong to the backend crate and stay opaque here.

use thiserror::Error;

use crate::types::EventStatus;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Malformed or out-of-range input (negative amount, empty name, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist in the current table snapshot.
    #[error("not found: {0}")]
    NotFound(String),

    /// No authenticated identity could be resolved.
    #[error("authentication required: {0}")]
    Authentication(String),

    /// An identity is present but its role is insufficient, or the
    /// identity is not a registered member.
    #[error("permission denied: {0}")]
    Authorization(String),

    /// The requested status change is not reachable in the event
    /// lifecycle state machine.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: EventStatus,
        to: EventStatus,
    },

    /// The caller's expected `updatedDate` no longer matches the stored
    /// record — someone else wrote in between.
    #[error("update conflict: {0}")]
    Conflict(String),

    /// A stored row does not match the table schema (shape drift).
    #[error("row schema error: {0}")]
    Schema(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
