//! # Club Ledger
//!
//! Domain core of the club payment-tracking application: events with a
//! per-participant required amount, one payment record per participant,
//! and the rules keeping the two consistent.
//!
//! | Concern        | Module                                        |
//! |----------------|-----------------------------------------------|
//! | Data model     | [`types`]                                     |
//! | Row schemas    | [`rows`]                                      |
//! | Payment rules  | [`ledger`]                                    |
//! | Event lifecycle| [`events`]                                    |
//! | Permissions    | [`policy`]                                    |
//! | Errors         | [`errors`]                                    |
//!
//! ## Architecture
//!
//! The core is pure: no I/O, no async, no clock reads — callers pass `now`
//! in. Persistence lives behind the backend's row store; this crate only
//! defines the per-table row schemas it must agree on with that store.
//!
//! ## Concurrency
//!
//! One request is one unit of work. Concurrent writers to the same record
//! are not serialised here — the last write wins unless the caller opts
//! into the `expected_last_updated` conflict guard on payment updates.

pub mod errors;
pub mod events;
pub mod ledger;
pub mod policy;
pub mod rows;
pub mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;
#[cfg(test)]
mod test_policy;
#[cfg(test)]
mod test_rows;

pub use errors::{LedgerError, Result};
pub use types::{
    AuthorizedMember, Event, EventStatus, EventType, MemberStatus, PaymentMethod, PaymentRecord,
    PaymentStatus, PaymentSummary, PendingRegistration, RegisteredMember, RegistrationStatus, Role,
};
