//! # Access policy
//!
//! Maps a resolved user to the operations it may perform, so role checks
//! live in one place instead of being sprinkled through the ledger and
//! aggregator.
//!
//! Each predicate enumerates its qualifying roles explicitly. There is no
//! numeric rank to compare against — the predicates are independently
//! extensible and a new role must be added to each one it qualifies for.
//!
//! Two distinct failure modes matter at the boundary: an identity that
//! could not be resolved at all (no login — 401) versus one that is
//! authenticated but unregistered or under-privileged (403).

use crate::errors::{LedgerError, Result};
use crate::types::{RegisteredMember, Role};

/// Registration state of an authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// Matched to a RegisteredMembers row.
    Registered {
        member_id: u32,
        real_name: String,
        role: Role,
    },
    /// Authenticated with the provider but unknown to the club (or still
    /// pending review).
    Unregistered,
}

/// An identity resolved by the external authentication provider, enriched
/// with the club-side registration lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub line_user_id: String,
    pub display_name: String,
    pub picture_url: Option<String>,
    pub registration: Registration,
}

impl CurrentUser {
    /// Attach a registration row to a bare provider identity.
    pub fn registered(
        line_user_id: String,
        display_name: String,
        picture_url: Option<String>,
        member: &RegisteredMember,
    ) -> Self {
        Self {
            line_user_id,
            display_name,
            picture_url,
            registration: Registration::Registered {
                member_id: member.member_id,
                real_name: member.real_name.clone(),
                role: member.role,
            },
        }
    }

    pub fn role(&self) -> Option<Role> {
        match &self.registration {
            Registration::Registered { role, .. } => Some(*role),
            Registration::Unregistered => None,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self.registration, Registration::Registered { .. })
    }

    /// Real name for record-keeping, falling back to the provider display
    /// name for the odd row where the match left it blank.
    pub fn collector_name(&self) -> &str {
        match &self.registration {
            Registration::Registered { real_name, .. } if !real_name.is_empty() => real_name,
            _ => &self.display_name,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Permission predicates
// ─────────────────────────────────────────────────────────

pub fn can_create_event(role: Role) -> bool {
    matches!(role, Role::Admin)
}

pub fn can_manage_members(role: Role) -> bool {
    matches!(role, Role::Admin)
}

pub fn can_collect_payment(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Collector)
}

pub fn can_view_reports(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Collector)
}

pub fn can_view_own_payments(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Collector | Role::Member)
}

/// Role sets for the common handler gates.
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const COLLECTORS: &[Role] = &[Role::Admin, Role::Collector];
pub const ALL_ROLES: &[Role] = &[Role::Admin, Role::Collector, Role::Member];

/// Require an authenticated, registered user whose role is in `allowed`.
///
/// `None` means the provider produced no identity — `Authentication`, so
/// the boundary can prompt a re-login. An authenticated identity that is
/// unregistered, or whose role is not allowed, is `Authorization`.
pub fn require_role<'a>(user: Option<&'a CurrentUser>, allowed: &[Role]) -> Result<&'a CurrentUser> {
    let user = user.ok_or_else(|| LedgerError::Authentication("please sign in".to_string()))?;

    match user.role() {
        None => Err(LedgerError::Authorization(
            "account is not registered or still under review".to_string(),
        )),
        Some(role) if allowed.contains(&role) => Ok(user),
        Some(role) => Err(LedgerError::Authorization(format!(
            "role {} is not permitted for this operation",
            role.as_str()
        ))),
    }
}
