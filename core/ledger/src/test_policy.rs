use crate::errors::LedgerError;
use crate::policy::{
    can_collect_payment, can_create_event, can_manage_members, can_view_own_payments,
    can_view_reports, require_role, CurrentUser, Registration, ADMIN_ONLY, ALL_ROLES, COLLECTORS,
};
use crate::types::Role;

fn registered(role: Role) -> CurrentUser {
    CurrentUser {
        line_user_id: "U_1".to_string(),
        display_name: "Someone".to_string(),
        picture_url: None,
        registration: Registration::Registered {
            member_id: 7,
            real_name: "Real Name".to_string(),
            role,
        },
    }
}

fn unregistered() -> CurrentUser {
    CurrentUser {
        line_user_id: "U_2".to_string(),
        display_name: "Stranger".to_string(),
        picture_url: None,
        registration: Registration::Unregistered,
    }
}

// ─────────────────────────────────────────────────────────
// Predicates — each enumerates its roles explicitly
// ─────────────────────────────────────────────────────────

#[test]
fn test_admin_qualifies_for_everything() {
    assert!(can_create_event(Role::Admin));
    assert!(can_manage_members(Role::Admin));
    assert!(can_collect_payment(Role::Admin));
    assert!(can_view_reports(Role::Admin));
    assert!(can_view_own_payments(Role::Admin));
}

#[test]
fn test_collector_collects_and_views_only() {
    assert!(!can_create_event(Role::Collector));
    assert!(!can_manage_members(Role::Collector));
    assert!(can_collect_payment(Role::Collector));
    assert!(can_view_reports(Role::Collector));
    assert!(can_view_own_payments(Role::Collector));
}

#[test]
fn test_member_views_own_payments_only() {
    assert!(!can_create_event(Role::Member));
    assert!(!can_manage_members(Role::Member));
    assert!(!can_collect_payment(Role::Member));
    assert!(!can_view_reports(Role::Member));
    assert!(can_view_own_payments(Role::Member));
}

// ─────────────────────────────────────────────────────────
// require_role (Scenario D)
// ─────────────────────────────────────────────────────────

#[test]
fn test_require_role_without_identity_is_authentication_error() {
    let err = require_role(None, ADMIN_ONLY).unwrap_err();
    assert!(matches!(err, LedgerError::Authentication(_)));
}

#[test]
fn test_require_role_member_asking_admin_is_authorization_error() {
    let user = registered(Role::Member);
    let err = require_role(Some(&user), ADMIN_ONLY).unwrap_err();
    assert!(matches!(err, LedgerError::Authorization(_)));
}

#[test]
fn test_require_role_unregistered_is_authorization_error() {
    // Authenticated-but-unregistered must stay distinguishable from
    // not-authenticated: 403 versus 401 at the boundary.
    let user = unregistered();
    let err = require_role(Some(&user), ALL_ROLES).unwrap_err();
    assert!(matches!(err, LedgerError::Authorization(_)));
}

#[test]
fn test_require_role_accepts_allowed_roles() {
    let admin = registered(Role::Admin);
    let collector = registered(Role::Collector);
    let member = registered(Role::Member);

    assert!(require_role(Some(&admin), ADMIN_ONLY).is_ok());
    assert!(require_role(Some(&admin), COLLECTORS).is_ok());
    assert!(require_role(Some(&collector), COLLECTORS).is_ok());
    assert!(require_role(Some(&collector), ADMIN_ONLY).is_err());
    assert!(require_role(Some(&member), ALL_ROLES).is_ok());
}

#[test]
fn test_collector_name_prefers_real_name() {
    let user = registered(Role::Collector);
    assert_eq!(user.collector_name(), "Real Name");
    assert_eq!(unregistered().collector_name(), "Stranger");
}

#[test]
fn test_role_accessor() {
    assert_eq!(registered(Role::Admin).role(), Some(Role::Admin));
    assert_eq!(unregistered().role(), None);
    assert!(registered(Role::Member).is_registered());
    assert!(!unregistered().is_registered());
}
