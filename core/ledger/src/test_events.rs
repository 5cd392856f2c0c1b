use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::errors::LedgerError;
use crate::events::{
    apply_changes, can_transition, create_event, event_id, recompute_totals, transition,
    EventChanges, EventDraft,
};
use crate::invariants;
use crate::ledger::{compute_status, record_payment, Collector, Participant, PaymentUpdate};
use crate::types::{Event, EventStatus, EventType, PaymentMethod, PaymentRecord};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn draft() -> EventDraft {
    EventDraft {
        event_name: "Spring tournament".to_string(),
        event_date: NaiveDate::from_ymd_opt(2025, 4, 12).unwrap(),
        event_type: EventType::Match,
        required_amount: 500.0,
        description: Some("Court fees and shuttles".to_string()),
        created_by: "Chair".to_string(),
    }
}

fn participants(n: usize) -> Vec<Participant> {
    (0..n)
        .map(|i| Participant {
            line_user_id: format!("U_{i}"),
            display_name: format!("Member {i}"),
        })
        .collect()
}

fn event(status: EventStatus) -> Event {
    Event {
        event_id: "event_1".to_string(),
        event_name: "Spring tournament".to_string(),
        event_date: NaiveDate::from_ymd_opt(2025, 4, 12).unwrap(),
        event_type: EventType::Match,
        required_amount: 500.0,
        description: None,
        status,
        created_by: "Chair".to_string(),
        created_date: at(1_000),
        updated_date: at(1_000),
        participant_count: 3,
        collected_amount: 0.0,
        collection_progress: None,
    }
}

fn paid_record(event_id: &str, member: &str, required: f64, paid: f64) -> PaymentRecord {
    PaymentRecord {
        tracking_id: format!("track_{event_id}_{member}"),
        event_id: event_id.to_string(),
        member_line_user_id: member.to_string(),
        member_display_name: member.to_string(),
        required_amount: required,
        paid_amount: paid,
        payment_status: compute_status(paid, required),
        payment_date: None,
        collected_by: None,
        collector_name: None,
        payment_method: None,
        notes: None,
        created_date: at(1_000),
        updated_date: at(1_000),
    }
}

// ─────────────────────────────────────────────────────────
// create_event
// ─────────────────────────────────────────────────────────

#[test]
fn test_create_event_returns_event_and_records() {
    let (event, records) = create_event(draft(), &participants(3), at(2_000)).unwrap();

    assert_eq!(event.status, EventStatus::Planning);
    assert_eq!(event.participant_count, 3);
    assert_eq!(event.collected_amount, 0.0);
    assert_eq!(records.len(), 3);
    for record in &records {
        assert_eq!(record.event_id, event.event_id);
        assert_eq!(record.required_amount, 500.0);
    }
}

#[test]
fn test_create_event_rejects_blank_name() {
    let mut d = draft();
    d.event_name = "   ".to_string();
    let err = create_event(d, &participants(1), at(2_000)).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[test]
fn test_create_event_rejects_negative_amount() {
    let mut d = draft();
    d.required_amount = -1.0;
    let err = create_event(d, &participants(1), at(2_000)).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[test]
fn test_create_event_rejects_no_participants() {
    let err = create_event(draft(), &[], at(2_000)).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[test]
fn test_event_ids_are_unique_even_at_the_same_instant() {
    let a = event_id(at(2_000));
    let b = event_id(at(2_000));
    assert!(a.starts_with("event_2000000_"));
    assert_ne!(a, b);
}

// ─────────────────────────────────────────────────────────
// recompute_totals
// ─────────────────────────────────────────────────────────

#[test]
fn test_recompute_totals_sums_matching_records_only() {
    let ev = event(EventStatus::Active);
    let records = vec![
        paid_record("event_1", "a", 500.0, 500.0),
        paid_record("event_1", "b", 500.0, 200.0),
        paid_record("event_other", "c", 500.0, 500.0),
    ];
    let updated = recompute_totals(&ev, &records);

    assert_eq!(updated.collected_amount, 700.0);
    // 700 of 1500 planned (500 * 3 participants).
    let progress = updated.collection_progress.unwrap();
    assert!((progress - 46.666_666_666_666_664).abs() < 1e-9);
    invariants::assert_totals_match(&updated, &records);
}

#[test]
fn test_recompute_totals_is_idempotent() {
    let ev = event(EventStatus::Active);
    let records = vec![paid_record("event_1", "a", 500.0, 300.0)];
    let once = recompute_totals(&ev, &records);
    let twice = recompute_totals(&once, &records);
    assert_eq!(once, twice);
}

#[test]
fn test_recompute_totals_zero_planned_total() {
    let mut ev = event(EventStatus::Active);
    ev.required_amount = 0.0;
    let updated = recompute_totals(&ev, &[]);
    assert_eq!(updated.collected_amount, 0.0);
    assert_eq!(updated.collection_progress, Some(0.0));
}

#[test]
fn test_recompute_totals_after_payment_raises_cached_amount() {
    // Scenario B, aggregator half: a 500 payment lifts the event total by 500.
    let ev = event(EventStatus::Active);
    let records = vec![
        paid_record("event_1", "a", 500.0, 0.0),
        paid_record("event_1", "b", 500.0, 0.0),
        paid_record("event_1", "c", 500.0, 0.0),
    ];
    let before = recompute_totals(&ev, &records);
    assert_eq!(before.collected_amount, 0.0);

    let collector = Collector {
        line_user_id: "U_x".to_string(),
        display_name: "X".to_string(),
    };
    let update = PaymentUpdate {
        paid_amount: 500.0,
        method: PaymentMethod::Cash,
        payment_date: None,
        notes: None,
        expected_last_updated: None,
    };
    let updated_record =
        record_payment(&records, &records[0].tracking_id, update, &collector, at(3_000)).unwrap();

    let mut after_records = records.clone();
    after_records[0] = updated_record;
    let after = recompute_totals(&before, &after_records);

    assert_eq!(after.collected_amount, before.collected_amount + 500.0);
    let progress = after.collection_progress.unwrap();
    assert!((progress - 33.333_333_333_333_336).abs() < 1e-9);
}

// ─────────────────────────────────────────────────────────
// transition
// ─────────────────────────────────────────────────────────

#[test]
fn test_transition_happy_path() {
    let planning = event(EventStatus::Planning);
    let active = transition(&planning, EventStatus::Active, at(2_000)).unwrap();
    assert_eq!(active.status, EventStatus::Active);
    assert_eq!(active.updated_date, at(2_000));

    let completed = transition(&active, EventStatus::Completed, at(3_000)).unwrap();
    assert_eq!(completed.status, EventStatus::Completed);
}

#[test]
fn test_transition_cancel_from_planning_and_active() {
    assert!(transition(&event(EventStatus::Planning), EventStatus::Cancelled, at(2_000)).is_ok());
    assert!(transition(&event(EventStatus::Active), EventStatus::Cancelled, at(2_000)).is_ok());
}

#[test]
fn test_transition_no_exit_from_terminal_states() {
    // Scenario E: completed -> active must fail.
    let err =
        transition(&event(EventStatus::Completed), EventStatus::Active, at(2_000)).unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidTransition {
            from: EventStatus::Completed,
            to: EventStatus::Active,
        }
    );

    for target in [
        EventStatus::Planning,
        EventStatus::Active,
        EventStatus::Completed,
    ] {
        assert!(transition(&event(EventStatus::Cancelled), target, at(2_000)).is_err());
    }
}

#[test]
fn test_transition_matrix_matches_predicate() {
    let all = [
        EventStatus::Planning,
        EventStatus::Active,
        EventStatus::Completed,
        EventStatus::Cancelled,
    ];
    for from in all {
        for to in all {
            assert_eq!(
                transition(&event(from), to, at(2_000)).is_ok(),
                can_transition(from, to),
                "transition {from:?} -> {to:?} disagrees with can_transition"
            );
        }
    }
}

#[test]
fn test_planning_cannot_skip_to_completed() {
    assert!(!can_transition(EventStatus::Planning, EventStatus::Completed));
}

// ─────────────────────────────────────────────────────────
// apply_changes
// ─────────────────────────────────────────────────────────

#[test]
fn test_apply_changes_edits_fields() {
    let ev = event(EventStatus::Planning);
    let changes = EventChanges {
        event_name: Some("Autumn tournament".to_string()),
        required_amount: Some(600.0),
        ..EventChanges::default()
    };
    let updated = apply_changes(&ev, &changes, at(2_000)).unwrap();
    assert_eq!(updated.event_name, "Autumn tournament");
    assert_eq!(updated.required_amount, 600.0);
    assert_eq!(updated.updated_date, at(2_000));
}

#[test]
fn test_apply_changes_amount_edit_leaves_existing_records_alone() {
    // Snapshot semantics: raising the event amount does not reach back into
    // records created before the edit.
    let (ev, records) = create_event(draft(), &participants(2), at(2_000)).unwrap();
    let changes = EventChanges {
        required_amount: Some(900.0),
        ..EventChanges::default()
    };
    let updated = apply_changes(&ev, &changes, at(3_000)).unwrap();

    assert_eq!(updated.required_amount, 900.0);
    for record in &records {
        assert_eq!(record.required_amount, 500.0);
    }
}

#[test]
fn test_apply_changes_routes_status_through_state_machine() {
    let ev = event(EventStatus::Planning);
    let ok = apply_changes(
        &ev,
        &EventChanges {
            status: Some(EventStatus::Active),
            ..EventChanges::default()
        },
        at(2_000),
    )
    .unwrap();
    assert_eq!(ok.status, EventStatus::Active);

    let err = apply_changes(
        &ev,
        &EventChanges {
            status: Some(EventStatus::Completed),
            ..EventChanges::default()
        },
        at(2_000),
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTransition { .. }));
}

#[test]
fn test_apply_changes_same_status_is_a_noop() {
    let ev = event(EventStatus::Active);
    let updated = apply_changes(
        &ev,
        &EventChanges {
            status: Some(EventStatus::Active),
            ..EventChanges::default()
        },
        at(2_000),
    )
    .unwrap();
    assert_eq!(updated.status, EventStatus::Active);
}

#[test]
fn test_apply_changes_empty_description_clears_it() {
    let mut ev = event(EventStatus::Planning);
    ev.description = Some("old".to_string());
    let updated = apply_changes(
        &ev,
        &EventChanges {
            description: Some(String::new()),
            ..EventChanges::default()
        },
        at(2_000),
    )
    .unwrap();
    assert_eq!(updated.description, None);
}
