use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::errors::LedgerError;
use crate::rows::{
    decode_rows, event_totals_cells, payment_update_cells, RowCodec, Table, EVENT_TOTALS_SPAN,
    PAYMENT_UPDATE_SPAN,
};
use crate::types::{
    AuthorizedMember, Event, EventStatus, EventType, MemberStatus, PaymentMethod, PaymentRecord,
    PaymentStatus, PendingRegistration, RegisteredMember, RegistrationStatus, Role,
};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn sample_event() -> Event {
    Event {
        event_id: "event_1700000000000_ab12cd34".to_string(),
        event_name: "Spring tournament".to_string(),
        event_date: NaiveDate::from_ymd_opt(2025, 4, 12).unwrap(),
        event_type: EventType::Match,
        required_amount: 500.0,
        description: Some("Court fees".to_string()),
        status: EventStatus::Active,
        created_by: "Chair".to_string(),
        created_date: at(1_700_000_000),
        updated_date: at(1_700_000_100),
        participant_count: 3,
        collected_amount: 700.0,
        collection_progress: None,
    }
}

fn sample_record() -> PaymentRecord {
    PaymentRecord {
        tracking_id: "track_event_1_U_a_1700000000000".to_string(),
        event_id: "event_1".to_string(),
        member_line_user_id: "U_a".to_string(),
        member_display_name: "Alice".to_string(),
        required_amount: 500.0,
        paid_amount: 200.0,
        payment_status: PaymentStatus::Partial,
        payment_date: Some(at(1_700_000_050)),
        collected_by: Some("U_c".to_string()),
        collector_name: Some("Carol".to_string()),
        payment_method: Some(PaymentMethod::Transfer),
        notes: Some("two instalments".to_string()),
        created_date: at(1_700_000_000),
        updated_date: at(1_700_000_050),
    }
}

// ─────────────────────────────────────────────────────────
// Round trips (field-order-exact)
// ─────────────────────────────────────────────────────────

#[test]
fn test_event_round_trip() {
    let event = sample_event();
    let row = event.to_row();
    assert_eq!(row.len(), Table::Events.column_count());
    assert_eq!(row[0], "event_1700000000000_ab12cd34");
    assert_eq!(row[4], "500");
    assert_eq!(row[6], "active");
    assert_eq!(row[10], "3");

    let decoded = Event::from_row(&row).unwrap();
    assert_eq!(decoded, event);
}

#[test]
fn test_payment_record_round_trip() {
    let record = sample_record();
    let row = record.to_row();
    assert_eq!(row.len(), Table::PaymentTracking.column_count());
    // Field order is the contract with the sheet; spot-check the schema.
    assert_eq!(row[0], record.tracking_id);
    assert_eq!(row[1], record.event_id);
    assert_eq!(row[5], "200");
    assert_eq!(row[6], "partial");
    assert_eq!(row[10], "transfer");

    let decoded = PaymentRecord::from_row(&row).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn test_payment_record_round_trip_with_empty_optionals() {
    let record = PaymentRecord {
        payment_date: None,
        collected_by: None,
        collector_name: None,
        payment_method: None,
        notes: None,
        paid_amount: 0.0,
        payment_status: PaymentStatus::Unpaid,
        ..sample_record()
    };
    let row = record.to_row();
    assert_eq!(row[7], "");
    assert_eq!(row[10], "");

    let decoded = PaymentRecord::from_row(&row).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn test_authorized_member_round_trip() {
    let member = AuthorizedMember {
        id: 4,
        real_name: "Dana".to_string(),
        line_display_name: None,
        phone: Some("0912-345-678".to_string()),
        role: Role::Collector,
        department: None,
        authorized_by: "Chair".to_string(),
        authorized_date: "2024-11-02".to_string(),
        status: MemberStatus::Active,
        notes: None,
    };
    let row = member.to_row();
    assert_eq!(row.len(), Table::AuthorizedMembers.column_count());
    assert_eq!(member, AuthorizedMember::from_row(&row).unwrap());
}

#[test]
fn test_registered_member_round_trip() {
    let member = RegisteredMember {
        member_id: 9,
        line_user_id: "U_b".to_string(),
        line_display_name: "bee".to_string(),
        line_picture_url: Some("https://example.test/b.png".to_string()),
        real_name: "Beatrice".to_string(),
        role: Role::Member,
        register_date: "2024-12-01".to_string(),
        last_login_date: "2025-01-15".to_string(),
        status: MemberStatus::Active,
        matched_from_id: 4,
    };
    let row = member.to_row();
    assert_eq!(row.len(), Table::RegisteredMembers.column_count());
    assert_eq!(member, RegisteredMember::from_row(&row).unwrap());
}

#[test]
fn test_pending_registration_round_trip() {
    let request = PendingRegistration {
        request_id: 2,
        line_user_id: "U_new".to_string(),
        line_display_name: "newbie".to_string(),
        line_picture_url: None,
        request_date: "2025-02-01".to_string(),
        status: RegistrationStatus::Pending,
        reviewed_by: None,
        review_date: None,
        selected_authorized_id: None,
        notes: None,
    };
    let row = request.to_row();
    assert_eq!(row.len(), Table::PendingRegistrations.column_count());
    assert_eq!(request, PendingRegistration::from_row(&row).unwrap());
}

// ─────────────────────────────────────────────────────────
// Shape handling
// ─────────────────────────────────────────────────────────

#[test]
fn test_short_row_is_padded_like_trailing_empty_cells() {
    // The store drops trailing empty cells; a member row whose notes
    // column is blank comes back one cell short and must still decode.
    let member = AuthorizedMember {
        id: 4,
        real_name: "Dana".to_string(),
        line_display_name: None,
        phone: None,
        role: Role::Member,
        department: None,
        authorized_by: "Chair".to_string(),
        authorized_date: "2024-11-02".to_string(),
        status: MemberStatus::Active,
        notes: None,
    };
    let mut row = member.to_row();
    assert_eq!(row.last().map(String::as_str), Some(""));

    row.truncate(9);
    let decoded = AuthorizedMember::from_row(&row).unwrap();
    assert_eq!(decoded, member);
}

#[test]
fn test_missing_required_timestamp_is_schema_error() {
    let mut row = sample_record().to_row();
    row.truncate(12); // cuts createdDate / updatedDate
    let err = PaymentRecord::from_row(&row).unwrap_err();
    assert!(matches!(err, LedgerError::Schema(_)));
}

#[test]
fn test_bad_amount_cell_is_schema_error() {
    let mut row = sample_record().to_row();
    row[5] = "lots".to_string();
    let err = PaymentRecord::from_row(&row).unwrap_err();
    assert!(matches!(err, LedgerError::Schema(_)));
}

#[test]
fn test_empty_amount_cell_reads_as_zero() {
    let mut row = sample_record().to_row();
    row[5] = String::new();
    let decoded = PaymentRecord::from_row(&row).unwrap();
    assert_eq!(decoded.paid_amount, 0.0);
}

#[test]
fn test_unknown_enum_cell_is_schema_error() {
    let mut row = sample_event().to_row();
    row[6] = "archived".to_string();
    assert!(matches!(
        Event::from_row(&row).unwrap_err(),
        LedgerError::Schema(_)
    ));

    let mut row = sample_record().to_row();
    row[10] = "cheque".to_string();
    assert!(matches!(
        PaymentRecord::from_row(&row).unwrap_err(),
        LedgerError::Schema(_)
    ));
}

#[test]
fn test_decode_rows_propagates_the_first_error() {
    let good = sample_event().to_row();
    let mut bad = sample_event().to_row();
    bad[4] = "free".to_string();
    let err = decode_rows::<Event>(&[good, bad]).unwrap_err();
    assert!(matches!(err, LedgerError::Schema(_)));
}

// ─────────────────────────────────────────────────────────
// Update spans
// ─────────────────────────────────────────────────────────

#[test]
fn test_payment_update_cells_cover_the_mutable_tail() {
    let record = sample_record();
    let cells = payment_update_cells(&record);
    assert_eq!(cells.len(), PAYMENT_UPDATE_SPAN.width());
    assert_eq!(cells[0], "200"); // paidAmount
    assert_eq!(cells[1], "partial"); // paymentStatus
    assert_eq!(cells[cells.len() - 1], record.to_row()[13]); // updatedDate
}

#[test]
fn test_event_totals_cells_cover_the_derived_tail() {
    let event = sample_event();
    let cells = event_totals_cells(&event);
    assert_eq!(cells.len(), EVENT_TOTALS_SPAN.width());
    assert_eq!(cells[1], "3"); // participantCount
    assert_eq!(cells[2], "700"); // collectedAmount
}

// ─────────────────────────────────────────────────────────
// JSON wire names
// ─────────────────────────────────────────────────────────

#[test]
fn test_json_field_names_match_the_original_api() {
    let json = serde_json::to_value(sample_event()).unwrap();
    assert!(json.get("eventID").is_some());
    assert!(json.get("eventName").is_some());
    assert!(json.get("requiredAmount").is_some());
    assert!(json.get("collectedAmount").is_some());

    let json = serde_json::to_value(sample_record()).unwrap();
    assert!(json.get("trackingID").is_some());
    assert!(json.get("memberLineUserID").is_some());
    assert!(json.get("paymentStatus").is_some());
    assert_eq!(json.get("paymentMethod").unwrap(), "transfer");
}
