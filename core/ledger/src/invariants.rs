#![allow(dead_code)]

use crate::ledger;
use crate::types::{Event, PaymentRecord, PaymentSummary};

/// INV-1: A record's status must equal the status derived from its amounts.
pub fn assert_status_consistent(record: &PaymentRecord) {
    let derived = ledger::compute_status(record.paid_amount, record.required_amount);
    assert_eq!(
        record.payment_status, derived,
        "INV-1 violated: record {} has status {:?}, amounts derive {:?}",
        record.tracking_id, record.payment_status, derived
    );
}

/// INV-2: Summary counts must partition the record set.
pub fn assert_summary_partition(summary: &PaymentSummary, records: &[PaymentRecord]) {
    assert_eq!(
        (summary.unpaid_count + summary.partial_count + summary.paid_count) as usize,
        records.len(),
        "INV-2 violated: counts {}+{}+{} do not partition {} records",
        summary.unpaid_count,
        summary.partial_count,
        summary.paid_count,
        records.len()
    );
}

/// INV-3: A freshly recomputed event must carry the sum of its records'
/// paid amounts.
pub fn assert_totals_match(event: &Event, records: &[PaymentRecord]) {
    let expected: f64 = records
        .iter()
        .filter(|r| r.event_id == event.event_id)
        .map(|r| r.paid_amount)
        .sum();
    assert_eq!(
        event.collected_amount, expected,
        "INV-3 violated: event {} caches {} collected, records sum to {}",
        event.event_id, event.collected_amount, expected
    );
}

/// INV-4: Identity and snapshot fields of a record never change after
/// creation, whatever mutations the ledger applies.
pub fn assert_snapshot_fields_unchanged(original: &PaymentRecord, current: &PaymentRecord) {
    assert_eq!(
        original.tracking_id, current.tracking_id,
        "INV-4 violated: tracking id changed"
    );
    assert_eq!(
        original.event_id, current.event_id,
        "INV-4 violated: owning event changed"
    );
    assert_eq!(
        original.member_line_user_id, current.member_line_user_id,
        "INV-4 violated: member changed"
    );
    assert_eq!(
        original.required_amount, current.required_amount,
        "INV-4 violated: required-amount snapshot changed"
    );
    assert_eq!(
        original.created_date, current.created_date,
        "INV-4 violated: creation date changed"
    );
}

/// Run the stateless record invariants over a whole snapshot.
pub fn assert_all_record_invariants(records: &[PaymentRecord]) {
    for record in records {
        assert_status_consistent(record);
    }
    assert_summary_partition(&ledger::summarize(records), records);
}
