//! Custom assertion helpers for domain types

use domain_ledger::{equivalent_totals, LedgerEntry};
use rust_decimal_macros::dec;

/// Panics unless the entries balance within the reconciliation tolerance
pub fn assert_balanced(entries: &[LedgerEntry]) {
    let (debits, credits) = equivalent_totals(entries);
    assert!(
        (debits - credits).abs() <= dec!(0.01),
        "entries do not balance: debits {debits}, credits {credits}"
    );
}

/// Panics unless every entry in the slice shares one posting group id
pub fn assert_single_group(entries: &[LedgerEntry]) {
    assert!(!entries.is_empty(), "no entries");
    let group = entries[0].posting_group_id;
    assert!(
        entries.iter().all(|e| e.posting_group_id == group),
        "entries span more than one posting group"
    );
}
