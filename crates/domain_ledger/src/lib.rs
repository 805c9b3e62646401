//! Ledger Domain - Double-Entry Posting Groups
//!
//! This crate implements the append-only ledger primitive shared by document
//! approval and payment distribution. Every business event produces one
//! *posting group*: a set of debit/credit entries created atomically that
//! must balance in system currency.
//!
//! # Invariants
//!
//! - A posting group holds at least two entries
//! - `sum(debit equivalents) == sum(credit equivalents)` within the
//!   reconciliation tolerance (0.01 system currency)
//! - Entries are immutable once the group is committed; corrections are new
//!   reversing groups, never edits

pub mod entry;
pub mod error;
pub mod group;

pub use entry::{EntryNature, LedgerEntry};
pub use error::LedgerError;
pub use group::{equivalent_totals, PostingGroup};
