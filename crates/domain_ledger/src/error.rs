//! Ledger domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::MoneyError;

/// Errors that can occur while building or validating posting groups
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A posting group must contain at least two entries
    #[error("Posting group must contain at least 2 entries, got {0}")]
    TooFewEntries(usize),

    /// Debit and credit equivalents diverge beyond tolerance.
    /// This is a programming defect in the caller, not user input.
    #[error("Unbalanced posting group: debit equivalents={debits}, credit equivalents={credits}")]
    Unbalanced { debits: Decimal, credits: Decimal },

    /// Entry amounts carry direction via nature and must be positive
    #[error("Entry amount must be positive, got {0} for account {1}")]
    NonPositiveAmount(Decimal, String),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}
