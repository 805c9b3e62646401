//! Posting error taxonomy
//!
//! Four kinds, with distinct handling policies:
//!
//! - [`PostingError::Validation`]: bad input, insufficient stock, payment
//!   over balance. Reported to the caller with a specific message, never
//!   retried.
//! - [`PostingError::Conflict`]: a reference-number collision. Retried
//!   internally by [`crate::retry::with_conflict_retry`], surfaced only
//!   after the retry bound is exhausted.
//! - [`PostingError::Configuration`]: a tax code or payment type without a
//!   linked ledger account. Always fatal to the operation.
//! - [`PostingError::Internal`]: unexpected store failure. Rolled back and
//!   surfaced generically.

use thiserror::Error;

use core_kernel::{MoneyError, TemporalError};
use domain_documents::DocumentError;
use domain_ledger::LedgerError;

/// Errors produced by the posting services
#[derive(Debug, Error)]
pub enum PostingError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PostingError {
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::Conflict(detail.into())
    }

    pub fn configuration(detail: impl Into<String>) -> Self {
        Self::Configuration(detail.into())
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    /// Only conflicts are eligible for local retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, PostingError::Conflict(_))
    }
}

impl From<DocumentError> for PostingError {
    fn from(err: DocumentError) -> Self {
        PostingError::Validation(err.to_string())
    }
}

impl From<MoneyError> for PostingError {
    fn from(err: MoneyError) -> Self {
        PostingError::Validation(err.to_string())
    }
}

impl From<TemporalError> for PostingError {
    fn from(err: TemporalError) -> Self {
        PostingError::Validation(err.to_string())
    }
}

impl From<LedgerError> for PostingError {
    fn from(err: LedgerError) -> Self {
        // An unbalanced group is a defect in the posting code, not caller input
        PostingError::Internal(err.to_string())
    }
}
