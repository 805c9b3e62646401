//! Document domain errors

use thiserror::Error;

use crate::status::DocumentStatus;
use core_kernel::MoneyError;

/// Errors raised by document construction and state transitions
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Transition from {from:?} to {to:?} is not allowed")]
    InvalidTransition {
        from: DocumentStatus,
        to: DocumentStatus,
    },

    #[error("A non-empty reason is required to {0} a document")]
    ReasonRequired(&'static str),

    #[error("Only draft documents may have their lines replaced (status is {0:?})")]
    EditForbidden(DocumentStatus),

    #[error("A document requires at least one line")]
    EmptyLines,

    #[error("Invalid line: {0}")]
    InvalidLine(String),

    #[error("Due date {due} precedes document date {doc}")]
    DueBeforeDocumentDate { due: String, doc: String },

    #[error("Document with payments recorded cannot be cancelled; reverse payments first")]
    CancelPaid,

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}
