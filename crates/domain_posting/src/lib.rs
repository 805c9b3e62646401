//! Posting Domain - Sequencing, Approval, and Payment Distribution
//!
//! This crate is the engine that turns document lifecycle events into
//! balanced ledger activity:
//!
//! - [`sequence`] issues gapless per-tenant reference numbers, with the
//!   read-then-insert race resolved by [`retry`]'s bounded conflict retry.
//! - [`issuance`] creates documents under that retry discipline.
//! - [`approval`] validates stock, posts the revenue group, and flips a
//!   document to approved inside one unit of work.
//! - [`payment`] splits a payment across funding sources, posts the
//!   settlement group, and writes the receipt.
//!
//! Everything runs against the [`ports::PostingStore`] abstraction so the
//! services are testable without a live database.

pub mod accounts;
pub mod approval;
pub mod error;
pub mod issuance;
pub mod outcome;
pub mod payment;
pub mod ports;
pub mod receipt;
pub mod retry;
pub mod sequence;
pub mod stock;
pub mod transitions;

pub use accounts::{AccountLinks, LoyaltyProgram, PaymentType, TaxCode};
pub use approval::ApprovalOrchestrator;
pub use error::PostingError;
pub use issuance::{DocumentIssuer, NewDocumentRequest};
pub use outcome::PostingOutcome;
pub use payment::{
    CashFunding, FundingSplit, LineAllocation, PaymentDistributor, PaymentRecorded, PaymentRequest,
};
pub use ports::{PostingStore, PostingTx};
pub use receipt::{Receipt, ReceiptLine};
pub use retry::{with_conflict_retry, RetryPolicy};
pub use sequence::{next_reference, parse_suffix, SequenceKind};
pub use stock::StockMovement;
pub use transitions::DocumentTransitions;
