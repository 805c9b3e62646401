//! Documents Domain - Sales Documents and Their State Machine
//!
//! A `Document` (invoice-like) owns its lines completely: lines are created
//! and replaced together with the document and have no independent
//! lifecycle. The monetary set {subtotal, discount, tax, withholding, total,
//! paid, balance} is always re-derived from the lines, never trusted from a
//! cached header.
//!
//! # Status model
//!
//! Stored statuses: draft, sent, approved, rejected, cancelled, paid,
//! partial. `Overdue` is never stored - it is re-derived lazily whenever the
//! document is read (a document past its due date that is not paid or
//! cancelled presents as overdue). Transition guards operate on the stored
//! status.

pub mod document;
pub mod error;
pub mod line;
pub mod status;

pub use document::Document;
pub use error::DocumentError;
pub use line::{DocumentLine, NewLine};
pub use status::{DocumentStatus, PaymentStatus};
