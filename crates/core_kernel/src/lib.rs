//! Core Kernel - shared types for the accounting backend
//!
//! This crate holds the vocabulary every other crate speaks: precise money
//! arithmetic, strongly-typed identifiers, financial periods, and the
//! explicit tenant/actor context that replaces ambient global state.
//!
//! Domain crates depend only on this kernel, never on each other's
//! internals, keeping the posting engine testable without a live store.

pub mod context;
pub mod error;
pub mod identifiers;
pub mod money;
pub mod temporal;

pub use context::{Actor, TenantContext};
pub use error::CoreError;
pub use identifiers::*;
pub use money::{reconciliation_tolerance, Currency, ExchangeRate, Money, MoneyError};
pub use temporal::{DateRange, FinancialPeriod, TemporalError};
