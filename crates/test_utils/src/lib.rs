//! Test Utilities Crate
//!
//! Shared test infrastructure for the posting engine test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for common entities
//! - `builders`: Builder patterns for test data construction
//! - `memory`: In-memory `PostingStore` with conflict injection
//! - `assertions`: Custom assertion helpers for domain types

pub mod assertions;
pub mod builders;
pub mod fixtures;
pub mod memory;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
pub use memory::*;
