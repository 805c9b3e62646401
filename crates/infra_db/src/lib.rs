//! Database Infrastructure Crate
//!
//! PostgreSQL-backed implementation of the posting store. All mutation runs
//! inside a single database transaction per unit of work; the document row
//! is locked with `SELECT ... FOR UPDATE` to serialize concurrent
//! approval/payment/cancel attempts.
//!
//! Queries are built at runtime (no compile-time verification) so the
//! workspace builds without a reachable database.

pub mod error;
pub mod pool;
pub mod store;

pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use store::PgPostingStore;
