//! Database error types
//!
//! Maps low-level SQLx failures onto the handful of cases the posting
//! services care about. The important one is the unique-constraint
//! violation: it becomes [`domain_posting::PostingError::Conflict`], which
//! is the signal the sequence retry loop keys on.

use thiserror::Error;

use domain_posting::PostingError;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Transaction error
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// A stored value could not be mapped back into a domain type
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DatabaseError::DuplicateEntry(_))
    }
}

/// Maps SQLx errors onto DatabaseError variants using the PostgreSQL
/// error code where one is available.
/// https://www.postgresql.org/docs/current/errcodes-appendix.html
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => DatabaseError::DuplicateEntry(db_err.message().to_string()),
                Some("23503") => DatabaseError::ForeignKeyViolation(db_err.message().to_string()),
                Some("23514") => DatabaseError::ConstraintViolation(db_err.message().to_string()),
                _ => DatabaseError::QueryFailed(db_err.message().to_string()),
            },
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<DatabaseError> for PostingError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::DuplicateEntry(detail) => PostingError::conflict(detail),
            other => PostingError::internal(other.to_string()),
        }
    }
}
