//! Database Query collaborator errors

use thiserror::Error;

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Failures reported by a [`DatabaseQuery`](super::DatabaseQuery)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    /// The backend rejected or failed the statement
    #[error("statement failed: {0}")]
    Execution(String),

    /// Row delivery stopped before the result set was complete
    #[error("row delivery interrupted after {rows_delivered} rows: {reason}")]
    Interrupted { rows_delivered: usize, reason: String },

    /// The caller cancelled at this boundary
    #[error("query cancelled")]
    Cancelled,
}
