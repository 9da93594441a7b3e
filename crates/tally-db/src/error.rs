//! Database error types for tally-db.

use thiserror::Error;

/// Errors from store operations.
///
/// This is the store-native error shape. Callers that need to branch on
/// conflicts run it through [`crate::conflict::classify`] instead of
/// matching on it directly.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// The compare-and-swap update found a different version than expected.
    #[error("Version mismatch on {id}: expected {expected}, found {actual}")]
    VersionMismatch {
        id: String,
        expected: i64,
        actual: i64,
    },

    /// A constraint rejected the write (message in `SQLite` format).
    #[error("Constraint violated: {0}")]
    Constraint(String),

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Whether retrying the same call could succeed: connection and I/O
    /// failures, not missing rows, version mismatches, or constraint hits.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Query(msg) => !msg.contains("constraint failed"),
            Self::LibSql(e) => !e.to_string().contains("constraint failed"),
            Self::Other(_) => true,
            Self::Migration(_)
            | Self::NoResult
            | Self::VersionMismatch { .. }
            | Self::Constraint(_)
            | Self::InvalidState(_) => false,
        }
    }
}
