//! Error types for the rollup and retention job

use thiserror::Error;

use crate::database::DatabaseError;

/// Errors that abort a rollup run
///
/// An empty raw table, a short history for moving averages and an existing
/// summary for a recomputed day are normal outcomes, not errors.
#[derive(Debug, Error)]
pub enum RollupError {
    /// The database could not be reached (pool exhausted, connection refused)
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(DatabaseError),

    /// A query, constraint or migration failed on a reachable database
    #[error("Storage error: {0}")]
    Storage(DatabaseError),

    /// Another run holds the in-process run lock
    #[error("A rollup run is already in progress")]
    AlreadyRunning,

    /// Retention window must be zero or more days
    #[error("Invalid retention window: {0} days")]
    InvalidRetention(i64),

    /// The blocking worker running the job panicked or was cancelled
    #[error("Rollup task failed: {0}")]
    Task(String),
}

impl RollupError {
    /// Whether the next scheduled tick is expected to succeed without intervention
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RollupError::StorageUnavailable(_) | RollupError::AlreadyRunning | RollupError::Task(_)
        )
    }
}

impl From<DatabaseError> for RollupError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionPoolError(_) | DatabaseError::ConnectionFailed(_) => {
                RollupError::StorageUnavailable(err)
            }
            _ => RollupError::Storage(err),
        }
    }
}
