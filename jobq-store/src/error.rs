//! Error types for job submission and persistence.

use jobq_db_connection::DbConnectionError;
use thiserror::Error;

/// Rejections raised before a job ever reaches a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobValidationError {
    #[error("Missing required fields")]
    MissingRequiredFields,

    #[error("job_priority must be an integer")]
    InvalidPriority,
}

/// Errors that may occur while talking to the job store.
#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error("job store is unavailable")]
    Unavailable,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Connection(#[from] DbConnectionError),

    #[error("failed to apply migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("store returned an invalid job identifier: {0}")]
    InvalidIdentifier(String),

    #[error("store returned an unknown job status: {0}")]
    InvalidStatus(String),
}
