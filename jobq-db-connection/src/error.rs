use thiserror::Error;

/// Errors that can occur while configuring, creating or probing the database pool.
#[derive(Debug, Error)]
pub enum DbConnectionError {
    #[error("database url cannot be empty")]
    EmptyDatabaseUrl,
    #[error("invalid pool configuration: {0}")]
    InvalidPoolSize(String),
    #[error("file/directory creation error: {0}")]
    FileCreation(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
