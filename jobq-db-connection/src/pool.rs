use std::str::FromStr;

#[cfg(feature = "postgres")]
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
#[cfg(feature = "sqlite")]
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::config::DbConnectionConfig;
use crate::error::DbConnectionError;
use crate::utils::sanitize_database_url;

#[cfg(not(any(feature = "postgres", feature = "sqlite")))]
compile_error!("Enable exactly one of the `postgres` or `sqlite` features for jobq-db-connection.");

#[cfg(all(feature = "postgres", feature = "sqlite"))]
compile_error!(
    "Activate only one backend feature (`postgres` or `sqlite`) for jobq-db-connection."
);

#[cfg(feature = "postgres")]
pub type DbPool = PgPool;
#[cfg(feature = "sqlite")]
pub type DbPool = SqlitePool;

#[cfg(feature = "postgres")]
type DbPoolOptions = PgPoolOptions;
#[cfg(feature = "sqlite")]
type DbPoolOptions = SqlitePoolOptions;

#[cfg(feature = "postgres")]
type DbConnectOptions = PgConnectOptions;
#[cfg(feature = "sqlite")]
type DbConnectOptions = SqliteConnectOptions;

/// Creates a pool and opens its first connection(s) immediately.
pub async fn create_pool(config: &DbConnectionConfig) -> Result<DbPool, DbConnectionError> {
    let options = prepare(config)?;
    let db_url = sanitize_database_url(config.url.trim());
    tracing::debug!(
        %db_url,
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        connect_timeout_secs = config.connect_timeout_secs,
        "creating database pool"
    );

    match pool_options(config).connect_with(options).await {
        Ok(pool) => {
            tracing::info!(%db_url, "database pool created");
            Ok(pool)
        }
        Err(err) => {
            tracing::error!(%db_url, error = %err, "failed to create database pool");
            Err(err.into())
        }
    }
}

/// Creates a pool without touching the database; connections open on first use.
///
/// Only the URL is validated here. Pair with [`verify_connection`] to find out
/// whether the database is actually reachable.
pub fn create_lazy_pool(config: &DbConnectionConfig) -> Result<DbPool, DbConnectionError> {
    let options = prepare(config)?;
    tracing::debug!(
        db_url = %sanitize_database_url(config.url.trim()),
        max_connections = config.max_connections,
        "creating lazy database pool"
    );
    Ok(pool_options(config).connect_lazy_with(options))
}

/// Round-trips a trivial query through the pool.
pub async fn verify_connection(pool: &DbPool) -> Result<(), DbConnectionError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

fn prepare(config: &DbConnectionConfig) -> Result<DbConnectOptions, DbConnectionError> {
    let url = config.url.trim();
    if url.is_empty() {
        return Err(DbConnectionError::EmptyDatabaseUrl);
    }
    if config.max_connections == 0 {
        return Err(DbConnectionError::InvalidPoolSize(
            "max_connections must be greater than 0".to_owned(),
        ));
    }
    if config.min_connections > config.max_connections {
        return Err(DbConnectionError::InvalidPoolSize(
            "min_connections must not exceed max_connections".to_owned(),
        ));
    }
    connect_options(url)
}

#[cfg(feature = "postgres")]
fn connect_options(url: &str) -> Result<DbConnectOptions, DbConnectionError> {
    Ok(PgConnectOptions::from_str(url)?)
}

/// SQLite opens the file itself once `create_if_missing` is set, but not a
/// missing parent directory.
#[cfg(feature = "sqlite")]
fn connect_options(url: &str) -> Result<DbConnectOptions, DbConnectionError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

    let db_path = options.get_filename();
    if let Some(dir) = db_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty() && !dir.exists())
    {
        std::fs::create_dir_all(dir).map_err(|e| {
            DbConnectionError::FileCreation(format!(
                "cannot create directory for {}: {e}",
                db_path.display()
            ))
        })?;
    }
    Ok(options)
}

fn pool_options(config: &DbConnectionConfig) -> DbPoolOptions {
    let opts = DbPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout())
        .idle_timeout(config.idle_timeout());

    #[cfg(feature = "postgres")]
    let opts = opts.test_before_acquire(config.test_before_acquire);

    opts
}
