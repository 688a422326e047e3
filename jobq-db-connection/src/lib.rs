pub mod config;
pub mod error;
pub mod pool;
#[cfg(test)]
mod test;
pub mod utils;

pub use config::DbConnectionConfig;
pub use error::DbConnectionError;
pub use pool::{create_lazy_pool, create_pool, verify_connection, DbPool};
pub use utils::sanitize_database_url;
