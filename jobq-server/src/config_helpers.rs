use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use anyhow::{bail, Context};
use jobq_db_connection::DbConnectionConfig;

/// Driver name of the backend compiled into this binary.
#[cfg(feature = "postgres")]
pub const COMPILED_DRIVER: &str = "postgres";
#[cfg(feature = "sqlite")]
pub const COMPILED_DRIVER: &str = "sqlite";

/// Build database connection config from application config.
pub fn database_config_from_config(cfg: &jobq_config::Config) -> anyhow::Result<DbConnectionConfig> {
    let db = &cfg.database;
    if db.driver != COMPILED_DRIVER {
        bail!(
            "database.driver is {:?} but this binary was built for {COMPILED_DRIVER:?}",
            db.driver
        );
    }
    let url = db
        .connection_url()
        .context("failed to resolve database connection url")?;

    Ok(DbConnectionConfig::new(url)
        .with_pool_size(db.min_connections, db.max_connections)
        .with_connect_timeout_secs(db.connect_timeout_secs))
}

/// Parse host:port into a SocketAddr, with fallback to 0.0.0.0.
pub fn parse_bind_address(host: &str, port: u16) -> SocketAddr {
    host.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, port))
        .or_else(|_| host.parse::<SocketAddr>())
        .or_else(|_| {
            host.trim_matches(|c| c == '[' || c == ']')
                .parse::<Ipv6Addr>()
                .map(|ip| SocketAddr::new(IpAddr::V6(ip), port))
        })
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], port)))
}
