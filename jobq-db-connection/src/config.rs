use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
const DEFAULT_TEST_BEFORE_ACQUIRE: bool = true;

/// Basic configuration for creating a SQLx connection pool.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConnectionConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Upper bound on waiting for a pooled connection. Inserts inherit it.
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: Option<u64>,
    pub test_before_acquire: bool,
}

impl Default for DbConnectionConfig {
    #[inline]
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            idle_timeout_secs: Some(DEFAULT_IDLE_TIMEOUT_SECS),
            test_before_acquire: DEFAULT_TEST_BEFORE_ACQUIRE,
        }
    }
}

impl DbConnectionConfig {
    /// Creates a new configuration with the provided URL and sane defaults.
    #[inline]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn with_pool_size(mut self, min_connections: u32, max_connections: u32) -> Self {
        self.min_connections = min_connections;
        self.max_connections = max_connections;
        self
    }

    #[inline]
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Disable idle reaping. In-memory SQLite databases vanish with their last connection.
    #[inline]
    pub fn without_idle_timeout(mut self) -> Self {
        self.idle_timeout_secs = None;
        self
    }

    #[inline]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[inline]
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }
}
