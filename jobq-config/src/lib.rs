use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Pre-compiled regex for hostname validation (compiled once at first use)
static HOSTNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][-a-zA-Z0-9\.]*[a-zA-Z0-9]$").unwrap());

/// Used for postgres URLs when host or port is left unset.
pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 5432;

#[derive(Debug, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub logging: Option<LoggingSection>,
    #[serde(default)]
    pub database: Option<DatabaseSection>,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSection {
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub ssl_mode: Option<String>,
    #[serde(default)]
    pub max_connections: Option<u32>,
    #[serde(default)]
    pub min_connections: Option<u32>,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub require_on_startup: Option<bool>,
    #[serde(default)]
    pub run_migrations: Option<bool>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Load a RawConfigFile from a path. The format is inferred from the extension: .toml, .yaml/.yml, .json
pub fn load_raw_from_file<P: AsRef<Path>>(path: P) -> Result<RawConfigFile, ConfigError> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    parse_config_str(&s, ext.as_deref())
}

#[inline]
fn parse_config_str(s: &str, ext: Option<&str>) -> Result<RawConfigFile, ConfigError> {
    match ext {
        #[cfg(feature = "toml")]
        Some("toml") => toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        #[cfg(feature = "yaml")]
        Some("yaml" | "yml") => {
            serde_yaml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
        }
        #[cfg(feature = "json")]
        Some("json") => serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        _ => parse_config_auto(s),
    }
}

/// Try to parse config by attempting each enabled format
#[inline]
fn parse_config_auto(s: &str) -> Result<RawConfigFile, ConfigError> {
    #[cfg(feature = "toml")]
    if let Ok(cfg) = toml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "json")]
    if let Ok(cfg) = serde_json::from_str(s) {
        return Ok(cfg);
    }

    // YAML last: almost any text is a valid YAML scalar.
    #[cfg(feature = "yaml")]
    if let Ok(cfg) = serde_yaml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(any(feature = "yaml", feature = "toml", feature = "json"))]
    {
        Err(ConfigError::Parse(
            "failed to parse config as any supported format".into(),
        ))
    }

    #[cfg(not(any(feature = "yaml", feature = "toml", feature = "json")))]
    {
        let _ = s;
        Err(ConfigError::Parse("no config format enabled".into()))
    }
}

/// Concrete application configuration with defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub driver: String,
    /// Full connection URL. When set it wins over the individual parts below.
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl_mode: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    /// Refuse to start when the store cannot be reached at boot.
    pub require_on_startup: bool,
    pub run_migrations: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
            database: DatabaseConfig {
                driver: "sqlite".to_string(),
                url: None,
                host: None,
                port: None,
                database: Some("jobs".to_string()),
                username: None,
                password: None,
                ssl_mode: None,
                max_connections: 10,
                min_connections: 1,
                connect_timeout_secs: 30,
                require_on_startup: false,
                run_migrations: true,
            },
        }
    }
}

impl DatabaseConfig {
    /// Resolve the URL handed to the connection pool.
    ///
    /// An explicit `url` is returned as-is. For sqlite the database name becomes
    /// a file next to the working directory. Otherwise a URL is assembled from
    /// host, port, database name and credentials, percent-encoding the
    /// credentials so passwords with reserved characters survive.
    pub fn connection_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            return Ok(url.to_owned());
        }
        if self.driver == "sqlite" {
            let name = non_empty(self.database.as_deref()).ok_or_else(|| {
                ConfigError::Validation(
                    "database.url or database.database must be set for the sqlite driver"
                        .to_string(),
                )
            })?;
            return Ok(format!("sqlite://{name}.sqlite"));
        }

        let host = non_empty(self.host.as_deref()).unwrap_or(DEFAULT_DB_HOST);
        let mut url = url::Url::parse(&format!("{}://{}", self.driver, host))
            .map_err(|e| ConfigError::Validation(format!("invalid database.host {host}: {e}")))?;

        if url.set_port(Some(self.port.unwrap_or(DEFAULT_DB_PORT))).is_err() {
            return Err(ConfigError::Validation("invalid database.port".to_string()));
        }
        if let Some(username) = non_empty(self.username.as_deref()) {
            if url.set_username(username).is_err() {
                return Err(ConfigError::Validation("invalid database.username".to_string()));
            }
            if url.set_password(non_empty(self.password.as_deref())).is_err() {
                return Err(ConfigError::Validation("invalid database.password".to_string()));
            }
        }
        if let Some(database) = non_empty(self.database.as_deref()) {
            url.set_path(&format!("/{database}"));
        }
        if let Some(ssl_mode) = non_empty(self.ssl_mode.as_deref()) {
            url.query_pairs_mut().append_pair("sslmode", ssl_mode);
        }

        Ok(url.to_string())
    }
}

#[inline]
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[inline]
fn parse_bool(s: &str) -> Result<bool, ()> {
    let bytes = s.as_bytes();
    match bytes {
        b"1" | b"true" | b"TRUE" | b"True" | b"yes" | b"YES" | b"Yes" | b"y" | b"Y" => Ok(true),
        b"0" | b"false" | b"FALSE" | b"False" | b"no" | b"NO" | b"No" | b"n" | b"N" => Ok(false),
        _ => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "on" => Ok(true),
            "false" | "no" | "n" | "off" => Ok(false),
            _ => Err(()),
        },
    }
}

/// Helper macro to apply optional value if present
macro_rules! apply_opt {
    ($target:expr, $source:expr) => {
        if let Some(v) = $source {
            $target = v;
        }
    };
}

/// Helper macro to apply option field directly if it has a value
macro_rules! apply_opt_field {
    ($target:expr, $source:expr) => {
        if $source.is_some() {
            $target = $source;
        }
    };
}

/// Load concrete `Config` from optional file and environment variables.
/// Environment variables take precedence over file values and defaults.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config, ConfigError> {
    let mut cfg = Config::default();

    if let Some(p) = path {
        apply_file(&mut cfg, load_raw_from_file(p)?);
    }

    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

fn apply_file(cfg: &mut Config, raw: RawConfigFile) {
    if let Some(server) = raw.server {
        apply_opt!(cfg.server.host, server.host);
        apply_opt!(cfg.server.port, server.port);
    }
    if let Some(logging) = raw.logging {
        apply_opt!(cfg.logging.level, logging.level);
        apply_opt!(cfg.logging.json, logging.json);
    }
    if let Some(db) = raw.database {
        apply_opt!(cfg.database.driver, db.driver);
        apply_opt_field!(cfg.database.url, db.url);
        apply_opt_field!(cfg.database.host, db.host);
        apply_opt_field!(cfg.database.port, db.port);
        apply_opt_field!(cfg.database.database, db.database);
        apply_opt_field!(cfg.database.username, db.username);
        apply_opt_field!(cfg.database.password, db.password);
        apply_opt_field!(cfg.database.ssl_mode, db.ssl_mode);
        apply_opt!(cfg.database.max_connections, db.max_connections);
        apply_opt!(cfg.database.min_connections, db.min_connections);
        apply_opt!(cfg.database.connect_timeout_secs, db.connect_timeout_secs);
        apply_opt!(cfg.database.require_on_startup, db.require_on_startup);
        apply_opt!(cfg.database.run_migrations, db.run_migrations);
    }
}

/// Helper to parse env var as a specific type
#[inline]
fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env_str(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Parse(format!("invalid {}: {}", key, e))),
        None => Ok(None),
    }
}

#[inline]
fn env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env_str(key) {
        Some(v) => parse_bool(v.trim())
            .map(Some)
            .map_err(|_| ConfigError::Parse(format!("invalid {}", key))),
        None => Ok(None),
    }
}

/// Unset and empty variables are both treated as absent.
#[inline]
fn env_str(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

/// Apply all environment variable overrides to config
fn apply_env_overrides(cfg: &mut Config) -> Result<(), ConfigError> {
    // Server
    if let Some(v) = env_str("JOBQ_SERVER_HOST") {
        cfg.server.host = v;
    }
    if let Some(v) = env_parse::<u16>("JOBQ_SERVER_PORT")? {
        cfg.server.port = v;
    }

    // Logging
    if let Some(v) = env_str("JOBQ_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = env_bool("JOBQ_LOG_JSON")? {
        cfg.logging.json = v;
    }

    // Plain connection variables, as used by existing deployments
    if let Some(v) = env_str("DB_USER") {
        cfg.database.username = Some(v);
    }
    if let Some(v) = env_str("DB_HOST") {
        cfg.database.host = Some(v);
    }
    if let Some(v) = env_str("DB_DATABASE") {
        cfg.database.database = Some(v);
    }
    if let Some(v) = env_str("DB_PASSWORD") {
        cfg.database.password = Some(v);
    }
    if let Some(v) = env_parse::<u16>("DB_PORT")? {
        cfg.database.port = Some(v);
    }

    // Database
    if let Some(v) = env_str("JOBQ_DATABASE_DRIVER") {
        cfg.database.driver = v;
    }
    if let Some(v) = env_str("JOBQ_DATABASE_URL") {
        cfg.database.url = Some(v);
    }
    if let Some(v) = env_str("JOBQ_DATABASE_SSL_MODE") {
        cfg.database.ssl_mode = Some(v);
    }
    if let Some(v) = env_parse::<u32>("JOBQ_DB_MAX_CONNECTIONS")? {
        cfg.database.max_connections = v;
    }
    if let Some(v) = env_parse::<u32>("JOBQ_DB_MIN_CONNECTIONS")? {
        cfg.database.min_connections = v;
    }
    if let Some(v) = env_parse::<u64>("JOBQ_DB_CONNECT_TIMEOUT_SECS")? {
        cfg.database.connect_timeout_secs = v;
    }
    if let Some(v) = env_bool("JOBQ_DB_REQUIRE_ON_STARTUP")? {
        cfg.database.require_on_startup = v;
    }
    if let Some(v) = env_bool("JOBQ_DB_RUN_MIGRATIONS")? {
        cfg.database.run_migrations = v;
    }

    Ok(())
}

/// Validate higher-level constraints on the resolved configuration.
pub fn validate_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.server.port == 0 {
        return Err(ConfigError::Validation("server.port must be > 0".into()));
    }
    let host_ok = cfg.server.host.parse::<std::net::IpAddr>().is_ok()
        || HOSTNAME_REGEX.is_match(&cfg.server.host);
    if !host_ok {
        return Err(ConfigError::Validation(format!(
            "invalid server.host: {}",
            cfg.server.host
        )));
    }

    match cfg.database.driver.as_str() {
        "sqlite" | "postgres" => {}
        other => {
            return Err(ConfigError::Validation(format!(
                "unsupported database driver: {}",
                other
            )))
        }
    }

    if cfg.database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be > 0".into(),
        ));
    }
    if cfg.database.min_connections > cfg.database.max_connections {
        return Err(ConfigError::Validation(
            "database.min_connections must not exceed database.max_connections".into(),
        ));
    }

    if cfg.database.driver == "sqlite" {
        let db = &cfg.database;
        let server_settings = [
            ("host", db.host.is_some()),
            ("port", db.port.is_some()),
            ("username", db.username.is_some()),
            ("password", db.password.is_some()),
            ("ssl_mode", db.ssl_mode.is_some()),
        ];
        let stray: Vec<&str> = server_settings
            .iter()
            .filter(|(_, set)| *set)
            .map(|(name, _)| *name)
            .collect();
        if !stray.is_empty() {
            return Err(ConfigError::Validation(format!(
                "database {} only apply to the postgres driver (DB_HOST, DB_PORT, DB_USER and \
                 DB_PASSWORD included); set JOBQ_DATABASE_DRIVER=postgres or unset them",
                stray.join(", ")
            )));
        }
    }

    let has_url = non_empty(cfg.database.url.as_deref()).is_some();
    if !has_url {
        if non_empty(cfg.database.database.as_deref()).is_none() {
            return Err(ConfigError::Validation(
                "database.database must be set when database.url is not".to_string(),
            ));
        }
    }

    Ok(())
}
