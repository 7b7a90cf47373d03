//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Directory holding the CSV tables
    pub data_dir: PathBuf,
    pub inventory_file: String,
    pub supplier_file: String,

    /// Login accepted by the session gate
    pub admin_username: String,
    pub admin_password: String,
    /// Session lifetime in seconds
    pub session_ttl_secs: u64,
    /// Login attempts allowed per second
    pub login_rate_limit: u32,

    pub request_timeout_secs: u64,
    /// Dashboard flags products at or below this quantity
    pub low_stock_threshold: u32,
    /// Allowed client origins for CORS, comma-separated
    pub client_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_level: "info".to_string(),
            data_dir: PathBuf::from("."),
            inventory_file: "inventory.csv".to_string(),
            supplier_file: "suppliers.csv".to_string(),
            admin_username: "admin".to_string(),
            admin_password: "1234".to_string(),
            session_ttl_secs: 8 * 60 * 60,
            login_rate_limit: 5,
            request_timeout_secs: 10,
            low_stock_threshold: 5,
            client_origin: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, defaulting anything unset
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        // PORT wins over SERVER_ADDR, as on most hosting platforms
        let server_addr = match env::var("PORT") {
            Ok(port) => format!("0.0.0.0:{}", port)
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            Err(_) => match env::var("SERVER_ADDR") {
                Ok(addr) => addr.parse().map_err(|_| ConfigError::InvalidAddress)?,
                Err(_) => defaults.server_addr,
            },
        };

        Ok(Self {
            server_addr,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),

            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            inventory_file: env::var("INVENTORY_FILE").unwrap_or(defaults.inventory_file),
            supplier_file: env::var("SUPPLIER_FILE").unwrap_or(defaults.supplier_file),

            admin_username: env::var("ADMIN_USERNAME").unwrap_or(defaults.admin_username),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            session_ttl_secs: parse_var("SESSION_TTL_SECS", defaults.session_ttl_secs)?,
            login_rate_limit: parse_var("LOGIN_RATE_LIMIT", defaults.login_rate_limit)?,

            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            low_stock_threshold: parse_var("LOW_STOCK_THRESHOLD", defaults.low_stock_threshold)?,
            client_origin: env::var("CLIENT_ORIGIN").unwrap_or(defaults.client_origin),
        })
    }

    /// Config rooted at a data directory, everything else default
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
