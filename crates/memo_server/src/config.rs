//! Environment-driven server configuration.
//!
//! Every key is optional; empty values count as unset.

use memo_core::db::DEFAULT_POOL_SIZE;
use memo_core::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_PATH: &str = "./.db/memos.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub pool_size: u32,
    pub log_level: String,
    /// Absolute directory for rolling log files; stderr when unset.
    pub log_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a key to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match get("MEMO_PORT") {
            Some(value) => parse_number("MEMO_PORT", &value)?,
            None => DEFAULT_PORT,
        };
        let pool_size = match get("MEMO_DB_POOL_SIZE") {
            Some(value) => {
                let size: u32 = parse_number("MEMO_DB_POOL_SIZE", &value)?;
                if size == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "MEMO_DB_POOL_SIZE",
                        value,
                        reason: "must be at least 1".to_string(),
                    });
                }
                size
            }
            None => DEFAULT_POOL_SIZE,
        };

        Ok(Self {
            host: get("MEMO_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            db_path: PathBuf::from(get("MEMO_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string())),
            pool_size,
            log_level: get("MEMO_LOG_LEVEL").unwrap_or_else(|| default_log_level().to_string()),
            log_dir: get("MEMO_LOG_DIR"),
        })
    }
}

fn parse_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|err: T::Err| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: err.to_string(),
        })
}
