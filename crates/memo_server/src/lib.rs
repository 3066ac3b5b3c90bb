//! HTTP server for the memo manager.

pub mod api;
pub mod config;

use actix_web::web;
use memo_core::{open_pool, DbError, MemoService, RepoError, SqliteMemoRepository};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use config::{Config, ConfigError};

/// Shared application state handed to every handler through `web::Data`.
pub struct AppState {
    pub memos: MemoService<SqliteMemoRepository>,
}

/// Failure while bringing up storage before the server binds.
#[derive(Debug)]
pub enum StartupError {
    Io(std::io::Error),
    Db(DbError),
    Repo(RepoError),
}

impl Display for StartupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to prepare database directory: {err}"),
            Self::Db(err) => write!(f, "failed to open database: {err}"),
            Self::Repo(err) => write!(f, "database is not usable: {err}"),
        }
    }
}

impl Error for StartupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StartupError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<DbError> for StartupError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for StartupError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl AppState {
    pub fn new(repo: SqliteMemoRepository) -> Self {
        Self {
            memos: MemoService::new(repo),
        }
    }

    /// Opens the configured database, creating its parent directory when missing.
    pub fn open(config: &Config) -> Result<Self, StartupError> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let pool = open_pool(&config.db_path, config.pool_size)?;
        Ok(Self::new(SqliteMemoRepository::try_new(pool)?))
    }
}

/// Registers extractor configuration and every route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(api::json_config())
        .app_data(api::query_config());
    api::health::config(cfg);
    api::memos::config(cfg);
}
