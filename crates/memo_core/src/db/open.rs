//! Pool bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Build file or in-memory connection pools.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable pool.
//!
//! # Invariants
//! - Pooled connections have `foreign_keys=ON`, a busy timeout and the
//!   `casefold(text)` scalar function.
//! - Returned pools have migrations fully applied.
//! - In-memory pools hold exactly one connection, so every checkout sees the
//!   same database.

use super::migrations::apply_migrations;
use super::{DbPool, DbResult};
use log::{error, info};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Pool size used when callers have no preference.
pub const DEFAULT_POOL_SIZE: u32 = 10;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a pool over a SQLite database file and applies pending migrations.
///
/// Parent directories are not created; callers own the filesystem layout.
///
/// # Side effects
/// - Eagerly opens connections, so an unreachable database fails here.
/// - Emits `db_open` logging events with duration and status.
pub fn open_pool(path: impl AsRef<Path>, max_size: u32) -> DbResult<DbPool> {
    let manager = SqliteConnectionManager::file(path.as_ref());
    build_pool(manager, max_size.max(1), "file")
}

/// Opens a single-connection in-memory pool and applies migrations.
pub fn open_pool_in_memory() -> DbResult<DbPool> {
    build_pool(SqliteConnectionManager::memory(), 1, "memory")
}

fn build_pool(manager: SqliteConnectionManager, max_size: u32, mode: &str) -> DbResult<DbPool> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode} pool_size={max_size}");

    let manager = manager.with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        register_casefold(conn)
    });

    let mut builder = r2d2::Pool::builder().max_size(max_size);
    if mode == "memory" {
        // Recycling the only connection would discard the database.
        builder = builder.idle_timeout(None).max_lifetime(None);
    }

    let pool = match builder.build(manager) {
        Ok(pool) => pool,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_schema(&pool) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(pool)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_schema(pool: &DbPool) -> DbResult<()> {
    let mut conn = pool.get()?;
    apply_migrations(&mut conn)?;
    Ok(())
}

/// `casefold(text)` lowercases with full Unicode rules; SQLite's own `lower`
/// and `LIKE` fold ASCII only. `NULL` stays `NULL`.
fn register_casefold(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|text| text.to_lowercase()))
        },
    )
}
