//! Memo repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and search APIs over the `memos`/`memo_tags` tables.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate input before any SQL mutation.
//! - Every mutation runs in one transaction on one pooled connection; any
//!   error drops the transaction, which rolls it back.
//! - `updated_at` is refreshed on every update and never drops below
//!   `created_at`.
//! - Tag order is preserved through `memo_tags.position`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::{DbError, DbPool, PooledConnection};
use crate::model::memo::{
    now_millis, Memo, MemoId, MemoPatch, MemoValidationError, NewMemo, Patch, Priority,
};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MEMO_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    priority,
    created_at,
    updated_at
FROM memos";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for memo persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(MemoValidationError),
    Db(DbError),
    NotFound(MemoId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "memo not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted memo data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MemoValidationError> for RepoError {
    fn from(value: MemoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<r2d2::Error> for RepoError {
    fn from(value: r2d2::Error) -> Self {
        Self::Db(DbError::Pool(value))
    }
}

/// Optional, AND-combined search criteria. `None` disables a criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoQuery {
    /// Case-insensitive substring over title and content. Blank is ignored.
    pub search: Option<String>,
    pub priority: Option<Priority>,
    /// Exact, case-sensitive tag membership. Empty is ignored.
    pub tag: Option<String>,
}

/// Repository interface for memo operations.
pub trait MemoRepository {
    /// Inserts a memo and returns the stored record.
    fn create_memo(&self, input: &NewMemo) -> RepoResult<Memo>;
    fn get_memo(&self, id: MemoId) -> RepoResult<Option<Memo>>;
    /// Replaces the `Set` fields of `patch`. Returns `NotFound` for unknown ids.
    fn update_memo(&self, id: MemoId, patch: &MemoPatch) -> RepoResult<Memo>;
    /// Hard-deletes a memo. Returns whether a row was removed.
    fn delete_memo(&self, id: MemoId) -> RepoResult<bool>;
    /// Lists memos matching `query`, most recently updated first.
    fn search_memos(&self, query: &MemoQuery) -> RepoResult<Vec<Memo>>;
    /// Returns the distinct tags of all memos, sorted.
    fn list_tags(&self) -> RepoResult<Vec<String>>;
}

/// SQLite-backed memo repository over a connection pool.
#[derive(Clone)]
pub struct SqliteMemoRepository {
    pool: DbPool,
}

impl SqliteMemoRepository {
    /// Constructs a repository from a migrated pool.
    ///
    /// Fails when the schema does not expose the tables this repository uses.
    pub fn try_new(pool: DbPool) -> RepoResult<Self> {
        {
            let conn = pool.get()?;
            ensure_connection_ready(&conn)?;
        }
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn conn(&self) -> RepoResult<PooledConnection> {
        Ok(self.pool.get()?)
    }
}

impl MemoRepository for SqliteMemoRepository {
    fn create_memo(&self, input: &NewMemo) -> RepoResult<Memo> {
        input.validate()?;

        let now = now_millis();
        let priority = input.priority.unwrap_or_default();
        let tags = input.tags.clone().unwrap_or_default();

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO memos (title, content, priority, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4);",
            params![
                input.title.as_str(),
                input.content.as_str(),
                priority.as_str(),
                now.timestamp_millis(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        replace_tags(&tx, id, &tags)?;
        tx.commit()?;

        Ok(Memo {
            id,
            title: input.title.clone(),
            content: input.content.clone(),
            priority,
            tags,
            created_at: now,
            updated_at: now,
        })
    }

    fn get_memo(&self, id: MemoId) -> RepoResult<Option<Memo>> {
        let conn = self.conn()?;
        load_memo(&conn, id)
    }

    fn update_memo(&self, id: MemoId, patch: &MemoPatch) -> RepoResult<Memo> {
        patch.validate()?;

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(created_at) = tx
            .query_row(
                "SELECT created_at FROM memos WHERE id = ?1;",
                [id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
        else {
            return Err(RepoError::NotFound(id));
        };

        let updated_at = now_millis().timestamp_millis().max(created_at);
        let mut assignments = vec!["updated_at = ?"];
        let mut bind_values = vec![Value::Integer(updated_at)];

        if let Patch::Set(title) = &patch.title {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Patch::Set(content) = &patch.content {
            assignments.push("content = ?");
            bind_values.push(Value::Text(content.clone()));
        }
        if let Patch::Set(priority) = &patch.priority {
            assignments.push("priority = ?");
            bind_values.push(Value::Text(priority.as_str().to_string()));
        }
        bind_values.push(Value::Integer(id));

        tx.execute(
            &format!("UPDATE memos SET {} WHERE id = ?;", assignments.join(", ")),
            params_from_iter(bind_values),
        )?;

        if let Patch::Set(tags) = &patch.tags {
            replace_tags(&tx, id, tags)?;
        }

        let memo = load_memo(&tx, id)?.ok_or(RepoError::NotFound(id))?;
        tx.commit()?;
        Ok(memo)
    }

    fn delete_memo(&self, id: MemoId) -> RepoResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = tx.execute("DELETE FROM memos WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn search_memos(&self, query: &MemoQuery) -> RepoResult<Vec<Memo>> {
        let mut sql = format!("{MEMO_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(term) = query.search.as_deref().filter(|term| !term.trim().is_empty()) {
            // `casefold` is registered on every pooled connection.
            sql.push_str(" AND (instr(casefold(title), ?) > 0 OR instr(casefold(content), ?) > 0)");
            let folded = term.to_lowercase();
            bind_values.push(Value::Text(folded.clone()));
            bind_values.push(Value::Text(folded));
        }

        if let Some(priority) = query.priority {
            sql.push_str(" AND priority = ?");
            bind_values.push(Value::Text(priority.as_str().to_string()));
        }

        if let Some(tag) = query.tag.as_deref().filter(|tag| !tag.is_empty()) {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM memo_tags mt
                    WHERE mt.memo_id = memos.id
                      AND mt.tag = ?
                )",
            );
            bind_values.push(Value::Text(tag.to_string()));
        }

        sql.push_str(" ORDER BY updated_at DESC, id DESC;");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut memos = Vec::new();
        while let Some(row) = rows.next()? {
            memos.push(parse_memo_row(&conn, row)?);
        }

        Ok(memos)
    }

    fn list_tags(&self) -> RepoResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT tag FROM memo_tags ORDER BY tag ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(row.get("tag")?);
        }
        Ok(tags)
    }
}

fn load_memo(conn: &Connection, id: MemoId) -> RepoResult<Option<Memo>> {
    let mut stmt = conn.prepare(&format!("{MEMO_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_memo_row(conn, row)?));
    }
    Ok(None)
}

fn parse_memo_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Memo> {
    let id: MemoId = row.get("id")?;

    let priority_text: String = row.get("priority")?;
    let priority = Priority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_text}` in memos.priority"
        ))
    })?;

    let memo = Memo {
        id,
        title: row.get("title")?,
        content: row.get("content")?,
        priority,
        tags: load_tags(conn, id)?,
        created_at: parse_epoch_ms(row.get("created_at")?, "created_at")?,
        updated_at: parse_epoch_ms(row.get("updated_at")?, "updated_at")?,
    };
    memo.validate()
        .map_err(|err| RepoError::InvalidData(format!("memo {id}: {err}")))?;
    Ok(memo)
}

fn load_tags(conn: &Connection, memo_id: MemoId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT tag
         FROM memo_tags
         WHERE memo_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([memo_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}

fn replace_tags(conn: &Connection, memo_id: MemoId, tags: &[String]) -> RepoResult<()> {
    conn.execute("DELETE FROM memo_tags WHERE memo_id = ?1;", [memo_id])?;
    let mut stmt =
        conn.prepare("INSERT INTO memo_tags (memo_id, position, tag) VALUES (?1, ?2, ?3);")?;
    for (position, tag) in tags.iter().enumerate() {
        stmt.execute(params![memo_id, position as i64, tag.as_str()])?;
    }
    Ok(())
}

fn parse_epoch_ms(value: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid timestamp `{value}` in memos.{column}"))
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    for table in ["memos", "memo_tags"] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    for column in ["id", "title", "content", "priority", "created_at", "updated_at"] {
        if !table_has_column(conn, "memos", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "memos",
                column,
            });
        }
    }

    for column in ["memo_id", "position", "tag"] {
        if !table_has_column(conn, "memo_tags", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "memo_tags",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
