use memo_core::db::migrations::latest_version;
use memo_core::db::{open_pool, open_pool_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_pool_in_memory_applies_all_migrations() {
    let pool = open_pool_in_memory().unwrap();
    let conn = pool.get().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "memos");
    assert_table_exists(&conn, "memo_tags");
}

#[test]
fn pooled_connections_enforce_foreign_keys() {
    let pool = open_pool_in_memory().unwrap();
    let conn = pool.get().unwrap();

    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let orphan = conn.execute(
        "INSERT INTO memo_tags (memo_id, position, tag) VALUES (42, 0, 'x');",
        [],
    );
    assert!(orphan.is_err());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memos.sqlite3");

    let first = open_pool(&path, 2).unwrap();
    assert_eq!(schema_version(&first.get().unwrap()), latest_version());
    drop(first);

    let second = open_pool(&path, 2).unwrap();
    let conn = second.get().unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "memos");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_pool(&path, 1).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
