//! Schema Tests
//!
//! Verifies the embedded SQLite schema creates the table layout the Diesel
//! models expect, and that applying it twice is harmless.

use std::collections::BTreeMap;

use rusqlite::{Connection, Result as SqliteResult};

const SCHEMA: &str = include_str!("../src/repository/schema_sqlite.sql");

#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnInfo {
    col_type: String,
    not_null: bool,
    primary_key: bool,
}

fn extract_columns(conn: &Connection, table: &str) -> SqliteResult<BTreeMap<String, ColumnInfo>> {
    let mut pragma = conn.prepare(&format!("PRAGMA table_info(\"{}\")", table))?;
    let rows = pragma.query_map([], |row| {
        Ok((
            row.get::<_, String>(1)?,
            ColumnInfo {
                col_type: row.get::<_, String>(2)?.to_uppercase(),
                not_null: row.get(3)?,
                primary_key: row.get::<_, i32>(5)? > 0,
            },
        ))
    })?;
    rows.collect()
}

fn extract_index_names(conn: &Connection) -> SqliteResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='index' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt.query_map([], |row| row.get(0))?;
    names.collect()
}

fn column(col_type: &str, not_null: bool, primary_key: bool) -> ColumnInfo {
    ColumnInfo {
        col_type: col_type.to_string(),
        not_null,
        primary_key,
    }
}

#[test]
fn test_documents_table_layout() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();

    let columns = extract_columns(&conn, "documents").unwrap();
    let expected: BTreeMap<String, ColumnInfo> = [
        ("id", column("TEXT", true, true)),
        ("url", column("TEXT", true, false)),
        ("status", column("TEXT", true, false)),
        ("document_type", column("TEXT", false, false)),
        ("extracted_data", column("TEXT", false, false)),
        ("created_at", column("TEXT", true, false)),
        ("updated_at", column("TEXT", true, false)),
    ]
    .into_iter()
    .map(|(name, info)| (name.to_string(), info))
    .collect();

    assert_eq!(columns, expected);
}

#[test]
fn test_indexes_present() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();

    assert_eq!(
        extract_index_names(&conn).unwrap(),
        vec!["idx_documents_status", "idx_documents_updated_at"]
    );
}

#[test]
fn test_schema_is_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn.execute_batch(SCHEMA).unwrap();
}

#[test]
fn test_status_defaults_to_pending() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn.execute(
        "INSERT INTO documents (id, url, created_at, updated_at) VALUES ('a', 's3://b/a.png', 'now', 'now')",
        [],
    )
    .unwrap();

    let status: String = conn
        .query_row("SELECT status FROM documents WHERE id = 'a'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(status, "pending");
}
