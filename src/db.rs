use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const CURRENT_SCHEMA_VERSION: i64 = 1;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 1] = [Migration {
    version: 1,
    name: "document_collections_v1",
    sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, seq);
"#,
}];

pub fn open_connection(path: &str) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn configure_for_speed(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}

pub fn now_utc_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::UNIX_EPOCH.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRow {
    pub id: String,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}

pub fn insert_document(conn: &Connection, collection: &str, id: &str, body: &str) -> Result<()> {
    let now = now_utc_rfc3339();
    conn.execute(
        r#"
INSERT INTO documents (collection, id, body, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?4)
"#,
        params![collection, id, body, now],
    )?;
    Ok(())
}

/// Rows of a collection in insertion order, optionally restricted to
/// documents whose top-level `field` equals `value`.
pub fn list_documents(
    conn: &Connection,
    collection: &str,
    equals: Option<(&str, &str)>,
) -> Result<Vec<DocumentRow>> {
    let mut result = Vec::new();
    match equals {
        Some((field, value)) => {
            let mut stmt = conn.prepare(
                r#"
SELECT id, body, created_at, updated_at
FROM documents
WHERE collection = ?1 AND json_extract(body, ?2) = ?3
ORDER BY seq ASC
"#,
            )?;
            let path = json_path(field);
            let mut rows = stmt.query(params![collection, path, value])?;
            while let Some(row) = rows.next()? {
                result.push(DocumentRow {
                    id: row.get(0)?,
                    body: row.get(1)?,
                    created_at: row.get(2)?,
                    updated_at: row.get(3)?,
                });
            }
        }
        None => {
            let mut stmt = conn.prepare(
                r#"
SELECT id, body, created_at, updated_at
FROM documents
WHERE collection = ?1
ORDER BY seq ASC
"#,
            )?;
            let mut rows = stmt.query(params![collection])?;
            while let Some(row) = rows.next()? {
                result.push(DocumentRow {
                    id: row.get(0)?,
                    body: row.get(1)?,
                    created_at: row.get(2)?,
                    updated_at: row.get(3)?,
                });
            }
        }
    }
    Ok(result)
}

/// Merges `patch` into the stored body (RFC 7396: `null` removes a field).
/// Returns the number of documents touched.
pub fn merge_document(
    conn: &Connection,
    collection: &str,
    id: &str,
    patch: &str,
) -> Result<usize> {
    conn.execute(
        r#"
UPDATE documents
SET body = json_patch(body, ?3), updated_at = ?4
WHERE collection = ?1 AND id = ?2
"#,
        params![collection, id, patch, now_utc_rfc3339()],
    )
}

pub fn delete_document(conn: &Connection, collection: &str, id: &str) -> Result<usize> {
    conn.execute(
        "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
        params![collection, id],
    )
}

fn json_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', "\\\""))
}
