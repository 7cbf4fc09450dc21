//! Database connection management
//!
//! Per-connection setup run by the pool on every new connection, plus
//! catalog helpers.

use std::time::Duration;

use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Configure a freshly opened connection with the settings every engine relies on
///
/// `wal` is set for file-backed stores; in-memory stores have no journal file.
pub fn configure(conn: &mut Connection, wal: bool) -> rusqlite::Result<()> {
    // Enforce declared foreign keys
    conn.pragma_update(None, "foreign_keys", true)?;

    conn.busy_timeout(BUSY_TIMEOUT)?;

    // WAL lets pooled readers proceed while a session writes
    if wal {
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
    }

    Ok(())
}

/// Names of user tables in the connected store, sorted
pub fn table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )
        .map_err(from_rusqlite)?;
    let names = stmt
        .query_map([], |row| row.get(0))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<String>, _>>()
        .map_err(from_rusqlite)?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn memory() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        configure(&mut conn, false).unwrap();
        conn
    }

    #[test]
    fn test_memory_connection_enables_foreign_keys() {
        let conn = memory();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_file_connection_uses_wal() {
        let dir = TempDir::new().unwrap();
        let mut conn = Connection::open(dir.path().join("wal.db")).unwrap();
        configure(&mut conn, true).unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_table_names_skips_internal_tables() {
        let conn = memory();
        conn.execute_batch(
            "CREATE TABLE b (id INTEGER PRIMARY KEY AUTOINCREMENT);
             CREATE TABLE a (id INTEGER PRIMARY KEY);",
        )
        .unwrap();
        assert_eq!(table_names(&conn).unwrap(), vec!["a", "b"]);
    }
}
