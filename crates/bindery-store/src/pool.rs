//! Connection pools
//!
//! Every engine owns an `r2d2` pool of SQLite connections, configured by
//! `db::configure` as they are opened. File-backed stores open connections
//! on demand, up to `PoolConfig::size`. An in-memory store exists only as
//! long as its connection, so it gets exactly one, opened up front and never
//! retired; checkouts take turns on it.

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use bindery_core::PoolConfig;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::db;
use crate::errors::{label, pool_timeout, Result};
use crate::url::DatabaseUrl;

pub type ConnectionPool = r2d2::Pool<SqliteConnectionManager>;

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub open: usize,
    pub idle: usize,
    pub max_size: usize,
}

/// Connection pool for one bind
#[derive(Clone)]
pub struct Pool {
    inner: ConnectionPool,
    url: DatabaseUrl,
    bind: Option<String>,
    timeout: Duration,
}

impl Pool {
    pub fn new(url: DatabaseUrl, bind: Option<&str>, config: &PoolConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.timeout_ms.max(1));
        let builder = r2d2::Pool::builder().connection_timeout(timeout);

        let inner = match &url {
            DatabaseUrl::Memory => builder
                .max_size(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .build(with_setup(SqliteConnectionManager::memory(), bind, false)),
            DatabaseUrl::File(path) => builder
                .max_size(u32::try_from(config.size.max(1)).unwrap_or(u32::MAX))
                .min_idle(Some(0))
                .build(with_setup(SqliteConnectionManager::file(path), bind, true)),
        }
        .map_err(|e| pool_timeout(bind, timeout.as_millis() as u64, &e))?;

        Ok(Self {
            inner,
            url,
            bind: bind.map(str::to_string),
            timeout,
        })
    }

    /// Check out a connection, waiting up to the configured timeout
    pub fn connect(&self) -> Result<PooledConnection> {
        let conn = self.inner.get().map_err(|e| {
            pool_timeout(self.bind.as_deref(), self.timeout.as_millis() as u64, &e)
        })?;
        Ok(PooledConnection {
            conn,
            bind: self.bind.clone(),
        })
    }

    pub fn status(&self) -> PoolStatus {
        let state = self.inner.state();
        PoolStatus {
            open: state.connections as usize,
            idle: state.idle_connections as usize,
            max_size: self.inner.max_size() as usize,
        }
    }

    pub fn url(&self) -> &DatabaseUrl {
        &self.url
    }
}

fn with_setup(manager: SqliteConnectionManager, bind: Option<&str>, wal: bool) -> SqliteConnectionManager {
    let bind = label(bind);
    manager.with_init(move |conn| {
        db::configure(conn, wal)?;
        tracing::debug!(bind = %bind, "opened pooled connection");
        Ok(())
    })
}

/// A connection on loan from a `Pool`; returned when dropped
///
/// A connection handed back in the middle of a transaction is rolled back
/// first, so the next borrower always starts clean.
pub struct PooledConnection {
    conn: r2d2::PooledConnection<SqliteConnectionManager>,
    bind: Option<String>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if self.conn.is_autocommit() {
            return;
        }
        if let Err(err) = self.conn.execute_batch("ROLLBACK") {
            tracing::warn!(
                bind = %label(self.bind.as_deref()),
                error = %err,
                "rollback of returned connection failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn quick(size: usize) -> PoolConfig {
        PoolConfig {
            size,
            timeout_ms: 50,
        }
    }

    #[test]
    fn test_memory_pool_shares_one_store() {
        let pool = Pool::new(DatabaseUrl::Memory, None, &quick(5)).unwrap();
        {
            let conn = pool.connect().unwrap();
            conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (7);")
                .unwrap();
        }
        let conn = pool.connect().unwrap();
        let x: i64 = conn.query_row("SELECT x FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(x, 7);
        assert_eq!(pool.status().max_size, 1);
    }

    #[test]
    fn test_memory_pool_times_out_when_busy() {
        let pool = Pool::new(DatabaseUrl::Memory, Some("one"), &quick(5)).unwrap();
        let _held = pool.connect().unwrap();
        let err = pool.connect().err().unwrap();
        assert_eq!(err.code(), "ERR_TIMEOUT");
        assert_eq!(err.bind(), Some("one"));
        assert!(err.message().contains("50 ms"));
    }

    #[test]
    fn test_pooled_connections_are_configured() {
        let dir = TempDir::new().unwrap();
        let pool = Pool::new(DatabaseUrl::File(dir.path().join("p.db")), None, &quick(1)).unwrap();
        let conn = pool.connect().unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |r| r.get(0))
            .unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |r| r.get(0))
            .unwrap();
        assert_eq!(fk, 1);
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_file_pool_opens_on_demand_and_reuses() {
        let dir = TempDir::new().unwrap();
        let url = DatabaseUrl::File(dir.path().join("pool.db"));
        let pool = Pool::new(url, None, &quick(2)).unwrap();
        assert_eq!(pool.status().open, 0);

        let a = pool.connect().unwrap();
        let b = pool.connect().unwrap();
        assert_eq!(pool.status().open, 2);
        assert!(pool.connect().is_err());

        drop(a);
        drop(b);
        let status = pool.status();
        assert_eq!((status.open, status.idle), (2, 2));

        let _c = pool.connect().unwrap();
        assert_eq!(pool.status().open, 2);
    }

    #[test]
    fn test_unopenable_file_reports_cause() {
        let dir = TempDir::new().unwrap();
        let url = DatabaseUrl::File(dir.path().join("missing").join("x.db"));
        let pool = Pool::new(
            url,
            None,
            &PoolConfig {
                size: 1,
                timeout_ms: 500,
            },
        )
        .unwrap();
        let err = pool.connect().err().unwrap();
        assert_eq!(err.code(), "ERR_TIMEOUT");
        assert!(err.message().contains("unable to open"), "{}", err.message());
    }

    #[test]
    fn test_returned_connection_is_rolled_back() {
        let pool = Pool::new(DatabaseUrl::Memory, None, &quick(1)).unwrap();
        pool.connect()
            .unwrap()
            .execute_batch("CREATE TABLE t (x INTEGER)")
            .unwrap();
        {
            let conn = pool.connect().unwrap();
            conn.execute_batch("BEGIN; INSERT INTO t VALUES (1);").unwrap();
        }
        let conn = pool.connect().unwrap();
        assert!(conn.is_autocommit());
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_waiter_gets_released_connection() {
        let pool = Pool::new(
            DatabaseUrl::Memory,
            None,
            &PoolConfig {
                size: 1,
                timeout_ms: 2_000,
            },
        )
        .unwrap();
        let held = pool.connect().unwrap();
        let other = pool.clone();
        let waiter = std::thread::spawn(move || other.connect().map(|_| ()));
        std::thread::sleep(Duration::from_millis(50));
        drop(held);
        assert!(waiter.join().unwrap().is_ok());
    }
}
