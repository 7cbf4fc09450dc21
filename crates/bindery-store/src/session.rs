//! Unit-of-work sessions spanning every bind
//!
//! A session checks out one connection per bind the first time it writes to
//! that bind and immediately opens a transaction on it. Reads on a bind the
//! session has not written to run on a connection borrowed just for that
//! statement, so an idle reader never holds a connection (an in-memory bind
//! has only one). `commit` and `rollback` end every open transaction and hand
//! the connections back to their pools; the session can then be used for a
//! new unit of work. Dropping a session rolls back whatever it has not
//! committed.

use std::sync::Arc;
use std::time::Instant;

use bindery_core::core_types::SessionId;
use bindery_core::{
    log_op_end, log_op_error, log_op_start, log_sql, ExError, ExErrorKind, Model, TableDef, Value,
};
use rusqlite::{params_from_iter, Connection, Params, Row};

use crate::database::Database;
use crate::engine::Engine;
use crate::errors::{label, on_bind, session_closed, value_count_mismatch, Result};
use crate::pool::PooledConnection;
use crate::query::{select, Select};

/// Session behavior switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Flush pending inserts before every query
    pub autoflush: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { autoflush: true }
    }
}

/// A connection with an open transaction
struct Bound {
    engine: Arc<Engine>,
    conn: PooledConnection,
}

struct PendingInsert {
    table: Arc<TableDef>,
    values: Vec<Value>,
}

pub struct Session {
    id: SessionId,
    db: Database,
    config: SessionConfig,
    bound: Vec<Bound>,
    pending: Vec<PendingInsert>,
    closed: bool,
}

impl Session {
    pub(crate) fn new(db: Database, config: SessionConfig) -> Self {
        let id = SessionId::new();
        tracing::debug!(session_id = %id, "session opened");
        Self {
            id,
            db,
            config,
            bound: Vec::new(),
            pending: Vec::new(),
            closed: false,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether any bind has an open transaction
    pub fn in_transaction(&self) -> bool {
        !self.bound.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Binds this session has an open transaction on
    pub fn active_binds(&self) -> Vec<Option<&str>> {
        self.bound.iter().map(|b| b.engine.bind()).collect()
    }

    /// Queue a row for insertion at the next flush
    pub fn add<M: Model>(&mut self, obj: &M) -> Result<()> {
        let result = self.queue(obj);
        self.tag(result)
    }

    pub fn add_all<'a, M, I>(&mut self, objs: I) -> Result<()>
    where
        M: Model + 'a,
        I: IntoIterator<Item = &'a M>,
    {
        for obj in objs {
            self.add(obj)?;
        }
        Ok(())
    }

    /// Write pending rows, in the order they were added
    ///
    /// A failed flush discards the rows not yet written; roll back before
    /// reusing the session.
    pub fn flush(&mut self) -> Result<()> {
        let result = self.ensure_open("flush").and_then(|_| self.flush_pending());
        self.tag(result)
    }

    /// Insert one row now and return its rowid
    ///
    /// A NULL integer primary key is left out so SQLite assigns it.
    pub fn insert<M: Model>(&mut self, obj: &M) -> Result<i64> {
        let result = self.insert_now(obj);
        self.tag(result)
    }

    /// Rows of `M` matching `query`
    pub fn all<M: Model>(&mut self, query: &Select<M>) -> Result<Vec<M>> {
        let result = self.fetch_all(query);
        self.tag(result)
    }

    pub fn first<M: Model>(&mut self, query: &Select<M>) -> Result<Option<M>> {
        let query = query.clone().limit(1);
        Ok(self.all(&query)?.into_iter().next())
    }

    pub fn count<M: Model>(&mut self, query: &Select<M>) -> Result<i64> {
        let result = self.count_rows(query);
        self.tag(result)
    }

    /// Row of `M` by its single-column primary key
    pub fn get<M: Model>(&mut self, pk: impl Into<Value>) -> Result<Option<M>> {
        let table = self.tag(self.db.table_for::<M>())?;
        let pk_columns: Vec<&str> = table
            .columns()
            .iter()
            .filter(|c| c.is_primary_key())
            .map(|c| c.name())
            .collect();
        let [pk_column] = pk_columns.as_slice() else {
            return Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("get")
                .with_table(table.name())
                .with_session_id(self.id.clone())
                .with_message(format!(
                    "get() needs exactly one primary key column, found {}",
                    pk_columns.len()
                )));
        };
        self.first(&select::<M>().filter_eq(pk_column, pk))
    }

    /// Run a raw statement on `bind`, returning the number of changed rows
    pub fn execute<P: Params>(&mut self, bind: Option<&str>, sql: &str, params: P) -> Result<usize> {
        let result = self.execute_raw(bind, sql, params);
        self.tag(result)
    }

    /// Run a raw query on `bind`, mapping each row with `f`
    ///
    /// Until the session writes to `bind` this reads committed data outside
    /// any transaction; statements that write belong in `execute`.
    pub fn query<T, P, F>(&mut self, bind: Option<&str>, sql: &str, params: P, f: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let result = self
            .ensure_open("query")
            .and_then(|_| self.autoflush())
            .and_then(|_| self.query_on("query", bind, sql, params, f));
        self.tag(result)
    }

    /// Flush, then commit every open transaction
    ///
    /// Binds commit in the order they were first written. If one fails the
    /// rest are rolled back; earlier commits stand.
    pub fn commit(&mut self) -> Result<()> {
        let result = self.commit_all();
        self.tag(result)
    }

    /// Discard pending rows and roll back every open transaction
    pub fn rollback(&mut self) -> Result<()> {
        let result = self.rollback_all();
        self.tag(result)
    }

    /// Roll back and release everything; later calls fail with `SessionClosed`
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.rollback();
        self.closed = true;
        tracing::debug!(session_id = %self.id, "session closed");
        result
    }

    // ---- internals ----

    fn tag<T>(&self, result: Result<T>) -> Result<T> {
        result.map_err(|e| e.with_session_id(self.id.clone()))
    }

    fn ensure_open(&self, op: &str) -> Result<()> {
        if self.closed {
            Err(session_closed(op))
        } else {
            Ok(())
        }
    }

    fn autoflush(&mut self) -> Result<()> {
        if self.config.autoflush && !self.pending.is_empty() {
            self.flush_pending()?;
        }
        Ok(())
    }

    /// Index of the transaction for `bind`, beginning one on first write
    fn transaction(&mut self, op: &str, bind: Option<&str>) -> Result<usize> {
        if let Some(i) = self.bound.iter().position(|b| b.engine.bind() == bind) {
            return Ok(i);
        }
        let engine = self.db.get_engine(bind)?;
        let conn = engine.connect()?;
        conn.execute_batch("BEGIN")
            .map_err(|e| on_bind(op, bind, e))?;
        tracing::debug!(session_id = %self.id, bind = %label(bind), "transaction begun");
        self.bound.push(Bound { engine, conn });
        Ok(self.bound.len() - 1)
    }

    fn queue<M: Model>(&mut self, obj: &M) -> Result<()> {
        self.ensure_open("add")?;
        let table = self.db.table_for::<M>()?;
        let values = obj.values();
        if values.len() != table.columns().len() {
            return Err(value_count_mismatch(
                table.name(),
                table.columns().len(),
                values.len(),
            ));
        }
        self.pending.push(PendingInsert { table, values });
        Ok(())
    }

    fn flush_pending(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        for row in pending {
            self.insert_row(&row.table, row.values)?;
        }
        Ok(())
    }

    fn insert_now<M: Model>(&mut self, obj: &M) -> Result<i64> {
        self.ensure_open("insert")?;
        let table = self.db.table_for::<M>()?;
        let values = obj.values();
        if values.len() != table.columns().len() {
            return Err(value_count_mismatch(
                table.name(),
                table.columns().len(),
                values.len(),
            )
            .with_op("insert"));
        }
        // Keep statement order: rows added earlier go in first
        self.flush_pending()?;
        self.insert_row(&table, values)
    }

    fn insert_row(&mut self, table: &TableDef, values: Vec<Value>) -> Result<i64> {
        let mut columns = Vec::with_capacity(values.len());
        let mut params = Vec::with_capacity(values.len());
        for (column, value) in table.columns().iter().zip(values) {
            if column.is_rowid_alias() && matches!(value, Value::Null) {
                continue;
            }
            columns.push(column.name());
            params.push(value);
        }
        let sql = table.insert_sql(&columns);
        let bind = table.bind_name();

        let i = self.transaction("insert", bind)?;
        let bound = &self.bound[i];
        trace_sql(&self.id, &bound.engine, &sql);
        bound
            .conn
            .execute(&sql, params_from_iter(params.iter()))
            .map_err(|e| on_bind("insert", bind, e).with_table(table.name()))?;
        Ok(bound.conn.last_insert_rowid())
    }

    fn fetch_all<M: Model>(&mut self, query: &Select<M>) -> Result<Vec<M>> {
        self.ensure_open("all")?;
        self.autoflush()?;
        let table = self.db.table_for::<M>()?;
        let sql = query.to_sql(&table);
        self.query_on(
            "all",
            table.bind_name(),
            &sql,
            params_from_iter(query.params().iter()),
            M::from_row,
        )
        .map_err(|e| e.with_table(table.name()))
    }

    fn count_rows<M: Model>(&mut self, query: &Select<M>) -> Result<i64> {
        self.ensure_open("count")?;
        self.autoflush()?;
        let table = self.db.table_for::<M>()?;
        let sql = query.count_sql(&table);
        let counts = self
            .query_on(
                "count",
                table.bind_name(),
                &sql,
                params_from_iter(query.params().iter()),
                |row| row.get::<_, i64>(0),
            )
            .map_err(|e| e.with_table(table.name()))?;
        Ok(counts.into_iter().next().unwrap_or(0))
    }

    fn execute_raw<P: Params>(&mut self, bind: Option<&str>, sql: &str, params: P) -> Result<usize> {
        self.ensure_open("execute")?;
        self.autoflush()?;
        let i = self.transaction("execute", bind)?;
        let bound = &self.bound[i];
        trace_sql(&self.id, &bound.engine, sql);
        bound
            .conn
            .execute(sql, params)
            .map_err(|e| on_bind("execute", bind, e))
    }

    fn query_on<T, P, F>(&self, op: &str, bind: Option<&str>, sql: &str, params: P, f: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        if let Some(bound) = self.bound.iter().find(|b| b.engine.bind() == bind) {
            trace_sql(&self.id, &bound.engine, sql);
            return run_query(&bound.conn, op, bind, sql, params, f);
        }
        let engine = self.db.get_engine(bind)?;
        let conn = engine.connect()?;
        trace_sql(&self.id, &engine, sql);
        run_query(&conn, op, bind, sql, params, f)
    }

    fn commit_all(&mut self) -> Result<()> {
        self.ensure_open("commit")?;
        let start = Instant::now();
        log_op_start!("commit", session_id = %self.id);

        if let Err(err) = self.flush_pending() {
            log_op_error!("commit", err, duration_ms = start.elapsed().as_millis() as u64, session_id = %self.id);
            return Err(err);
        }

        let bound = std::mem::take(&mut self.bound);
        let binds = bound.len();
        let mut failure: Option<ExError> = None;
        for b in bound {
            // Dropping the connection after a failure rolls it back
            if failure.is_some() {
                continue;
            }
            if let Err(e) = b.conn.execute_batch("COMMIT") {
                failure = Some(on_bind("commit", b.engine.bind(), e));
            }
        }

        match failure {
            None => {
                log_op_end!(
                    "commit",
                    duration_ms = start.elapsed().as_millis() as u64,
                    session_id = %self.id,
                    binds = binds
                );
                Ok(())
            }
            Some(err) => {
                log_op_error!("commit", err, duration_ms = start.elapsed().as_millis() as u64, session_id = %self.id);
                Err(err)
            }
        }
    }

    fn rollback_all(&mut self) -> Result<()> {
        self.pending.clear();
        let mut first_error: Option<ExError> = None;
        for b in std::mem::take(&mut self.bound) {
            if let Err(e) = b.conn.execute_batch("ROLLBACK") {
                if first_error.is_none() {
                    first_error = Some(on_bind("rollback", b.engine.bind(), e));
                }
            }
        }
        tracing::debug!(session_id = %self.id, "rolled back");
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed && (self.in_transaction() || !self.pending.is_empty()) {
            tracing::debug!(session_id = %self.id, "discarding uncommitted work");
            if let Err(err) = self.rollback_all() {
                tracing::warn!(session_id = %self.id, error = %err, "rollback on drop failed");
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("binds", &self.active_binds())
            .field("pending", &self.pending.len())
            .field("closed", &self.closed)
            .finish()
    }
}

fn trace_sql(id: &SessionId, engine: &Engine, sql: &str) {
    if engine.echo() {
        log_sql!(engine.label(), sql, session_id = %id);
    }
}

fn run_query<T, P, F>(conn: &Connection, op: &str, bind: Option<&str>, sql: &str, params: P, f: F) -> Result<Vec<T>>
where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql).map_err(|e| on_bind(op, bind, e))?;
    let rows = stmt
        .query_map(params, f)
        .map_err(|e| on_bind(op, bind, e))?
        .collect::<rusqlite::Result<Vec<T>>>()
        .map_err(|e| on_bind(op, bind, e));
    rows
}
