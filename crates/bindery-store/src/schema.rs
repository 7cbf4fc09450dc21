//! DDL for one bind partition
//!
//! Each call runs in a single transaction on one connection: either every
//! table of the partition is created (or dropped) or none is.

use bindery_core::{log_sql, Partition};
use rusqlite::Connection;

use crate::engine::Engine;
use crate::errors::{on_bind, Result};

/// Create every table of `partition`, parents before children
///
/// Tables that already exist are left alone, so repeated calls are harmless.
/// Foreign keys to tables of other binds are not emitted.
pub fn create_partition(engine: &Engine, partition: &Partition) -> Result<usize> {
    for table in partition.tables() {
        let external = partition.external_references(table);
        if !external.is_empty() {
            tracing::debug!(
                bind = %engine.label(),
                table = %table.name(),
                references = ?external,
                "foreign keys to tables outside the bind left out of DDL"
            );
        }
    }
    let statements = partition.create_statements(true);
    let mut conn = engine.connect()?;
    run_ddl(&mut conn, engine, "create_all", &statements)
}

/// Drop every table of `partition`, children before parents
pub fn drop_partition(engine: &Engine, partition: &Partition) -> Result<usize> {
    let statements: Vec<String> = partition
        .sorted_tables()
        .iter()
        .rev()
        .map(|t| t.drop_sql(true))
        .collect();
    let mut conn = engine.connect()?;
    run_ddl(&mut conn, engine, "drop_all", &statements)
}

fn run_ddl(conn: &mut Connection, engine: &Engine, op: &str, statements: &[String]) -> Result<usize> {
    let tx = conn
        .transaction()
        .map_err(|e| on_bind(op, engine.bind(), e))?;
    for sql in statements {
        if engine.echo() {
            log_sql!(engine.label(), sql);
        }
        tx.execute_batch(sql)
            .map_err(|e| on_bind(op, engine.bind(), e))?;
    }
    tx.commit().map_err(|e| on_bind(op, engine.bind(), e))?;
    Ok(statements.len())
}
