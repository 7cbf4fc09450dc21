//! Error handling for bindery-store
//!
//! Wraps bindery-core ExError with store-specific helpers

use bindery_core::core_types::schema::DEFAULT_BIND_LABEL;
use bindery_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Log/error label for a bind (`None` = default partition)
pub fn label(bind: Option<&str>) -> String {
    bind.unwrap_or(DEFAULT_BIND_LABEL).to_string()
}

/// Create a database error from rusqlite::Error
///
/// The SQLite message ("no such table: users", constraint failures, ...)
/// is kept verbatim.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Database error tagged with the operation and bind it happened on
pub fn on_bind(op: &str, bind: Option<&str>, err: rusqlite::Error) -> ExError {
    from_rusqlite(err).with_op(op).with_bind(label(bind))
}

/// Create a pool checkout timeout error
///
/// `r2d2` reports the last connection failure, if any, in its message;
/// it is kept so an unopenable store is distinguishable from a busy one.
pub fn pool_timeout(bind: Option<&str>, waited_ms: u64, cause: &r2d2::Error) -> ExError {
    ExError::new(ExErrorKind::Timeout)
        .with_op("pool_checkout")
        .with_bind(label(bind))
        .with_message(format!(
            "No connection became available within {} ms ({})",
            waited_ms, cause
        ))
}

/// Create an error for use of a closed session
pub fn session_closed(op: &str) -> ExError {
    ExError::new(ExErrorKind::SessionClosed)
        .with_op(op.to_string())
        .with_message("Session is closed")
}

/// Create an error for a model whose values do not match its columns
pub fn value_count_mismatch(table: &str, expected: usize, actual: usize) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("add")
        .with_table(table.to_string())
        .with_message(format!(
            "Model produced {} values for {} columns",
            actual, expected
        ))
}

/// Create an error for a blocking task that panicked or was cancelled
pub fn join_error(op: &str, err: tokio::task::JoinError) -> ExError {
    ExError::new(ExErrorKind::Concurrency)
        .with_op(op.to_string())
        .with_message(format!("Blocking task failed: {}", err))
}
