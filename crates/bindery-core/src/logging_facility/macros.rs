//! Canonical logging macros

/// Log the start of an operation
///
/// ```
/// # use bindery_core::log_op_start;
/// log_op_start!("create_all");
/// log_op_start!("get_engine", bind = "reports");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use bindery_core::log_op_end;
/// log_op_end!("create_all", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// Accepts anything convertible into `ExError` (the value is cloned, so the
/// caller can still return it).
///
/// ```
/// # use bindery_core::log_op_error;
/// # use bindery_core::errors::BinderyError;
/// let err = BinderyError::UnknownBind { bind: "two".to_string() };
/// log_op_error!("get_engine", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = ::std::clone::Clone::clone(&$err).into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_message = ex_err.message(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = ::std::clone::Clone::clone(&$err).into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_message = ex_err.message(),
            $($field)*
        );
    }};
}

/// Log one SQL statement at debug level
///
/// Callers only invoke this when echo is enabled for the engine.
///
/// ```
/// # use bindery_core::log_sql;
/// log_sql!("<default>", "SELECT 1");
/// log_sql!("reports", "DELETE FROM report", session_id = "0192");
/// ```
#[macro_export]
macro_rules! log_sql {
    ($bind:expr, $sql:expr) => {
        tracing::debug!(
            component = module_path!(),
            bind = %$bind,
            sql = %$sql,
            "sql"
        );
    };
    ($bind:expr, $sql:expr, $($field:tt)*) => {
        tracing::debug!(
            component = module_path!(),
            bind = %$bind,
            sql = %$sql,
            $($field)*,
            "sql"
        );
    };
}
