//! Canonical schema constants for structured logging and events

// Field keys the test capture layer lifts out of every event
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_BIND: &str = "bind";

/// Bind label used in log fields for the primary partition
pub const DEFAULT_BIND_LABEL: &str = "<default>";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
