//! Bindery Core - declarations, bind registry and configuration
//!
//! This crate holds everything that does not touch a live connection:
//! - Model and table declarations (`Model`, `TableDef`, `Column`)
//! - The bind registry that partitions tables by bind name
//! - Database configuration and the host settings adapter
//! - The structured error and logging facilities

pub mod config;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod registry;
pub mod settings;

pub use bindery_core_types as core_types;

// Re-export commonly used types
pub use config::{DatabaseConfig, PoolConfig};
pub use errors::{BinderyError, ExError, ExErrorKind, Result};
pub use model::{Column, ColumnType, ForeignKey, Model, TableDef};
pub use registry::{Partition, Registry};
pub use settings::{AppSettings, Settings};

// Pass-through from the underlying SQLite binding
pub use rusqlite::types::Value;
pub use rusqlite::{params, Row, ToSql};
