//! Bindery Store - engines, sessions and schema operations over SQLite
//!
//! Provides:
//! - `Database`: initialization, bind registry access, `create_all`/`drop_all`
//! - An engine cache holding one pooled SQLite engine per bind
//! - `Session`: a unit of work spanning every bind, with scoped `begin`
//! - `aio`: the same surface for tokio applications

pub mod aio;
pub mod database;
pub mod db;
pub mod engine;
pub mod errors;
pub mod pool;
pub mod query;
pub mod schema;
pub mod session;
pub mod url;

// Re-export key types
pub use aio::{AsyncDatabase, AsyncSession};
pub use database::Database;
pub use engine::{Engine, EngineCache};
pub use errors::Result;
pub use pool::{ConnectionPool, Pool, PoolStatus, PooledConnection};
pub use query::{select, Select};
pub use session::{Session, SessionConfig};
pub use url::DatabaseUrl;

pub use bindery_core::core_types::SessionId;
pub use bindery_core::{
    params, AppSettings, Column, ColumnType, DatabaseConfig, ExError, ExErrorKind, Model,
    Partition, PoolConfig, Row, Settings, TableDef, ToSql, Value,
};
