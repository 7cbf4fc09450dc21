//! Model declarations
//!
//! Types become mapped models by implementing [`Model`]. There is no
//! reflection: the table name, bind and columns come from [`Model::table`],
//! and values travel through `rusqlite` types.

pub mod column;
pub mod naming;
pub mod table;

pub use column::{Column, ColumnType, ForeignKey};
pub use table::TableDef;

use rusqlite::types::Value;
use rusqlite::Row;

/// A mapped model type
///
/// ```
/// use bindery_core::model::{Column, Model, TableDef};
/// use bindery_core::{Row, Value};
///
/// struct User {
///     id: Option<i64>,
///     name: String,
/// }
///
/// impl Model for User {
///     fn table() -> TableDef {
///         TableDef::new("users")
///             .column(Column::integer("id").primary_key())
///             .column(Column::string("name", 128))
///     }
///
///     fn values(&self) -> Vec<Value> {
///         vec![self.id.into(), self.name.clone().into()]
///     }
///
///     fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
///         Ok(Self { id: row.get(0)?, name: row.get(1)? })
///     }
/// }
/// ```
pub trait Model: Sized + Send + 'static {
    /// Table declaration; called once at registration
    fn table() -> TableDef;

    /// Column values in declaration order
    ///
    /// A `Null` in an integer primary key lets SQLite assign the row id.
    fn values(&self) -> Vec<Value>;

    /// Decode a row whose columns follow declaration order
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}
