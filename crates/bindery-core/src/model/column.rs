//! Column declarations

use crate::errors::BinderyError;
use crate::model::naming::is_valid_identifier;

/// Storage type of a column, rendered as SQLite DDL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    BigInteger,
    Float,
    Boolean,
    /// Variable-length string with an optional declared length
    String(Option<u32>),
    Text,
    Blob,
    /// ISO-8601 timestamp stored as text
    DateTime,
}

impl ColumnType {
    /// DDL type name
    pub fn sql(&self) -> String {
        match self {
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInteger => "BIGINT".to_string(),
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::String(Some(len)) => format!("VARCHAR({})", len),
            ColumnType::String(None) => "VARCHAR".to_string(),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Blob => "BLOB".to_string(),
            ColumnType::DateTime => "DATETIME".to_string(),
        }
    }
}

/// Target of a foreign key, written `table.column`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

impl ForeignKey {
    pub fn parse(target: &str) -> Result<Self, BinderyError> {
        let invalid = || BinderyError::InvalidTable {
            table: target.to_string(),
            reason: format!("foreign key target '{}' must be table.column", target),
        };
        let (table, column) = target.split_once('.').ok_or_else(invalid)?;
        if !is_valid_identifier(table) || !is_valid_identifier(column) {
            return Err(invalid());
        }
        Ok(Self {
            table: table.to_string(),
            column: column.to_string(),
        })
    }
}

/// A single column declaration
///
/// ```
/// use bindery_core::model::Column;
///
/// let id = Column::integer("id").primary_key();
/// assert_eq!(id.ddl(), "\"id\" INTEGER NOT NULL PRIMARY KEY");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    primary_key: bool,
    nullable: bool,
    unique: bool,
    foreign_key: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
            nullable: true,
            unique: false,
            foreign_key: None,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub fn string(name: impl Into<String>, len: u32) -> Self {
        Self::new(name, ColumnType::String(Some(len)))
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }

    /// Mark as primary key (implies NOT NULL)
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Declare a foreign key to `table.column`
    pub fn references(mut self, target: impl Into<String>) -> Self {
        self.foreign_key = Some(target.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> &ColumnType {
        &self.column_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Integer primary keys are row ids: SQLite assigns them when NULL is inserted
    pub fn is_rowid_alias(&self) -> bool {
        self.primary_key && self.column_type == ColumnType::Integer
    }

    /// Parsed foreign key, if declared
    pub fn foreign_key(&self) -> Result<Option<ForeignKey>, BinderyError> {
        self.foreign_key.as_deref().map(ForeignKey::parse).transpose()
    }

    /// Column definition fragment for CREATE TABLE
    ///
    /// Primary keys are emitted at table level when a table declares more
    /// than one, so `inline_pk` is false in that case.
    pub(crate) fn ddl_fragment(&self, inline_pk: bool) -> String {
        let mut sql = format!("\"{}\" {}", self.name, self.column_type.sql());
        if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if self.primary_key && inline_pk {
            sql.push_str(" PRIMARY KEY");
        }
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        sql
    }

    pub fn ddl(&self) -> String {
        self.ddl_fragment(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_column_ddl() {
        let col = Column::string("name", 128);
        assert_eq!(col.ddl(), "\"name\" VARCHAR(128)");
        assert!(col.is_nullable());
    }

    #[test]
    fn test_not_null_unique() {
        let col = Column::text("email").not_null().unique();
        assert_eq!(col.ddl(), "\"email\" TEXT NOT NULL UNIQUE");
    }

    #[test]
    fn test_rowid_alias_only_for_integer_pk() {
        assert!(Column::integer("id").primary_key().is_rowid_alias());
        assert!(!Column::new("id", ColumnType::BigInteger)
            .primary_key()
            .is_rowid_alias());
        assert!(!Column::integer("n").is_rowid_alias());
    }

    #[test]
    fn test_foreign_key_parse() {
        let col = Column::integer("user_id").references("user2.id");
        let fk = col.foreign_key().unwrap().unwrap();
        assert_eq!(fk.table, "user2");
        assert_eq!(fk.column, "id");
    }

    #[test]
    fn test_foreign_key_rejects_bad_target() {
        let col = Column::integer("user_id").references("user2");
        assert!(col.foreign_key().is_err());
    }
}
