//! Table declarations
//!
//! A `TableDef` is the explicit replacement for class-level declarative
//! metadata: it names the table, the bind it lives in, and its columns.

use crate::errors::BinderyError;
use crate::model::column::Column;
use crate::model::naming::{is_valid_identifier, table_name_for};

/// Declaration of one mapped table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    name: String,
    bind: Option<String>,
    columns: Vec<Column>,
}

impl TableDef {
    /// Table with an explicit name in the default bind
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bind: None,
            columns: Vec::new(),
        }
    }

    /// Table named after the type (`UserAddress` → `user_address`)
    pub fn for_type<T: ?Sized>() -> Self {
        Self::new(table_name_for::<T>())
    }

    /// Route this table to a named bind
    pub fn bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = Some(bind.into());
        self
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind name, `None` for the default partition
    pub fn bind_name(&self) -> Option<&str> {
        self.bind.as_deref()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Check identifiers and column layout
    pub fn validate(&self) -> Result<(), BinderyError> {
        let invalid = |reason: String| BinderyError::InvalidTable {
            table: self.name.clone(),
            reason,
        };

        if !is_valid_identifier(&self.name) {
            return Err(invalid("table name is not a valid identifier".to_string()));
        }
        if let Some(bind) = &self.bind {
            if !is_valid_identifier(bind) {
                return Err(invalid(format!("bind name '{}' is not a valid identifier", bind)));
            }
        }
        if self.columns.is_empty() {
            return Err(invalid("table declares no columns".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for column in &self.columns {
            if !is_valid_identifier(column.name()) {
                return Err(invalid(format!(
                    "column name '{}' is not a valid identifier",
                    column.name()
                )));
            }
            if !seen.insert(column.name()) {
                return Err(invalid(format!("duplicate column '{}'", column.name())));
            }
            column.foreign_key()?;
        }
        Ok(())
    }

    /// Other tables this one references through foreign keys
    pub fn dependencies(&self) -> Vec<String> {
        let mut deps: Vec<String> = Vec::new();
        for column in &self.columns {
            if let Ok(Some(fk)) = column.foreign_key() {
                if fk.table != self.name && !deps.contains(&fk.table) {
                    deps.push(fk.table);
                }
            }
        }
        deps
    }

    /// CREATE TABLE statement; `if_not_exists` skips tables already present
    pub fn create_sql(&self, if_not_exists: bool) -> String {
        self.create_sql_within(if_not_exists, |_| true)
    }

    /// CREATE TABLE statement keeping only foreign keys whose target table
    /// passes `in_scope`
    ///
    /// Self-references are always kept.
    pub fn create_sql_within<F>(&self, if_not_exists: bool, in_scope: F) -> String
    where
        F: Fn(&str) -> bool,
    {
        let pk_count = self.columns.iter().filter(|c| c.is_primary_key()).count();
        let inline_pk = pk_count == 1;

        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|c| c.ddl_fragment(inline_pk))
            .collect();

        if pk_count > 1 {
            let pk_cols: Vec<String> = self
                .columns
                .iter()
                .filter(|c| c.is_primary_key())
                .map(|c| format!("\"{}\"", c.name()))
                .collect();
            parts.push(format!("PRIMARY KEY ({})", pk_cols.join(", ")));
        }

        for column in &self.columns {
            if let Ok(Some(fk)) = column.foreign_key() {
                if fk.table != self.name && !in_scope(&fk.table) {
                    continue;
                }
                parts.push(format!(
                    "FOREIGN KEY (\"{}\") REFERENCES \"{}\" (\"{}\")",
                    column.name(),
                    fk.table,
                    fk.column
                ));
            }
        }

        format!(
            "CREATE TABLE {}\"{}\" (\n    {}\n)",
            if if_not_exists { "IF NOT EXISTS " } else { "" },
            self.name,
            parts.join(",\n    ")
        )
    }

    pub fn drop_sql(&self, if_exists: bool) -> String {
        format!(
            "DROP TABLE {}\"{}\"",
            if if_exists { "IF EXISTS " } else { "" },
            self.name
        )
    }

    /// SELECT of every declared column, in declaration order
    pub fn select_sql(&self) -> String {
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("\"{}\"", c.name()))
            .collect();
        format!("SELECT {} FROM \"{}\"", cols.join(", "), self.name)
    }

    /// INSERT for the named subset of columns
    pub fn insert_sql(&self, columns: &[&str]) -> String {
        if columns.is_empty() {
            return format!("INSERT INTO \"{}\" DEFAULT VALUES", self.name);
        }
        let cols: Vec<String> = columns.iter().map(|c| format!("\"{}\"", c)).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            self.name,
            cols.join(", "),
            placeholders.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::column::ColumnType;

    fn users() -> TableDef {
        TableDef::new("users")
            .column(Column::integer("id").primary_key())
            .column(Column::string("name", 128))
    }

    #[test]
    fn test_create_sql() {
        assert_eq!(
            users().create_sql(true),
            "CREATE TABLE IF NOT EXISTS \"users\" (\n    \"id\" INTEGER NOT NULL PRIMARY KEY,\n    \"name\" VARCHAR(128)\n)"
        );
    }

    #[test]
    fn test_composite_primary_key() {
        let table = TableDef::new("membership")
            .column(Column::integer("user_id").primary_key())
            .column(Column::integer("group_id").primary_key());
        let sql = table.create_sql(false);
        assert!(sql.starts_with("CREATE TABLE \"membership\""));
        assert!(sql.contains("PRIMARY KEY (\"user_id\", \"group_id\")"));
        assert!(!sql.contains("NOT NULL PRIMARY KEY"));
    }

    #[test]
    fn test_foreign_key_clause_and_dependencies() {
        let table = TableDef::for_type::<Address>()
            .bind("two")
            .column(Column::integer("id").primary_key())
            .column(Column::integer("user_id").references("user2.id"));
        assert_eq!(table.name(), "address");
        assert_eq!(table.bind_name(), Some("two"));
        assert_eq!(table.dependencies(), vec!["user2".to_string()]);
        assert!(table
            .create_sql(true)
            .contains("FOREIGN KEY (\"user_id\") REFERENCES \"user2\" (\"id\")"));
    }

    #[test]
    fn test_out_of_scope_foreign_key_is_left_out() {
        let table = TableDef::new("note")
            .column(Column::integer("id").primary_key())
            .column(Column::integer("parent_id").references("note.id"))
            .column(Column::integer("user_id").references("users.id"));

        let sql = table.create_sql_within(true, |name| name != "users");
        assert!(!sql.contains("REFERENCES \"users\""));
        assert!(sql.contains("FOREIGN KEY (\"parent_id\") REFERENCES \"note\" (\"id\")"));
        // The column itself stays
        assert!(sql.contains("\"user_id\" INTEGER"));
    }

    #[test]
    fn test_self_reference_is_not_a_dependency() {
        let table = TableDef::new("node")
            .column(Column::integer("id").primary_key())
            .column(Column::integer("parent_id").references("node.id"));
        assert!(table.dependencies().is_empty());
    }

    #[test]
    fn test_insert_and_select_sql() {
        let table = users();
        assert_eq!(
            table.insert_sql(&["name"]),
            "INSERT INTO \"users\" (\"name\") VALUES (?1)"
        );
        assert_eq!(table.insert_sql(&[]), "INSERT INTO \"users\" DEFAULT VALUES");
        assert_eq!(table.select_sql(), "SELECT \"id\", \"name\" FROM \"users\"");
        assert_eq!(table.drop_sql(true), "DROP TABLE IF EXISTS \"users\"");
    }

    #[test]
    fn test_validate_rejects_bad_declarations() {
        assert!(TableDef::new("empty").validate().is_err());
        assert!(TableDef::new("bad name")
            .column(Column::integer("id"))
            .validate()
            .is_err());
        assert!(TableDef::new("t")
            .column(Column::integer("id"))
            .column(Column::new("id", ColumnType::Text))
            .validate()
            .is_err());
        assert!(users().bind("no-dash").validate().is_err());
        assert!(users().validate().is_ok());
    }

    struct Address;
}
