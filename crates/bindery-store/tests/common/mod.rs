// Shared model declarations for integration tests
#![allow(dead_code)]

use bindery_store::{Column, Model, Row, TableDef, Value};

/// Default bind
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
}

impl User {
    pub fn named(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
        }
    }
}

impl Model for User {
    fn table() -> TableDef {
        TableDef::new("users")
            .column(Column::integer("id").primary_key())
            .column(Column::string("name", 128).not_null())
    }

    fn values(&self) -> Vec<Value> {
        vec![self.id.into(), self.name.clone().into()]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

/// Bind "one", table name derived from the type
#[derive(Debug, Clone, PartialEq)]
pub struct User1 {
    pub id: Option<i64>,
    pub name: String,
}

impl Model for User1 {
    fn table() -> TableDef {
        TableDef::for_type::<Self>()
            .bind("one")
            .column(Column::integer("id").primary_key())
            .column(Column::string("name", 128))
    }

    fn values(&self) -> Vec<Value> {
        vec![self.id.into(), self.name.clone().into()]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

/// Bind "two"
#[derive(Debug, Clone, PartialEq)]
pub struct User2 {
    pub id: Option<i64>,
    pub name: String,
}

impl Model for User2 {
    fn table() -> TableDef {
        TableDef::for_type::<Self>()
            .bind("two")
            .column(Column::integer("id").primary_key())
            .column(Column::string("name", 128))
    }

    fn values(&self) -> Vec<Value> {
        vec![self.id.into(), self.name.clone().into()]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

/// Bind "two", references `user2`
#[derive(Debug, Clone, PartialEq)]
pub struct UserAddress {
    pub id: Option<i64>,
    pub user_id: i64,
    pub street: String,
}

impl Model for UserAddress {
    fn table() -> TableDef {
        TableDef::for_type::<Self>()
            .bind("two")
            .column(Column::integer("id").primary_key())
            .column(Column::integer("user_id").not_null().references("user2.id"))
            .column(Column::text("street"))
    }

    fn values(&self) -> Vec<Value> {
        vec![self.id.into(), self.user_id.into(), self.street.clone().into()]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            street: row.get(2)?,
        })
    }
}

/// Bind "one", same table name as `User`
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteUser {
    pub id: Option<i64>,
    pub name: String,
}

impl Model for RemoteUser {
    fn table() -> TableDef {
        TableDef::new("users")
            .bind("one")
            .column(Column::integer("id").primary_key())
            .column(Column::string("name", 128).not_null())
    }

    fn values(&self) -> Vec<Value> {
        vec![self.id.into(), self.name.clone().into()]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

/// Bind "one", references `users` of the default bind
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: Option<i64>,
    pub user_id: i64,
    pub body: String,
}

impl Model for Note {
    fn table() -> TableDef {
        TableDef::for_type::<Self>()
            .bind("one")
            .column(Column::integer("id").primary_key())
            .column(Column::integer("user_id").not_null().references("users.id"))
            .column(Column::text("body"))
    }

    fn values(&self) -> Vec<Value> {
        vec![self.id.into(), self.user_id.into(), self.body.clone().into()]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            body: row.get(2)?,
        })
    }
}

/// Count rows of `table` straight through the bind's engine
pub fn raw_count(db: &bindery_store::Database, bind: Option<&str>, table: &str) -> rusqlite::Result<i64> {
    let engine = db.get_engine(bind).expect("engine");
    let conn = engine.connect().expect("connection");
    conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |row| row.get(0))
}
