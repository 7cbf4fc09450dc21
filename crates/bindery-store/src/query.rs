//! Minimal SELECT builder for mapped models
//!
//! Filters are raw SQL fragments with positional `?` parameters; this layer
//! does no dialect translation. Fragments are ANDed in the order added.

use std::fmt;
use std::marker::PhantomData;

use bindery_core::{Model, TableDef, Value};

/// Start a query over every row of `M`
pub fn select<M: Model>() -> Select<M> {
    Select {
        filters: Vec::new(),
        params: Vec::new(),
        order_by: Vec::new(),
        limit: None,
        offset: None,
        _model: PhantomData,
    }
}

pub struct Select<M> {
    filters: Vec<String>,
    params: Vec<Value>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Select<M> {
    /// Add a WHERE fragment, e.g. `filter("name = ?", ["alice".into()])`
    pub fn filter<I>(mut self, clause: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.filters.push(clause.into());
        self.params.extend(params);
        self
    }

    /// `column = value`
    pub fn filter_eq(self, column: &str, value: impl Into<Value>) -> Self {
        let clause = format!("\"{}\" = ?", column);
        self.filter(clause, [value.into()])
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.order_by.push(format!("\"{}\" ASC", column));
        self
    }

    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.order_by.push(format!("\"{}\" DESC", column));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    fn where_clause(&self) -> String {
        if self.filters.is_empty() {
            String::new()
        } else {
            let parts: Vec<String> = self.filters.iter().map(|f| format!("({})", f)).collect();
            format!(" WHERE {}", parts.join(" AND "))
        }
    }

    /// Full SELECT statement against `table`
    pub fn to_sql(&self, table: &TableDef) -> String {
        let mut sql = table.select_sql();
        sql.push_str(&self.where_clause());
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            // SQLite needs a LIMIT before OFFSET; -1 means unbounded
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }
        sql
    }

    /// COUNT(*) over the filtered rows; ordering and paging are ignored
    pub fn count_sql(&self, table: &TableDef) -> String {
        format!("SELECT COUNT(*) FROM \"{}\"{}", table.name(), self.where_clause())
    }
}

impl<M> Clone for Select<M> {
    fn clone(&self) -> Self {
        Self {
            filters: self.filters.clone(),
            params: self.params.clone(),
            order_by: self.order_by.clone(),
            limit: self.limit,
            offset: self.offset,
            _model: PhantomData,
        }
    }
}

impl<M> fmt::Debug for Select<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Select")
            .field("model", &std::any::type_name::<M>())
            .field("filters", &self.filters)
            .field("params", &self.params)
            .field("order_by", &self.order_by)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish()
    }
}
