//! Bind registry
//!
//! Groups registered tables into per-bind partitions. The partition of a
//! model type is fixed when it is registered and never reassigned.

use std::any::{type_name, TypeId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::errors::{BinderyError, Result};
use crate::model::{Model, TableDef};

/// The tables that live in one bind
#[derive(Debug, Clone, Default)]
pub struct Partition {
    bind: Option<String>,
    tables: Vec<Arc<TableDef>>,
}

impl Partition {
    fn new(bind: Option<String>) -> Self {
        Self {
            bind,
            tables: Vec::new(),
        }
    }

    /// Bind name, `None` for the default partition
    pub fn bind(&self) -> Option<&str> {
        self.bind.as_deref()
    }

    /// Tables in registration order
    pub fn tables(&self) -> &[Arc<TableDef>] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Arc<TableDef>> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name()).collect()
    }

    /// Tables ordered so that every table follows the tables it references
    ///
    /// Ties keep registration order. References to tables outside the
    /// partition are ignored; tables caught in a reference cycle are
    /// appended in registration order.
    pub fn sorted_tables(&self) -> Vec<Arc<TableDef>> {
        let local: HashMap<&str, usize> = self
            .tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name(), i))
            .collect();
        let deps: Vec<Vec<usize>> = self
            .tables
            .iter()
            .map(|t| {
                t.dependencies()
                    .iter()
                    .filter_map(|d| local.get(d.as_str()).copied())
                    .collect()
            })
            .collect();

        let mut emitted = vec![false; self.tables.len()];
        let mut order = Vec::with_capacity(self.tables.len());
        loop {
            let next = (0..self.tables.len())
                .find(|&i| !emitted[i] && deps[i].iter().all(|&d| emitted[d]));
            match next {
                Some(i) => {
                    emitted[i] = true;
                    order.push(self.tables[i].clone());
                }
                None => break,
            }
        }
        for (i, table) in self.tables.iter().enumerate() {
            if !emitted[i] {
                order.push(table.clone());
            }
        }
        order
    }

    /// Foreign key targets of `table` that are not tables of this partition
    pub fn external_references(&self, table: &TableDef) -> Vec<String> {
        table
            .dependencies()
            .into_iter()
            .filter(|name| self.table(name).is_none())
            .collect()
    }

    /// CREATE TABLE statements, parents before children
    ///
    /// Each bind is a separate store, so a foreign key to a table outside
    /// the partition is left out of the DDL; the column itself is kept.
    pub fn create_statements(&self, if_not_exists: bool) -> Vec<String> {
        self.sorted_tables()
            .iter()
            .map(|t| t.create_sql_within(if_not_exists, |name| self.table(name).is_some()))
            .collect()
    }

    fn label(&self) -> String {
        self.bind
            .clone()
            .unwrap_or_else(|| crate::core_types::schema::DEFAULT_BIND_LABEL.to_string())
    }
}

/// Registry of model types grouped by bind
#[derive(Debug, Default)]
pub struct Registry {
    default: Partition,
    named: Vec<Partition>,
    by_type: HashMap<TypeId, Arc<TableDef>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            default: Partition::new(None),
            named: Vec::new(),
            by_type: HashMap::new(),
        }
    }

    /// Register a model type, placing its table in the declared bind
    ///
    /// Registering the same type again returns the existing table.
    pub fn register<M: Model>(&mut self) -> Result<Arc<TableDef>> {
        let type_id = TypeId::of::<M>();
        if let Some(existing) = self.by_type.get(&type_id) {
            return Ok(existing.clone());
        }
        let table = self.register_table(M::table())?;
        self.by_type.insert(type_id, table.clone());
        Ok(table)
    }

    /// Register a bare table declaration (no model type attached)
    pub fn register_table(&mut self, table: TableDef) -> Result<Arc<TableDef>> {
        table.validate()?;
        let partition = self.partition_mut_or_insert(table.bind_name());
        if partition.table(table.name()).is_some() {
            return Err(BinderyError::DuplicateTable {
                bind: partition.label(),
                table: table.name().to_string(),
            });
        }
        let table = Arc::new(table);
        partition.tables.push(table.clone());
        Ok(table)
    }

    /// Table registered for a model type
    pub fn table_for<M: Model>(&self) -> Result<Arc<TableDef>> {
        self.by_type
            .get(&TypeId::of::<M>())
            .cloned()
            .ok_or_else(|| BinderyError::UnmappedModel {
                type_name: type_name::<M>().to_string(),
            })
    }

    pub fn is_registered<M: Model>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<M>())
    }

    /// Names of all non-default binds in first-registered order
    pub fn bind_names(&self) -> Vec<String> {
        self.named
            .iter()
            .filter_map(|p| p.bind.clone())
            .collect()
    }

    pub fn partition(&self, bind: Option<&str>) -> Option<&Partition> {
        match bind {
            None => Some(&self.default),
            Some(name) => self.named.iter().find(|p| p.bind() == Some(name)),
        }
    }

    /// Default partition first, then named binds in registration order
    pub fn partitions(&self) -> impl Iterator<Item = &Partition> {
        std::iter::once(&self.default).chain(self.named.iter())
    }

    /// Distinct table names across every partition
    pub fn table_names(&self) -> BTreeSet<String> {
        self.partitions()
            .flat_map(|p| p.tables.iter().map(|t| t.name().to_string()))
            .collect()
    }

    fn partition_mut_or_insert(&mut self, bind: Option<&str>) -> &mut Partition {
        let Some(name) = bind else {
            return &mut self.default;
        };
        let index = match self.named.iter().position(|p| p.bind() == Some(name)) {
            Some(index) => index,
            None => {
                self.named.push(Partition::new(Some(name.to_string())));
                self.named.len() - 1
            }
        };
        &mut self.named[index]
    }
}
