//! The `Database` facade
//!
//! Ties together configuration, the bind registry and the engine cache, and
//! hands out sessions. Cloning is cheap; clones share all state.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use bindery_core::errors::BinderyError;
use bindery_core::{
    log_op_end, log_op_error, log_op_start, DatabaseConfig, ExError, Model, Partition, Registry,
    Settings, TableDef,
};
use parking_lot::RwLock;

use crate::engine::{Engine, EngineCache};
use crate::errors::{label, Result};
use crate::schema;
use crate::session::{Session, SessionConfig};
use crate::url::DatabaseUrl;

struct DatabaseInner {
    config: RwLock<Option<DatabaseConfig>>,
    registry: RwLock<Registry>,
    engines: EngineCache,
}

#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    /// An uninitialized database; call `initialize` or `init_app` before use
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                config: RwLock::new(None),
                registry: RwLock::new(Registry::new()),
                engines: EngineCache::new(),
            }),
        }
    }

    /// A database with a single default bind
    pub fn with_uri(uri: &str) -> Result<Self> {
        Self::with_config(DatabaseConfig::new(uri))
    }

    pub fn with_config(config: DatabaseConfig) -> Result<Self> {
        let db = Self::new();
        db.initialize_with(config)?;
        Ok(db)
    }

    /// Configure the default URI and any named binds
    ///
    /// ```
    /// use bindery_store::Database;
    ///
    /// let db = Database::new();
    /// db.initialize("sqlite://", [("one", "sqlite://"), ("two", "sqlite://")])
    ///     .unwrap();
    /// assert!(db.is_initialized());
    /// ```
    pub fn initialize<I, K, V>(&self, uri: &str, binds: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.initialize_with(DatabaseConfig::new(uri).with_binds(binds))
    }

    /// Install `config`, replacing any previous one
    ///
    /// Every URI is checked up front. Engines built from an earlier
    /// configuration are forgotten; sessions still holding their
    /// connections keep working until they finish.
    pub fn initialize_with(&self, config: DatabaseConfig) -> Result<()> {
        let start = Instant::now();
        log_op_start!("initialize", binds = config.binds.len());

        if let Err(err) = check_config(&config) {
            log_op_error!("initialize", err, duration_ms = start.elapsed().as_millis() as u64);
            return Err(err);
        }

        let binds = config.binds.len();
        *self.inner.config.write() = Some(config);
        self.inner.engines.clear();

        log_op_end!(
            "initialize",
            duration_ms = start.elapsed().as_millis() as u64,
            binds = binds
        );
        Ok(())
    }

    /// Configure from the host application's settings object
    pub fn init_app<S: Settings + ?Sized>(&self, settings: &S) -> Result<()> {
        let config = DatabaseConfig::from_settings(settings)
            .map_err(|e| ExError::from(e).with_op("init_app"))?;
        self.initialize_with(config)
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.config.read().is_some()
    }

    /// Current configuration, if any
    pub fn config(&self) -> Option<DatabaseConfig> {
        self.inner.config.read().clone()
    }

    // ---- registry ----

    /// Register a model type in the partition named by its table's bind
    pub fn register<M: Model>(&self) -> Result<Arc<TableDef>> {
        let table = self.inner.registry.write().register::<M>()?;
        tracing::debug!(
            table = table.name(),
            bind = %label(table.bind_name()),
            "registered model"
        );
        Ok(table)
    }

    pub fn register_table(&self, table: TableDef) -> Result<Arc<TableDef>> {
        Ok(self.inner.registry.write().register_table(table)?)
    }

    pub fn table_for<M: Model>(&self) -> Result<Arc<TableDef>> {
        Ok(self.inner.registry.read().table_for::<M>()?)
    }

    pub fn is_registered<M: Model>(&self) -> bool {
        self.inner.registry.read().is_registered::<M>()
    }

    /// Named binds that have at least one registered table, in registration order
    pub fn bind_names(&self) -> Vec<String> {
        self.inner.registry.read().bind_names()
    }

    /// The default partition
    pub fn metadata(&self) -> Partition {
        self.partition(None).unwrap_or_default()
    }

    pub fn partition(&self, bind: Option<&str>) -> Option<Partition> {
        self.inner.registry.read().partition(bind).cloned()
    }

    /// Every partition, default first
    pub fn partitions(&self) -> Vec<Partition> {
        self.inner.registry.read().partitions().cloned().collect()
    }

    /// Names of every registered table across all partitions
    pub fn table_names(&self) -> BTreeSet<String> {
        self.inner.registry.read().table_names()
    }

    // ---- engines and schema ----

    /// Engine for `bind` (`None` = default), built on first use
    pub fn get_engine(&self, bind: Option<&str>) -> Result<Arc<Engine>> {
        let guard = self.inner.config.read();
        let Some(config) = &*guard else {
            return Err(ExError::from(BinderyError::NotInitialized).with_op("get_engine"));
        };
        self.inner
            .engines
            .get_or_create(bind, config)
            .map_err(|e| e.with_op("get_engine"))
    }

    /// Create every registered table that does not exist yet
    pub fn create_all(&self) -> Result<()> {
        self.for_each_partition("create_all", schema::create_partition)
    }

    /// Drop every registered table that exists
    pub fn drop_all(&self) -> Result<()> {
        self.for_each_partition("drop_all", schema::drop_partition)
    }

    fn for_each_partition<F>(&self, op: &'static str, ddl: F) -> Result<()>
    where
        F: Fn(&Engine, &Partition) -> Result<usize>,
    {
        let start = Instant::now();
        log_op_start!(op);

        let partitions: Vec<Partition> = self
            .partitions()
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();

        let mut tables = 0;
        for partition in &partitions {
            let result = self
                .get_engine(partition.bind())
                .and_then(|engine| ddl(&engine, partition));
            match result {
                Ok(n) => {
                    tracing::debug!(op, bind = %label(partition.bind()), table_count = n, "partition done");
                    tables += n;
                }
                Err(err) => {
                    let err = err.with_op(op);
                    log_op_error!(
                        op,
                        err,
                        duration_ms = start.elapsed().as_millis() as u64,
                        bind = %label(partition.bind())
                    );
                    return Err(err);
                }
            }
        }

        log_op_end!(
            op,
            duration_ms = start.elapsed().as_millis() as u64,
            partitions = partitions.len(),
            table_count = tables
        );
        Ok(())
    }

    // ---- sessions ----

    /// A new session over every bind
    ///
    /// No connection is held until the session first writes to a bind.
    pub fn session(&self) -> Session {
        self.session_with(SessionConfig::default())
    }

    pub fn session_with(&self, config: SessionConfig) -> Session {
        Session::new(self.clone(), config)
    }

    /// Run `f` in a transaction
    ///
    /// `Ok` commits; `Err` rolls back and hands the error back untouched.
    /// The session is closed either way.
    ///
    /// ```
    /// use bindery_store::{Database, ExError};
    ///
    /// let db = Database::with_uri("sqlite://").unwrap();
    /// let n = db
    ///     .begin(|s| -> Result<usize, ExError> {
    ///         s.execute(None, "CREATE TABLE t (x INTEGER)", [])?;
    ///         s.execute(None, "INSERT INTO t VALUES (1)", [])
    ///     })
    ///     .unwrap();
    /// assert_eq!(n, 1);
    /// ```
    pub fn begin<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        E: From<ExError>,
        F: FnOnce(&mut Session) -> std::result::Result<T, E>,
    {
        let mut session = self.session();
        match f(&mut session) {
            Ok(value) => {
                session.commit()?;
                session.close()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = session.close() {
                    tracing::warn!(
                        session_id = %session.id(),
                        error = %rollback_err,
                        "rollback after failed transaction also failed"
                    );
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", &*self.inner.config.read())
            .field("tables", &self.table_names())
            .field("engines", &self.inner.engines.len())
            .finish()
    }
}

fn check_config(config: &DatabaseConfig) -> Result<()> {
    config.validate()?;
    DatabaseUrl::parse(&config.uri)?;
    for (name, uri) in &config.binds {
        DatabaseUrl::parse(uri).map_err(|e| ExError::from(e).with_bind(name.clone()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::{Column, ExErrorKind};

    #[test]
    fn test_uninitialized_engine_lookup_is_config_error() {
        let db = Database::new();
        let err = db.get_engine(None).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotInitialized);
        assert!(err.kind().is_config());
    }

    #[test]
    fn test_bad_uri_rejected_at_initialize() {
        let db = Database::new();
        let err = db
            .initialize("sqlite://", [("one", "mysql://localhost/x")])
            .unwrap_err();
        assert_eq!(err.code(), "ERR_UNSUPPORTED_URI");
        assert_eq!(err.bind(), Some("one"));
        assert!(!db.is_initialized());
    }

    #[test]
    fn test_reinitialize_replaces_engines() {
        let db = Database::with_uri("sqlite://").unwrap();
        let first = db.get_engine(None).unwrap();
        db.initialize("sqlite://", [("one", "sqlite://")]).unwrap();
        let second = db.get_engine(None).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(db.get_engine(Some("one")).is_ok());
    }

    #[test]
    fn test_empty_partitions_never_build_engines() {
        let db = Database::with_uri("sqlite://").unwrap();
        db.create_all().unwrap();
        db.drop_all().unwrap();
        assert!(db.inner.engines.is_empty());

        db.register_table(TableDef::new("t").column(Column::integer("id").primary_key()))
            .unwrap();
        db.create_all().unwrap();
        assert_eq!(db.inner.engines.len(), 1);
    }

    #[test]
    fn test_metadata_is_default_partition() {
        let db = Database::new();
        db.register_table(TableDef::new("a").column(Column::integer("id")))
            .unwrap();
        db.register_table(TableDef::new("b").bind("one").column(Column::integer("id")))
            .unwrap();
        assert_eq!(db.metadata().table_names(), vec!["a"]);
        assert_eq!(db.bind_names(), vec!["one".to_string()]);
        assert_eq!(db.partitions().len(), 2);
    }
}
