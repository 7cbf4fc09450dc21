//! Async facade for tokio applications
//!
//! Mirrors `Database` and `Session`. Registration and configuration do no
//! I/O and stay synchronous; everything that opens connections or runs
//! statements is moved onto the blocking pool with `spawn_blocking`.

mod session;

pub use session::AsyncSession;

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use bindery_core::{DatabaseConfig, ExError, Model, Partition, Settings, TableDef};
use tokio::task;

use crate::database::Database;
use crate::engine::Engine;
use crate::errors::{join_error, Result};
use crate::session::SessionConfig;

#[derive(Clone, Default, Debug)]
pub struct AsyncDatabase {
    db: Database,
}

impl AsyncDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_uri(uri: &str) -> Result<Self> {
        Ok(Self {
            db: Database::with_uri(uri)?,
        })
    }

    pub fn with_config(config: DatabaseConfig) -> Result<Self> {
        Ok(Self {
            db: Database::with_config(config)?,
        })
    }

    /// The synchronous facade sharing this database's state
    pub fn sync(&self) -> &Database {
        &self.db
    }

    pub fn initialize<I, K, V>(&self, uri: &str, binds: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.db.initialize(uri, binds)
    }

    pub fn initialize_with(&self, config: DatabaseConfig) -> Result<()> {
        self.db.initialize_with(config)
    }

    pub fn init_app<S: Settings + ?Sized>(&self, settings: &S) -> Result<()> {
        self.db.init_app(settings)
    }

    pub fn is_initialized(&self) -> bool {
        self.db.is_initialized()
    }

    pub fn register<M: Model>(&self) -> Result<Arc<TableDef>> {
        self.db.register::<M>()
    }

    pub fn register_table(&self, table: TableDef) -> Result<Arc<TableDef>> {
        self.db.register_table(table)
    }

    pub fn bind_names(&self) -> Vec<String> {
        self.db.bind_names()
    }

    pub fn metadata(&self) -> Partition {
        self.db.metadata()
    }

    pub fn table_names(&self) -> BTreeSet<String> {
        self.db.table_names()
    }

    pub async fn get_engine(&self, bind: Option<&str>) -> Result<Arc<Engine>> {
        let db = self.db.clone();
        let bind = bind.map(str::to_string);
        task::spawn_blocking(move || db.get_engine(bind.as_deref()))
            .await
            .map_err(|e| join_error("get_engine", e))?
    }

    pub async fn create_all(&self) -> Result<()> {
        let db = self.db.clone();
        task::spawn_blocking(move || db.create_all())
            .await
            .map_err(|e| join_error("create_all", e))?
    }

    pub async fn drop_all(&self) -> Result<()> {
        let db = self.db.clone();
        task::spawn_blocking(move || db.drop_all())
            .await
            .map_err(|e| join_error("drop_all", e))?
    }

    /// A new async session; connections are taken lazily
    pub fn session(&self) -> AsyncSession {
        AsyncSession::new(self.db.session())
    }

    pub fn session_with(&self, config: SessionConfig) -> AsyncSession {
        AsyncSession::new(self.db.session_with(config))
    }

    /// Run `f` in a transaction: commit on `Ok`, roll back on `Err`
    ///
    /// The error is handed back untouched and the session is closed either
    /// way.
    pub async fn begin<T, E, F, Fut>(&self, f: F) -> std::result::Result<T, E>
    where
        E: From<ExError>,
        F: FnOnce(AsyncSession) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let session = self.session();
        match f(session.clone()).await {
            Ok(value) => {
                session.commit().await?;
                session.close().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = session.close().await {
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

impl From<Database> for AsyncDatabase {
    fn from(db: Database) -> Self {
        Self { db }
    }
}
