//! Async session handle

use std::sync::Arc;

use bindery_core::core_types::SessionId;
use bindery_core::{Model, Value};
use parking_lot::Mutex;
use rusqlite::params_from_iter;
use tokio::task;

use crate::errors::{join_error, Result};
use crate::query::Select;
use crate::session::Session;

/// Cloneable async handle over a `Session`
///
/// Every operation runs on tokio's blocking pool; the await on that task is
/// the only suspension point. Clones share the same unit of work.
#[derive(Clone)]
pub struct AsyncSession {
    id: SessionId,
    inner: Arc<Mutex<Session>>,
}

impl AsyncSession {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            id: session.id().clone(),
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Session) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        task::spawn_blocking(move || {
            let mut session = inner.lock();
            f(&mut session)
        })
        .await
        .map_err(|e| join_error(op, e).with_session_id(self.id.clone()))?
    }

    /// Run `f` against the underlying synchronous session on the blocking pool
    pub async fn run_sync<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Session) -> Result<T> + Send + 'static,
    {
        self.run("run_sync", f).await
    }

    pub async fn add<M: Model>(&self, obj: M) -> Result<()> {
        self.run("add", move |s| s.add(&obj)).await
    }

    pub async fn add_all<M: Model>(&self, objs: Vec<M>) -> Result<()> {
        self.run("add_all", move |s| s.add_all(&objs)).await
    }

    pub async fn flush(&self) -> Result<()> {
        self.run("flush", |s| s.flush()).await
    }

    pub async fn insert<M: Model>(&self, obj: M) -> Result<i64> {
        self.run("insert", move |s| s.insert(&obj)).await
    }

    pub async fn all<M: Model>(&self, query: Select<M>) -> Result<Vec<M>> {
        self.run("all", move |s| s.all(&query)).await
    }

    pub async fn first<M: Model>(&self, query: Select<M>) -> Result<Option<M>> {
        self.run("first", move |s| s.first(&query)).await
    }

    pub async fn count<M: Model>(&self, query: Select<M>) -> Result<i64> {
        self.run("count", move |s| s.count(&query)).await
    }

    pub async fn get<M: Model>(&self, pk: impl Into<Value>) -> Result<Option<M>> {
        let pk = pk.into();
        self.run("get", move |s| s.get::<M>(pk)).await
    }

    /// Raw statement on `bind`; returns the number of changed rows
    pub async fn execute(
        &self,
        bind: Option<&str>,
        sql: impl Into<String>,
        params: Vec<Value>,
    ) -> Result<usize> {
        let bind = bind.map(str::to_string);
        let sql = sql.into();
        self.run("execute", move |s| {
            s.execute(bind.as_deref(), &sql, params_from_iter(params.iter()))
        })
        .await
    }

    pub async fn commit(&self) -> Result<()> {
        self.run("commit", |s| s.commit()).await
    }

    pub async fn rollback(&self) -> Result<()> {
        self.run("rollback", |s| s.rollback()).await
    }

    pub async fn close(&self) -> Result<()> {
        self.run("close", |s| s.close()).await
    }

    pub async fn in_transaction(&self) -> Result<bool> {
        self.run("in_transaction", |s| Ok(s.in_transaction())).await
    }
}

impl std::fmt::Debug for AsyncSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncSession").field("id", &self.id).finish()
    }
}
