//! Sessions: per-request unit-of-work handles bound to the [`Engine`]
//!
//! - No implicit auto-commit: the first statement begins a transaction that
//!   stays open until `commit`, `rollback` or close.
//! - No implicit auto-flush: staged statements run only on `flush`/`commit`.
//! - A session is closed on every exit path. Dropping an open session closes
//!   it and the driver rolls back any uncommitted transaction.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use sqlx::any::{Any, AnyArguments, AnyQueryResult, AnyRow};
use sqlx::query::Query;
use sqlx::Transaction;
use uuid::Uuid;

use crate::engine::{Backend, Engine};
use crate::error::SessionError;

/// Session behaviour shared by every session a factory opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Run each statement directly on the pool instead of in a session transaction.
    pub auto_commit: bool,
    /// Flush staged statements before every query.
    pub auto_flush: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// Creates sessions bound to one engine.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    engine: Engine,
    config: SessionConfig,
    open_sessions: Arc<AtomicUsize>,
}

impl SessionFactory {
    /// Factory with explicit transaction control (no auto-commit, no auto-flush).
    pub fn new(engine: Engine) -> Self {
        Self::with_config(engine, SessionConfig::default())
    }

    pub fn with_config(engine: Engine, config: SessionConfig) -> Self {
        Self {
            engine,
            config,
            open_sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Open a new session. Never fails; no connection is taken until first use.
    pub fn open(&self) -> Session {
        let id = Uuid::new_v4();
        let open = self.open_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(session = %id, open, "session opened");

        Session {
            id,
            engine: self.engine.clone(),
            config: self.config,
            state: SessionState::Open,
            tx: None,
            pending: Vec::new(),
            open_sessions: Arc::clone(&self.open_sessions),
        }
    }

    /// Number of sessions currently open.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    /// Run `f` with a fresh session and close it afterwards, whether `f`
    /// succeeded or not. Uncommitted work is rolled back.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let count = factory
    ///     .scoped(|session| Box::pin(async move {
    ///         let row = session.fetch_one(sqlx::query("SELECT COUNT(*) FROM messages")).await?;
    ///         session.commit().await?;
    ///         Ok::<_, SessionError>(row.try_get::<i64, _>(0)?)
    ///     }))
    ///     .await?;
    /// ```
    pub async fn scoped<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, Result<T, E>>,
        E: From<SessionError>,
    {
        let mut session = self.open();
        let result = f(&mut session).await;
        let closed = session.close().await;

        let value = result?;
        closed?;
        Ok(value)
    }
}

/// A unit of work. Owned by exactly one request or task.
pub struct Session {
    id: Uuid,
    engine: Engine,
    config: SessionConfig,
    state: SessionState,
    tx: Option<Transaction<'static, Any>>,
    pending: Vec<String>,
    open_sessions: Arc<AtomicUsize>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("in_transaction", &self.tx.is_some())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn backend(&self) -> Backend {
        self.engine.backend()
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// Statements staged but not yet flushed.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Begin the session transaction now instead of on first use.
    pub async fn begin(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.transaction().await?;
        Ok(())
    }

    /// Execute a statement.
    pub async fn execute<'q>(
        &mut self,
        query: Query<'q, Any, AnyArguments<'q>>,
    ) -> Result<AnyQueryResult, SessionError> {
        self.prepare().await?;
        if self.runs_on_pool() {
            return Ok(query.execute(self.engine.pool()).await?);
        }
        let tx = self.transaction().await?;
        Ok(query.execute(&mut **tx).await?)
    }

    /// Fetch exactly one row.
    pub async fn fetch_one<'q>(
        &mut self,
        query: Query<'q, Any, AnyArguments<'q>>,
    ) -> Result<AnyRow, SessionError> {
        self.prepare().await?;
        if self.runs_on_pool() {
            return Ok(query.fetch_one(self.engine.pool()).await?);
        }
        let tx = self.transaction().await?;
        Ok(query.fetch_one(&mut **tx).await?)
    }

    /// Fetch at most one row.
    pub async fn fetch_optional<'q>(
        &mut self,
        query: Query<'q, Any, AnyArguments<'q>>,
    ) -> Result<Option<AnyRow>, SessionError> {
        self.prepare().await?;
        if self.runs_on_pool() {
            return Ok(query.fetch_optional(self.engine.pool()).await?);
        }
        let tx = self.transaction().await?;
        Ok(query.fetch_optional(&mut **tx).await?)
    }

    /// Fetch all rows.
    pub async fn fetch_all<'q>(
        &mut self,
        query: Query<'q, Any, AnyArguments<'q>>,
    ) -> Result<Vec<AnyRow>, SessionError> {
        self.prepare().await?;
        if self.runs_on_pool() {
            return Ok(query.fetch_all(self.engine.pool()).await?);
        }
        let tx = self.transaction().await?;
        Ok(query.fetch_all(&mut **tx).await?)
    }

    /// Stage a statement as a pending change. Nothing touches the database
    /// until [`Session::flush`] or [`Session::commit`].
    pub fn stage(&mut self, sql: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.pending.push(sql.into());
        Ok(())
    }

    /// Execute staged statements. Does not commit.
    pub async fn flush(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        if self.pending.is_empty() {
            return Ok(());
        }

        let pending = std::mem::take(&mut self.pending);
        tracing::debug!(session = %self.id, statements = pending.len(), "flushing session");

        if self.runs_on_pool() {
            for sql in &pending {
                sqlx::query(sql).execute(self.engine.pool()).await?;
            }
            return Ok(());
        }

        let tx = self.transaction().await?;
        for sql in &pending {
            sqlx::query(sql).execute(&mut **tx).await?;
        }
        Ok(())
    }

    /// Flush staged statements and commit the session transaction.
    pub async fn commit(&mut self) -> Result<(), SessionError> {
        self.flush().await?;
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
            tracing::debug!(session = %self.id, "transaction committed");
        }
        Ok(())
    }

    /// Discard staged statements and roll back the session transaction.
    pub async fn rollback(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.pending.clear();
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
            tracing::debug!(session = %self.id, "transaction rolled back");
        }
        Ok(())
    }

    /// Close the session, rolling back uncommitted work and returning the
    /// connection to the pool. Closing twice is a no-op.
    pub async fn close(&mut self) -> Result<(), SessionError> {
        if !self.is_open() {
            return Ok(());
        }

        let tx = self.tx.take();
        self.mark_closed();

        if let Some(tx) = tx {
            tx.rollback().await?;
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Closed => Err(SessionError::Closed),
        }
    }

    async fn prepare(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        if self.config.auto_flush {
            self.flush().await?;
        }
        Ok(())
    }

    /// Auto-commit sessions bypass the transaction unless one was begun explicitly.
    fn runs_on_pool(&self) -> bool {
        self.config.auto_commit && self.tx.is_none()
    }

    async fn transaction(&mut self) -> Result<&mut Transaction<'static, Any>, SessionError> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => {
                let tx = self.engine.pool().begin().await?;
                tracing::debug!(session = %self.id, "transaction started");
                tx
            }
        };
        Ok(self.tx.insert(tx))
    }

    fn mark_closed(&mut self) {
        self.state = SessionState::Closed;
        self.pending.clear();
        let open = self.open_sessions.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::debug!(session = %self.id, open, "session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.is_open() {
            if self.tx.is_some() {
                tracing::debug!(session = %self.id, "dropping session with open transaction, rolling back");
            }
            self.mark_closed();
        }
    }
}
