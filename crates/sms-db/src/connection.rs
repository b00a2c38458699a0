//! # Connection Manager
//!
//! Owns one pooled connection and the transaction open on it.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  open(db) ──► pool.begin() ──► [Open]                                  │
//! │                                  │                                      │
//! │                 execute / fetch_all (many, same transaction)           │
//! │                                  │                                      │
//! │               ┌──────────────────┼───────────────────┐                  │
//! │               ▼                  ▼                   ▼                  │
//! │           commit()          rollback()         close() / drop          │
//! │               │                  │                   │                  │
//! │               └──────────────────┴───────────────────┘                  │
//! │                                  ▼                                      │
//! │                  [Closed] connection returned to the pool              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Statements issued after an error still run on the same connection once
//! the caller has rolled back; SQLite keeps no aborted-transaction state.
//! Dropping an open manager rolls back.
//!
//! A statement that outlives the statement timeout, or whose cancel future
//! fires, is interrupted inside SQLite through a progress handler. The call
//! returns only after SQLite has stopped, so a following rollback is
//! immediate.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use sms_core::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Sqlite, Transaction};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::sql::Statement;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, <Sqlite as sqlx::Database>::Arguments<'q>>;

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    /// Rowid of the most recent successful insert on this connection.
    pub last_insert_rowid: i64,
}

/// A live connection with an open transaction.
///
/// ## Usage
/// ```rust,ignore
/// let mut conn = ConnectionManager::open(&db).await?;
/// conn.execute(&statement).await?;
/// conn.commit().await?;
/// ```
pub struct ConnectionManager {
    tx: Option<Transaction<'static, Sqlite>>,
    statement_timeout: Duration,
}

impl ConnectionManager {
    /// Takes a connection from the pool and begins a transaction.
    ///
    /// ## Errors
    /// - `DbError::PoolExhausted` when no connection frees up in time
    /// - `DbError::ConnectionFailed` when the database can't be opened
    pub async fn open(db: &Database) -> DbResult<Self> {
        let tx = db.pool().begin().await.map_err(|e| match e {
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            other => DbError::ConnectionFailed(other.to_string()),
        })?;

        debug!("Connection opened");

        Ok(ConnectionManager {
            tx: Some(tx),
            statement_timeout: db.statement_timeout(),
        })
    }

    /// True until commit, rollback or close.
    pub fn is_open(&self) -> bool {
        self.tx.is_some()
    }

    fn transaction(&mut self) -> DbResult<&mut Transaction<'static, Sqlite>> {
        self.tx.as_mut().ok_or_else(closed)
    }

    /// Runs a statement that returns no rows.
    ///
    /// Fails with `DbError::Timeout` once the statement has run longer than
    /// the configured statement timeout.
    pub async fn execute(&mut self, statement: &Statement) -> DbResult<ExecOutcome> {
        self.execute_or_cancel(statement, std::future::pending::<()>()).await
    }

    /// Runs a statement and returns every row it produces.
    pub async fn fetch_all(&mut self, statement: &Statement) -> DbResult<Vec<SqliteRow>> {
        let timeout = self.statement_timeout;
        let tx = self.transaction()?;
        let interrupt = Interrupt::arm(tx, timeout).await?;

        debug!(sql = %statement.sql, params = statement.params.len(), "Fetching rows");

        let query = bind_params(sqlx::query(&statement.sql), &statement.params);
        let pending = std::future::pending::<()>();
        let result = run_until_cancelled(&interrupt, query.fetch_all(&mut **tx), pending).await;

        interrupt.finish(result, statement)
    }

    /// Runs a statement unless `cancel` completes first.
    ///
    /// When `cancel` fires, SQLite is told to stop the statement and this
    /// waits for it to do so, then returns `DbError::Cancelled`. The
    /// connection is idle again by then; the caller should roll back.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    /// let result = conn.execute_or_cancel(&stmt, async { let _ = rx.await; }).await;
    /// ```
    pub async fn execute_or_cancel<F>(
        &mut self,
        statement: &Statement,
        cancel: F,
    ) -> DbResult<ExecOutcome>
    where
        F: Future<Output = ()>,
    {
        let timeout = self.statement_timeout;
        let tx = self.transaction()?;
        let interrupt = Interrupt::arm(tx, timeout).await?;

        debug!(sql = %statement.sql, params = statement.params.len(), "Executing statement");

        let query = bind_params(sqlx::query(&statement.sql), &statement.params);
        let result = run_until_cancelled(&interrupt, query.execute(&mut **tx), cancel).await;

        interrupt.finish(result, statement).map(|done| ExecOutcome {
            rows_affected: done.rows_affected(),
            last_insert_rowid: done.last_insert_rowid(),
        })
    }

    /// Commits the transaction and releases the connection.
    ///
    /// Fails with `DbError::ConnectionFailed` on a closed manager.
    pub async fn commit(&mut self) -> DbResult<()> {
        let tx = self.tx.take().ok_or_else(closed)?;
        tx.commit().await?;
        debug!("Transaction committed");
        Ok(())
    }

    /// Rolls back the transaction and releases the connection.
    ///
    /// No-op on a closed manager.
    pub async fn rollback(&mut self) -> DbResult<()> {
        match self.tx.take() {
            Some(tx) => {
                tx.rollback()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                debug!("Transaction rolled back");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Discards uncommitted work and releases the connection. Idempotent.
    pub async fn close(&mut self) -> DbResult<()> {
        self.rollback().await
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if self.tx.is_some() {
            debug!("Connection dropped while open, rolling back");
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("open", &self.is_open())
            .field("statement_timeout", &self.statement_timeout)
            .finish()
    }
}

// =============================================================================
// Statement Interruption
// =============================================================================

/// VM instructions between progress checks.
const PROGRESS_OPS: i32 = 1_000;

/// Stop conditions for the statement running on one connection.
///
/// SQLite polls this from its progress handler while the statement steps,
/// so a timeout or cancel halts the statement inside the engine and the
/// connection is free as soon as the call returns.
#[derive(Debug)]
struct StopFlags {
    deadline: Instant,
    armed: AtomicBool,
    cancelled: AtomicBool,
    timed_out: AtomicBool,
}

impl StopFlags {
    /// Progress handler body: `false` interrupts the statement.
    fn keep_going(&self) -> bool {
        if !self.armed.load(Ordering::Acquire) {
            return true;
        }
        if self.cancelled.load(Ordering::Acquire) {
            return false;
        }
        if Instant::now() >= self.deadline {
            self.timed_out.store(true, Ordering::Release);
            return false;
        }
        true
    }
}

/// Progress handler installed for one statement.
///
/// Dropping it disarms the handler, which stays registered on the
/// connection until the next statement replaces it.
struct Interrupt {
    flags: Arc<StopFlags>,
    timeout: Duration,
}

impl Interrupt {
    async fn arm(tx: &mut Transaction<'static, Sqlite>, timeout: Duration) -> DbResult<Self> {
        let flags = Arc::new(StopFlags {
            deadline: Instant::now() + timeout,
            armed: AtomicBool::new(true),
            cancelled: AtomicBool::new(false),
            timed_out: AtomicBool::new(false),
        });

        let polled = Arc::clone(&flags);
        let mut handle = tx.lock_handle().await?;
        handle.set_progress_handler(PROGRESS_OPS, move || polled.keep_going());

        Ok(Interrupt { flags, timeout })
    }

    fn cancel(&self) {
        self.flags.cancelled.store(true, Ordering::Release);
    }

    /// Maps the statement result, taking a stop request over any SQLite error.
    fn finish<T>(&self, result: Result<T, sqlx::Error>, statement: &Statement) -> DbResult<T> {
        if self.flags.cancelled.load(Ordering::Acquire) {
            warn!(sql = %statement.sql, "Statement cancelled");
            return Err(DbError::Cancelled);
        }

        match result {
            Ok(value) => Ok(value),
            Err(_) if self.flags.timed_out.load(Ordering::Acquire) => {
                warn!(sql = %statement.sql, timeout = ?self.timeout, "Statement timed out");
                Err(DbError::Timeout(self.timeout))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for Interrupt {
    fn drop(&mut self) {
        self.flags.armed.store(false, Ordering::Release);
    }
}

/// Drives `work` to completion. If `cancel` fires first the statement is
/// flagged for interruption and still awaited, so it never outlives the call.
async fn run_until_cancelled<T, W, C>(
    interrupt: &Interrupt,
    work: W,
    cancel: C,
) -> Result<T, sqlx::Error>
where
    W: Future<Output = Result<T, sqlx::Error>>,
    C: Future<Output = ()>,
{
    tokio::pin!(work);
    tokio::pin!(cancel);

    let finished = tokio::select! {
        biased;

        _ = &mut cancel => None,
        result = &mut work => Some(result),
    };

    match finished {
        Some(result) => result,
        None => {
            interrupt.cancel();
            work.await
        }
    }
}

fn closed() -> DbError {
    DbError::ConnectionFailed("connection is closed".to_string())
}

/// Binds each value with the SQLite type that matches its variant.
fn bind_params<'q>(mut query: SqliteQuery<'q>, params: &'q [Value]) -> SqliteQuery<'q> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<i64>),
            Value::Integer(v) => query.bind(*v),
            Value::Real(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.as_str()),
            Value::Boolean(v) => query.bind(*v),
            Value::Date(v) => query.bind(*v),
        };
    }
    query
}

// =============================================================================
// Unit Tests
// =============================================================================
