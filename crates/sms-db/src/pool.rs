//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  DbConfig::from_env() / DbConfig::new(path)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       │ One ConnectionManager per table operation                      │
//! │       ▼                                                                 │
//! │  insert ──► begin ─► execute ─► commit ─► connection back to pool      │
//! │  select ──► begin ─► fetch   ─► commit ─► connection back to pool      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! File databases run in WAL (Write-Ahead Logging) mode so readers and the
//! single writer don't block each other. In-memory databases ignore it.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::config::DbConfig;
use crate::connection::ConnectionManager;
use crate::error::{DbError, DbResult};

/// How long a file-backed connection lives before the pool replaces it.
const FILE_MAX_LIFETIME: Duration = Duration::from_secs(30 * 60);

// =============================================================================
// Database
// =============================================================================

/// Main database handle: the pool plus per-statement settings.
///
/// Cheap to clone; clones share the pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::from_env()?).await?;
/// let registry = SchemaRegistry::standard()?;
/// registry.create_all(&db).await?;
/// let workers = registry.table(&db, "Worker").await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,

    /// Deadline applied to every statement run through a ConnectionManager.
    statement_timeout: Duration,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    ///    - Foreign keys enabled
    /// 3. Creates the connection pool
    ///
    /// ## Returns
    /// * `Ok(Database)` - Ready-to-use database handle
    /// * `Err(DbError::ConnectionFailed)` - The file can't be opened
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let base_options = if config.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new().filename(&config.database_path)
        };

        let connect_options = base_options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // SQLite has them disabled by default for backwards compatibility
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("Connection options configured");

        // Every in-memory connection is a separate database, and closing the
        // only one loses the data, so it is never retired
        let (max_connections, idle_timeout, max_lifetime) = if config.is_in_memory() {
            (1, None, None)
        } else {
            (
                config.max_connections,
                Some(config.idle_timeout),
                Some(FILE_MAX_LIFETIME),
            )
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(config.min_connections.min(max_connections))
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(idle_timeout)
            .max_lifetime(max_lifetime)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(max_connections, "Database pool created");

        Ok(Database {
            pool,
            statement_timeout: config.statement_timeout,
        })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Deadline applied to each statement.
    pub fn statement_timeout(&self) -> Duration {
        self.statement_timeout
    }

    /// Opens a connection manager with a fresh transaction.
    pub async fn connect(&self) -> DbResult<ConnectionManager> {
        ConnectionManager::open(self).await
    }

    /// Names of all user tables, sorted.
    ///
    /// SQLite's internal `sqlite_*` tables are excluded.
    pub async fn list_tables(&self) -> DbResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = names.len(), "Listed tables");
        Ok(names)
    }

    /// Closes the database connection pool.
    ///
    /// ## Note
    /// After calling close, every table operation fails with
    /// `DbError::ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        assert_eq!(db.statement_timeout(), Duration::from_secs(5));
        assert!(db.list_tables().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_connection_is_never_retired() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let options = db.pool().options();

        assert_eq!(options.get_max_connections(), 1);
        assert_eq!(options.get_max_lifetime(), None);
        assert_eq!(options.get_idle_timeout(), None);

        let file = std::env::temp_dir().join(format!("sms-lifetime-{}.db", std::process::id()));
        let db = Database::new(DbConfig::new(&file)).await.unwrap();
        assert_eq!(db.pool().options().get_max_lifetime(), Some(FILE_MAX_LIFETIME));
        assert_eq!(
            db.pool().options().get_idle_timeout(),
            Some(Duration::from_secs(600))
        );
        db.close().await;
        let _ = std::fs::remove_file(&file);
    }

    #[tokio::test]
    async fn test_in_memory_databases_are_isolated() {
        let first = Database::new(DbConfig::in_memory()).await.unwrap();
        let second = Database::new(DbConfig::in_memory()).await.unwrap();

        sqlx::query("CREATE TABLE \"Only Here\" (id INTEGER)")
            .execute(first.pool())
            .await
            .unwrap();

        assert_eq!(first.list_tables().await.unwrap(), ["Only Here"]);
        assert!(second.list_tables().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_database() {
        let path = std::env::temp_dir().join(format!("sms-pool-{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let db = Database::new(DbConfig::new(&path).max_connections(2))
            .await
            .unwrap();
        assert!(db.health_check().await);
        db.close().await;
        assert!(!db.health_check().await);

        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }
}
