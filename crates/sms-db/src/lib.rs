//! # sms-db: Database Layer for the Store Management System
//!
//! Schema-driven persistence for every store management entity.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SMS Data Flow                                    │
//! │                                                                         │
//! │  Operator choice ("update worker hourly rate")                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     sms-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │SchemaRegistry │    │ GenericTable  │    │ Connection   │  │   │
//! │  │   │ (registry.rs) │───►│  (table.rs)   │───►│  Manager     │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ name → schema │    │ sql.rs builds │    │ transaction  │  │   │
//! │  │   │ allow-list    │    │ statements    │    │ per op       │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────┬───────┘  │   │
//! │  │                                                     │          │   │
//! │  │                               Database (pool.rs) ◄──┘          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (DB_NAME)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Pool settings, loaded from the environment
//! - [`pool`] - Connection pool creation
//! - [`connection`] - Connection and transaction lifecycle
//! - [`sql`] - Statement builders
//! - [`table`] - Generic schema-driven table
//! - [`registry`] - Table name allow-list
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sms_db::{Database, DbConfig, SchemaRegistry};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//! let registry = SchemaRegistry::standard()?;
//! registry.create_all(&db).await?;
//!
//! let workers = registry.table(&db, "Worker").await?;
//! for row in workers.select_all().await? {
//!     println!("{}", sms_core::entity::worker_salary(&row)?);
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod connection;
pub mod error;
pub mod pool;
pub mod registry;
pub mod sql;
pub mod table;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, DbConfig};
pub use connection::{ConnectionManager, ExecOutcome};
pub use error::{DbError, DbResult, ErrorKind};
pub use pool::Database;
pub use registry::SchemaRegistry;
pub use sql::{OnConflict, Statement};
pub use table::{GenericTable, LiveColumn};
