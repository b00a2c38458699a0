//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ├── ErrorKind::Connection  → fatal to the operation, no retry    │
//! │       ├── ErrorKind::Query       → rolled back, connection reusable    │
//! │       └── ErrorKind::Validation  → rejected before any SQL             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller (operator CLI) reports the kind, lets the operator retry       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use sms_core::{SchemaError, ValidationError};
use thiserror::Error;

/// Coarse error category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The database could not be reached or a connection could not be held.
    Connection,
    /// A single statement failed; its transaction was rolled back.
    Query,
    /// Input or schema rejected before reaching the database.
    Validation,
}

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be opened or created
    /// - File permissions issue
    /// - Using a connection manager after it was closed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Pool exhausted (no connection became free within the acquire timeout).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A statement did not finish within the statement timeout.
    #[error("Statement timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled a statement before it finished.
    #[error("Statement cancelled")]
    Cancelled,

    /// Unique or primary key constraint violation.
    ///
    /// ## When This Occurs
    /// - Linking the same store and item twice in an association table
    /// - Inserting an explicit key that already exists
    #[error("Duplicate value for {constraint}")]
    UniqueViolation { constraint: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a store, item or person that does not exist
    /// - Deleting a row that other rows still reference
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// NOT NULL constraint violation.
    #[error("{column} must not be null")]
    NotNullViolation { column: String },

    /// Query execution failed.
    ///
    /// ## When This Occurs
    /// - Value count does not match the insert column count
    /// - A value of the wrong type for a column (CHECK constraint)
    /// - Any other runtime SQL error
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Commit or rollback failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// A stored cell could not be converted to its column's declared type.
    #[error("Cannot decode column {column}: {reason}")]
    Decode { column: String, reason: String },

    /// Table name is not in the schema registry.
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Column name is not part of the table's schema.
    #[error("Unknown column {column} in table {table}")]
    UnknownColumn { table: String, column: String },

    /// A column was named twice in one update.
    #[error("Column {column} given more than once for table {table}")]
    DuplicateColumn { table: String, column: String },

    /// A table name was registered twice.
    #[error("Table {0} is already registered")]
    DuplicateTable(String),

    /// Lookup by generated key on a table that has none.
    #[error("Table {0} has no generated key")]
    NoGeneratedKey(String),

    /// Malformed schema descriptor.
    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),

    /// Operator input rejected at the boundary.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates an UnknownColumn error.
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        DbError::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Category of this error.
    ///
    /// ## Example
    /// ```rust
    /// use sms_db::error::{DbError, ErrorKind};
    ///
    /// assert_eq!(DbError::PoolExhausted.kind(), ErrorKind::Connection);
    /// assert_eq!(DbError::Cancelled.kind(), ErrorKind::Query);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::ConnectionFailed(_) | DbError::PoolExhausted | DbError::Timeout(_) => {
                ErrorKind::Connection
            }
            DbError::Schema(_) | DbError::Validation(_) => ErrorKind::Validation,
            _ => ErrorKind::Query,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// sqlx::Error::Io             → DbError::ConnectionFailed
/// sqlx::Error::ColumnDecode   → DbError::Decode
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // "UNIQUE constraint failed: <table>.<column>[, <table>.<column>]"
                // "FOREIGN KEY constraint failed"
                // "NOT NULL constraint failed: <table>.<column>"
                if let Some(constraint) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        constraint: constraint.to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if let Some(column) = msg.strip_prefix("NOT NULL constraint failed: ") {
                    DbError::NotNullViolation {
                        column: column.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::Io(io) => DbError::ConnectionFailed(io.to_string()),

            sqlx::Error::ColumnDecode { index, source } => DbError::Decode {
                column: index,
                reason: source.to_string(),
            },

            _ => DbError::Internal(err.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            DbError::ConnectionFailed("refused".into()).kind(),
            ErrorKind::Connection
        );
        assert_eq!(
            DbError::Timeout(Duration::from_secs(1)).kind(),
            ErrorKind::Connection
        );
        assert_eq!(DbError::QueryFailed("x".into()).kind(), ErrorKind::Query);
        assert_eq!(
            DbError::unknown_column("Worker", "Salary").kind(),
            ErrorKind::Query
        );
        assert_eq!(
            DbError::from(ValidationError::Required {
                field: "Name".into()
            })
            .kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_pool_errors_map_to_connection() {
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::PoolExhausted
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_messages() {
        let err = DbError::unknown_column("Worker", "Salary");
        assert_eq!(err.to_string(), "Unknown column Salary in table Worker");

        let err = DbError::UniqueViolation {
            constraint: "StoreFoodProduct.StoreID, StoreFoodProduct.FoodID".into(),
        };
        assert_eq!(
            err.to_string(),
            "Duplicate value for StoreFoodProduct.StoreID, StoreFoodProduct.FoodID"
        );
    }
}
