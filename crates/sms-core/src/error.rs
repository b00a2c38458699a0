//! # Error Types
//!
//! Domain-specific error types for sms-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  sms-core errors (this file)                                           │
//! │  ├── SchemaError      - Malformed schema descriptors                   │
//! │  ├── ValidationError  - Operator input that cannot become a Value      │
//! │  └── CoreError        - Derivations over fetched rows                  │
//! │                                                                         │
//! │  sms-db errors (separate crate)                                        │
//! │  └── DbError          - Connection and statement failures              │
//! │                                                                         │
//! │  Flow: ValidationError ──► (boundary, never reaches the database)      │
//! │        SchemaError     ──► DbError::Schema (registry construction)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised by the pure derivations in [`crate::entity`].
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// The row has no column with this name.
    ///
    /// ## When This Occurs
    /// - A derivation is applied to a row of another entity
    /// - A projection dropped the column
    #[error("Row has no column named {0}")]
    MissingField(String),

    /// The column holds a value of an unexpected type.
    #[error("Column {column} holds {found}, expected {expected}")]
    FieldType {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Integer arithmetic overflowed.
    #[error("Arithmetic overflow computing {0}")]
    Overflow(&'static str),

    /// An expense exceeds the store manager's petty cash.
    ///
    /// ## User Workflow
    /// ```text
    /// Record expense (450)
    ///      │
    ///      ▼
    /// Check petty cash: available=300
    ///      │
    ///      ▼
    /// InsufficientPettyCash { available: 300, requested: 450 }
    /// ```
    #[error("Insufficient petty cash: available {available}, requested {requested}")]
    InsufficientPettyCash { available: i64, requested: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur at the boundary, when operator input cannot be coerced to
/// the type a column expects. They never reach the database.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g. a non-numeric phone number, a bad date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an InvalidFormat error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Schema Error
// =============================================================================

/// Errors raised while building a [`crate::schema::TableSchema`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    /// Table or column name outside the allowed identifier alphabet.
    #[error("Invalid identifier '{0}': use 1-64 letters, digits, '_' or spaces, starting with a letter or '_'")]
    InvalidIdentifier(String),

    /// The schema declares no columns.
    #[error("Table {0} has no columns")]
    NoColumns(String),

    /// A column name appears twice.
    #[error("Table {table} declares column {column} more than once")]
    DuplicateColumn { table: String, column: String },

    /// A composite key names a column that is not in the schema.
    #[error("Table {table} key refers to unknown column {column}")]
    UnknownKeyColumn { table: String, column: String },

    /// More than one key was declared.
    #[error("Table {0} declares more than one primary key")]
    MultiplePrimaryKeys(String),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
