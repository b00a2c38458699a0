//! # Validation Module
//!
//! Boundary coercion of operator input into typed [`Value`]s.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Operator input (raw text, one line per field)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Coerce text to the column's declared type                         │
//! │  └── Reject bad input with ValidationError (never reaches the DB)      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── PRIMARY KEY / composite key uniqueness                            │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sms_core::schema::ColumnDef;
//! use sms_core::validation::coerce;
//! use sms_core::Value;
//!
//! let phone = ColumnDef::integer("PhoneNumber");
//! assert_eq!(coerce(&phone, "37060000000").unwrap(), Value::Integer(37060000000));
//! assert!(coerce(&phone, "not a number").is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::schema::{ColumnDef, ColumnType, TableSchema};
use crate::value::Value;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum accepted length of a text value.
pub const MAX_TEXT_LEN: usize = 255;

/// Date format accepted from operators and stored in DATE columns.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Coercion
// =============================================================================

/// Coerces raw operator text to the value a column expects.
///
/// ## Rules
/// - Input is trimmed
/// - Empty input is `Value::Null` for nullable columns, `Required` otherwise
/// - INTEGER: signed 64-bit whole number
/// - REAL: any finite decimal number
/// - BOOLEAN: `true/false`, `yes/no`, `y/n`, `1/0` (case-insensitive)
/// - DATE: `YYYY-MM-DD`
/// - TEXT: at most [`MAX_TEXT_LEN`] characters
pub fn coerce(column: &ColumnDef, raw: &str) -> ValidationResult<Value> {
    let raw = raw.trim();
    let field = column.name.as_str();

    if raw.is_empty() {
        return if column.is_nullable() {
            Ok(Value::Null)
        } else {
            Err(ValidationError::Required {
                field: field.to_string(),
            })
        };
    }

    match column.ty {
        ColumnType::Integer => raw
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| ValidationError::invalid_format(field, "expected a whole number")),

        ColumnType::Real => match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Value::Real(v)),
            _ => Err(ValidationError::invalid_format(field, "expected a number")),
        },

        ColumnType::Boolean => parse_bool(raw)
            .map(Value::Boolean)
            .ok_or_else(|| ValidationError::invalid_format(field, "expected yes or no")),

        ColumnType::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|_| ValidationError::invalid_format(field, "expected a date as YYYY-MM-DD")),

        ColumnType::Text => {
            if raw.chars().count() > MAX_TEXT_LEN {
                return Err(ValidationError::TooLong {
                    field: field.to_string(),
                    max: MAX_TEXT_LEN,
                });
            }
            Ok(Value::Text(raw.to_string()))
        }
    }
}

/// Coerces a full insert value list, in schema insert order.
///
/// `raws` must have one entry per insert column (every column except the
/// generated key).
pub fn coerce_row(schema: &TableSchema, raws: &[&str]) -> ValidationResult<Vec<Value>> {
    let columns: Vec<&ColumnDef> = schema.insert_columns().collect();

    if raws.len() != columns.len() {
        return Err(ValidationError::OutOfRange {
            field: format!("{} values", schema.name()),
            min: columns.len() as i64,
            max: columns.len() as i64,
        });
    }

    columns
        .into_iter()
        .zip(raws)
        .map(|(column, raw)| coerce(column, raw))
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an email address shape.
///
/// ## Rules
/// - Exactly one `@`
/// - Non-empty local part, domain containing a dot
/// - No whitespace
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let shape_ok = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !shape_ok || email.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid_format("email", "expected name@domain"));
    }

    Ok(())
}

/// Validates a phone number and returns its numeric form.
///
/// ## Rules
/// - Optional leading `+`
/// - 6 to 15 digits, nothing else
///
/// ## Example
/// ```rust
/// use sms_core::validation::validate_phone;
///
/// assert_eq!(validate_phone("+37060000000").unwrap(), 37060000000);
/// assert!(validate_phone("37O60").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<i64> {
    let phone = phone.trim();
    let digits = phone.strip_prefix('+').unwrap_or(phone);

    if digits.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid_format("phone", "digits only"));
    }

    if !(6..=15).contains(&digits.len()) {
        return Err(ValidationError::OutOfRange {
            field: "phone digits".to_string(),
            min: 6,
            max: 15,
        });
    }

    digits
        .parse::<i64>()
        .map_err(|_| ValidationError::invalid_format("phone", "too large"))
}

// =============================================================================
// Unit Tests
// =============================================================================
