//! # sms-core: Pure Types for the Store Management System
//!
//! Schema descriptors, dynamically typed values and rows, entity schemas and
//! the derivations computed over fetched rows. Zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SMS Architecture                                 │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Operator CLI (external collaborator)               │   │
//! │  │     menus ──► coerce input ──► one table operation per choice   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  ★ sms-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  schema   │  │   value   │  │  entity   │  │ validation│  │   │
//! │  │   │TableSchema│  │ Value/Row │  │ schemas + │  │  coerce   │  │   │
//! │  │   │ ColumnDef │  │           │  │ salaries  │  │  input    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    sms-db (Database Layer)                      │   │
//! │  │        GenericTable, ConnectionManager, SchemaRegistry          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`schema`] - Ordered column definitions and identifier rules
//! - [`value`] - Cell values and rows
//! - [`entity`] - Entity schemas and derived computations
//! - [`validation`] - Boundary coercion of operator input
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use sms_core::entity;
//! use sms_core::validation::coerce_row;
//!
//! let worker = entity::worker().unwrap();
//! let values = coerce_row(
//!     &worker,
//!     &["Jonas", "37060000000", "jonas@example.com", "Lithuania", "15", "40", ""],
//! )
//! .unwrap();
//!
//! assert_eq!(values.len(), worker.insert_columns().count());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod entity;
pub mod error;
pub mod schema;
pub mod validation;
pub mod value;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, SchemaError, ValidationError};
pub use schema::{ColumnDef, ColumnType, ForeignKey, TableSchema};
pub use value::{Row, Value};
