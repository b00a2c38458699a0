//! # Schema Descriptors
//!
//! The ordered column definitions that drive every statement the database
//! layer generates.
//!
//! ## Descriptor Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TableSchema "Worker"                                                   │
//! │                                                                         │
//! │   #  column         type      flags                                     │
//! │   0  WorkerID       INTEGER   PRIMARY KEY  ◄── generated key            │
//! │   1  Name           TEXT      NOT NULL                                  │
//! │   2  PhoneNumber    INTEGER                                             │
//! │   ...                                                                   │
//! │   7  StoreID        INTEGER   REFERENCES "Store" ("StoreID")            │
//! │                                                                         │
//! │  Order is significant:                                                 │
//! │   • DDL lists columns in this order                                    │
//! │   • INSERT value lists are positional over columns 1..n                │
//! │   • SELECT rows come back in this order                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identifiers are validated when the schema is built, so every name that
//! reaches SQL generation has already passed the allow-list.

use serde::Serialize;

use crate::error::SchemaError;

/// Maximum identifier length (table and column names).
pub const MAX_IDENTIFIER_LEN: usize = 64;

// =============================================================================
// Column Type
// =============================================================================

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Boolean,
    /// Calendar date, stored as `YYYY-MM-DD` text.
    Date,
}

impl ColumnType {
    /// SQL type token used in DDL.
    pub const fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Date => "DATE",
        }
    }

    /// Lowercase name used in error messages, matches [`crate::Value::type_name`].
    pub const fn label(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Real => "real",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
        }
    }
}

// =============================================================================
// Column Definition
// =============================================================================

/// Target of a relationship column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

/// One column of a [`TableSchema`].
///
/// ## Example
/// ```rust
/// use sms_core::schema::ColumnDef;
///
/// let id = ColumnDef::integer("WorkerID").primary_key();
/// let store = ColumnDef::integer("StoreID").references("Store", "StoreID");
///
/// assert!(id.is_generated());
/// assert!(!store.is_generated());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
    pub primary_key: bool,
    pub not_null: bool,
    pub references: Option<ForeignKey>,
}

impl ColumnDef {
    /// Creates a nullable, unconstrained column.
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        ColumnDef {
            name: name.into(),
            ty,
            primary_key: false,
            not_null: false,
            references: None,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Real)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Boolean)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Date)
    }

    /// Marks the column as the table's primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Declares an enforced reference to `table.column`.
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.references = Some(ForeignKey {
            table: table.into(),
            column: column.into(),
        });
        self
    }

    /// True for an `INTEGER PRIMARY KEY` column, which SQLite assigns on insert.
    pub fn is_generated(&self) -> bool {
        self.primary_key && self.ty == ColumnType::Integer
    }

    /// True if the column accepts NULL.
    pub fn is_nullable(&self) -> bool {
        !self.not_null && !self.primary_key
    }
}

// =============================================================================
// Table Schema
// =============================================================================

/// Table name plus ordered column definitions.
///
/// Built only through [`TableSchemaBuilder`], which validates identifiers
/// and key declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    name: String,
    columns: Vec<ColumnDef>,
    composite_key: Vec<String>,
}

impl TableSchema {
    /// Starts building a schema for `name`.
    ///
    /// ## Example
    /// ```rust
    /// use sms_core::schema::{ColumnDef, TableSchema};
    ///
    /// let schema = TableSchema::builder("Responsibilities")
    ///     .column(ColumnDef::integer("ResponsibilityID").primary_key())
    ///     .column(ColumnDef::text("ResponsibilityName").not_null())
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(schema.insert_columns().count(), 1);
    /// ```
    pub fn builder(name: impl Into<String>) -> TableSchemaBuilder {
        TableSchemaBuilder {
            name: name.into(),
            columns: Vec::new(),
            composite_key: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Looks up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Position of a column in schema order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// The generated key column, if the schema declares one.
    pub fn generated_key(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.is_generated())
    }

    /// Columns an insert supplies values for: every column except the
    /// generated key, in schema order.
    pub fn insert_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| !c.is_generated())
    }

    /// Composite primary key columns (empty unless declared).
    pub fn composite_key(&self) -> &[String] {
        &self.composite_key
    }

    /// Tables this schema references.
    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter_map(|c| c.references.as_ref())
            .map(|fk| fk.table.as_str())
    }
}

/// Builder for [`TableSchema`].
#[derive(Debug, Clone)]
pub struct TableSchemaBuilder {
    name: String,
    columns: Vec<ColumnDef>,
    composite_key: Vec<String>,
}

impl TableSchemaBuilder {
    /// Appends a column; order of calls is column order.
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Declares a composite primary key over existing columns.
    pub fn composite_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.composite_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Validates and builds the schema.
    ///
    /// ## Rules
    /// - Table, column and referenced names pass [`is_valid_identifier`]
    /// - At least one column, no duplicate column names
    /// - At most one primary key: one flagged column, or a composite key
    /// - Composite key columns exist in the schema
    pub fn build(self) -> Result<TableSchema, SchemaError> {
        check_identifier(&self.name)?;

        if self.columns.is_empty() {
            return Err(SchemaError::NoColumns(self.name));
        }

        for (i, column) in self.columns.iter().enumerate() {
            check_identifier(&column.name)?;
            if let Some(fk) = &column.references {
                check_identifier(&fk.table)?;
                check_identifier(&fk.column)?;
            }
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(SchemaError::DuplicateColumn {
                    table: self.name,
                    column: column.name.clone(),
                });
            }
        }

        let flagged = self.columns.iter().filter(|c| c.primary_key).count();
        if flagged > 1 || (flagged == 1 && !self.composite_key.is_empty()) {
            return Err(SchemaError::MultiplePrimaryKeys(self.name));
        }

        for key in &self.composite_key {
            if !self.columns.iter().any(|c| &c.name == key) {
                return Err(SchemaError::UnknownKeyColumn {
                    table: self.name,
                    column: key.clone(),
                });
            }
        }

        Ok(TableSchema {
            name: self.name,
            columns: self.columns,
            composite_key: self.composite_key,
        })
    }
}

// =============================================================================
// Identifiers
// =============================================================================

/// Checks a table or column name against the identifier allow-list.
///
/// ## Rules
/// - 1 to 64 characters
/// - ASCII letters, digits, `_` and spaces only
/// - Starts with a letter or `_`
///
/// Spaces are allowed because several tables are named like
/// `"Store Manager"`; names are always quoted in generated SQL.
///
/// ## Example
/// ```rust
/// use sms_core::schema::is_valid_identifier;
///
/// assert!(is_valid_identifier("Store Manager"));
/// assert!(!is_valid_identifier("Worker\"; DROP TABLE x; --"));
/// assert!(!is_valid_identifier("9lives"));
/// ```
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let first_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');

    first_ok
        && name.len() <= MAX_IDENTIFIER_LEN
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ' ')
}

fn check_identifier(name: &str) -> Result<(), SchemaError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier(name.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
