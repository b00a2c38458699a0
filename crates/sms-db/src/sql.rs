//! # Statement Builders
//!
//! Pure functions that turn a [`TableSchema`] plus values into SQL text and
//! an ordered parameter list.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Identifiers  → always double-quoted, taken only from a TableSchema    │
//! │  Values       → always bound as ?1, ?2, ... never formatted into SQL   │
//! │  Column order → schema order, so rows decode positionally              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers check column names against the schema before building; the
//! builders themselves assume valid input.

use sms_core::schema::{ColumnDef, ColumnType, TableSchema};
use sms_core::Value;

/// SQL text plus the values bound to its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    /// A statement without parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Statement {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// A statement with bound parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Statement {
            sql: sql.into(),
            params,
        }
    }
}

/// Quotes an identifier for SQLite, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn column_list(schema: &TableSchema) -> String {
    schema
        .column_names()
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// DDL
// =============================================================================

/// Column definition clause used inside CREATE TABLE.
///
/// Each non-key column carries a CHECK on its storage class, so a value of
/// the wrong type is rejected by SQLite instead of being stored as-is.
fn column_clause(column: &ColumnDef) -> String {
    let name = quote_ident(&column.name);
    let mut clause = format!("{} {}", name, column.ty.sql_name());

    if column.primary_key {
        clause.push_str(" PRIMARY KEY");
    } else if column.not_null {
        clause.push_str(" NOT NULL");
    }

    if let Some(fk) = &column.references {
        clause.push_str(&format!(
            " REFERENCES {} ({})",
            quote_ident(&fk.table),
            quote_ident(&fk.column)
        ));
    }

    // INTEGER PRIMARY KEY is the rowid alias and already integer-only
    if !column.is_generated() {
        let check = match column.ty {
            ColumnType::Integer => format!("typeof({}) IN ('integer', 'null')", name),
            ColumnType::Real => format!("typeof({}) IN ('real', 'integer', 'null')", name),
            ColumnType::Text | ColumnType::Date => {
                format!("typeof({}) IN ('text', 'null')", name)
            }
            ColumnType::Boolean => format!("{} IN (0, 1)", name),
        };
        clause.push_str(&format!(" CHECK ({})", check));
    }

    clause
}

/// `CREATE TABLE IF NOT EXISTS` for the schema.
pub fn create_table(schema: &TableSchema) -> Statement {
    let mut parts: Vec<String> = schema.columns().iter().map(column_clause).collect();

    if !schema.composite_key().is_empty() {
        let key = schema
            .composite_key()
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("PRIMARY KEY ({})", key));
    }

    Statement::new(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(schema.name()),
        parts.join(", ")
    ))
}

/// `DROP TABLE IF EXISTS` for the schema.
pub fn drop_table(schema: &TableSchema) -> Statement {
    Statement::new(format!("DROP TABLE IF EXISTS {}", quote_ident(schema.name())))
}

/// Live column metadata as SQLite reports it.
pub fn table_info(schema: &TableSchema) -> Statement {
    Statement::new(format!("PRAGMA table_info({})", quote_ident(schema.name())))
}

// =============================================================================
// DML
// =============================================================================

/// INSERT over the schema's insert columns.
///
/// One placeholder is generated per supplied value, so a count mismatch
/// reaches SQLite and fails there.
pub fn insert(schema: &TableSchema, values: Vec<Value>) -> Statement {
    let columns = schema
        .insert_columns()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");

    Statement::with_params(
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(schema.name()),
            columns,
            placeholders(1, values.len())
        ),
        values,
    )
}

/// What a batch insert does with a row that collides with an existing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnConflict {
    /// The whole batch fails with the uniqueness error.
    #[default]
    Fail,
    /// The row is skipped and the batch carries on.
    Skip,
}

/// INSERT that silently skips rows violating a uniqueness constraint.
///
/// Other constraint failures (NOT NULL, CHECK, foreign keys) still fail.
pub fn insert_or_skip(schema: &TableSchema, values: Vec<Value>) -> Statement {
    let mut statement = insert(schema, values);
    statement.sql.push_str(" ON CONFLICT DO NOTHING");
    statement
}

/// UPDATE ... SET ... WHERE id_column = ?
///
/// Returns `None` when there is nothing to set.
pub fn update(
    schema: &TableSchema,
    id_column: &str,
    id_value: Value,
    changes: Vec<(&str, Value)>,
) -> Option<Statement> {
    if changes.is_empty() {
        return None;
    }

    let assignments = changes
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{} = ?{}", quote_ident(column), i + 1))
        .collect::<Vec<_>>()
        .join(", ");

    let where_index = changes.len() + 1;
    let mut params: Vec<Value> = changes.into_iter().map(|(_, v)| v).collect();
    params.push(id_value);

    Some(Statement::with_params(
        format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote_ident(schema.name()),
            assignments,
            quote_ident(id_column),
            where_index
        ),
        params,
    ))
}

/// DELETE ... WHERE id_column = ?
pub fn delete(schema: &TableSchema, id_column: &str, id_value: Value) -> Statement {
    Statement::with_params(
        format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(schema.name()),
            quote_ident(id_column)
        ),
        vec![id_value],
    )
}

/// SELECT DISTINCT over all columns in schema order.
pub fn select_all(schema: &TableSchema, order_by: Option<&str>) -> Statement {
    let mut sql = format!(
        "SELECT DISTINCT {} FROM {}",
        column_list(schema),
        quote_ident(schema.name())
    );
    if let Some(column) = order_by {
        sql.push_str(&format!(" ORDER BY {}", quote_ident(column)));
    }
    Statement::new(sql)
}

/// SELECT all columns of rows where `column = value`.
pub fn select_where(schema: &TableSchema, column: &str, value: Value) -> Statement {
    Statement::with_params(
        format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            column_list(schema),
            quote_ident(schema.name()),
            quote_ident(column)
        ),
        vec![value],
    )
}

/// SELECT COUNT(*).
pub fn count(schema: &TableSchema) -> Statement {
    Statement::new(format!("SELECT COUNT(*) FROM {}", quote_ident(schema.name())))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sms_core::entity;

    fn responsibilities() -> TableSchema {
        TableSchema::builder("Responsibilities")
            .column(ColumnDef::integer("ResponsibilityID").primary_key())
            .column(ColumnDef::text("ResponsibilityName").not_null())
            .build()
            .unwrap()
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("Store Manager"), "\"Store Manager\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_create_table() {
        let stmt = create_table(&responsibilities());
        assert_eq!(
            stmt.sql,
            "CREATE TABLE IF NOT EXISTS \"Responsibilities\" (\
             \"ResponsibilityID\" INTEGER PRIMARY KEY, \
             \"ResponsibilityName\" TEXT NOT NULL CHECK (typeof(\"ResponsibilityName\") IN ('text', 'null')))"
        );
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_create_association_table() {
        let stmt = create_table(&entity::store_food_product().unwrap());
        assert!(stmt
            .sql
            .starts_with("CREATE TABLE IF NOT EXISTS \"StoreFoodProduct\" ("));
        assert!(stmt
            .sql
            .contains("\"StoreID\" INTEGER NOT NULL REFERENCES \"Store\" (\"StoreID\")"));
        assert!(stmt.sql.ends_with("PRIMARY KEY (\"StoreID\", \"FoodID\"))"));
    }

    #[test]
    fn test_boolean_and_date_checks() {
        let schema = TableSchema::builder("Dry Storage")
            .column(ColumnDef::integer("DryStorageID").primary_key())
            .column(ColumnDef::boolean("Chemical"))
            .column(ColumnDef::date("Received"))
            .build()
            .unwrap();

        let sql = create_table(&schema).sql;
        assert!(sql.contains("\"Chemical\" BOOLEAN CHECK (\"Chemical\" IN (0, 1))"));
        assert!(sql.contains("\"Received\" DATE CHECK (typeof(\"Received\") IN ('text', 'null'))"));
    }

    #[test]
    fn test_insert_skips_generated_key() {
        let stmt = insert(&responsibilities(), vec![Value::from("Open store")]);
        assert_eq!(
            stmt.sql,
            "INSERT INTO \"Responsibilities\" (\"ResponsibilityName\") VALUES (?1)"
        );
        assert_eq!(stmt.params, vec![Value::from("Open store")]);
    }

    #[test]
    fn test_insert_placeholders_follow_values() {
        let stmt = insert(&responsibilities(), vec![Value::from("a"), Value::from("b")]);
        assert!(stmt.sql.ends_with("VALUES (?1, ?2)"));
    }

    #[test]
    fn test_insert_or_skip() {
        let stmt = insert_or_skip(
            &entity::store_food_product().unwrap(),
            vec![Value::Integer(1), Value::Integer(2)],
        );
        assert_eq!(
            stmt.sql,
            "INSERT INTO \"StoreFoodProduct\" (\"StoreID\", \"FoodID\") VALUES (?1, ?2) \
             ON CONFLICT DO NOTHING"
        );
        assert_eq!(stmt.params.len(), 2);
    }

    #[test]
    fn test_update() {
        let stmt = update(
            &entity::worker().unwrap(),
            "WorkerID",
            Value::Integer(1),
            vec![("HourlyRate", Value::Integer(20)), ("Country", "Latvia".into())],
        )
        .unwrap();

        assert_eq!(
            stmt.sql,
            "UPDATE \"Worker\" SET \"HourlyRate\" = ?1, \"Country\" = ?2 WHERE \"WorkerID\" = ?3"
        );
        assert_eq!(
            stmt.params,
            vec![Value::Integer(20), Value::from("Latvia"), Value::Integer(1)]
        );
    }

    #[test]
    fn test_empty_update_builds_nothing() {
        assert!(update(&responsibilities(), "ResponsibilityID", Value::Integer(1), vec![]).is_none());
    }

    #[test]
    fn test_delete_and_selects() {
        let schema = responsibilities();

        let stmt = delete(&schema, "ResponsibilityID", Value::Integer(7));
        assert_eq!(
            stmt.sql,
            "DELETE FROM \"Responsibilities\" WHERE \"ResponsibilityID\" = ?1"
        );
        assert_eq!(stmt.params, vec![Value::Integer(7)]);

        assert_eq!(
            select_all(&schema, None).sql,
            "SELECT DISTINCT \"ResponsibilityID\", \"ResponsibilityName\" FROM \"Responsibilities\""
        );
        assert!(select_all(&schema, Some("ResponsibilityName"))
            .sql
            .ends_with(" ORDER BY \"ResponsibilityName\""));

        let stmt = select_where(&schema, "ResponsibilityName", "Open store".into());
        assert!(stmt.sql.ends_with("WHERE \"ResponsibilityName\" = ?1"));

        assert_eq!(count(&schema).sql, "SELECT COUNT(*) FROM \"Responsibilities\"");
        assert_eq!(drop_table(&schema).sql, "DROP TABLE IF EXISTS \"Responsibilities\"");
        assert_eq!(table_info(&schema).sql, "PRAGMA table_info(\"Responsibilities\")");
    }
}
