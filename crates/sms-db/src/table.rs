//! # Generic Table
//!
//! One schema-driven handle per table: DDL, CRUD and lookups for any entity.
//!
//! ## Operation Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GenericTable::insert(values)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sql::insert(schema, values)        ← identifiers from schema only     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ConnectionManager::open ─► execute ─┬─ Ok  ─► commit ─► Ok(key)       │
//! │                                      └─ Err ─► rollback ─► Err(e)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation runs in its own transaction on a pooled connection, so a
//! failed statement never leaves partial work behind and the next call
//! starts clean.

use std::sync::Arc;

use chrono::NaiveDate;
use sms_core::schema::{ColumnDef, ColumnType, TableSchema};
use sms_core::validation::DATE_FORMAT;
use sms_core::{Row, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row as _, TypeInfo, ValueRef};
use tracing::{debug, info, warn};

use crate::connection::{ConnectionManager, ExecOutcome};
use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::sql::{self, OnConflict, Statement};

/// Column name and declared type as SQLite reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveColumn {
    pub name: String,
    pub declared_type: String,
}

/// Schema-driven access to one table.
///
/// ## Example
/// ```rust,ignore
/// let workers = GenericTable::create(&db, Arc::new(entity::worker()?)).await?;
/// let id = workers.insert(values).await?;
/// workers.update("WorkerID", id, vec![("HourlyRate", 20.into())]).await?;
/// ```
#[derive(Debug, Clone)]
pub struct GenericTable {
    db: Database,
    schema: Arc<TableSchema>,
    columns: Arc<[String]>,
}

impl GenericTable {
    /// Binds a schema to the database and creates the table if needed.
    ///
    /// Every table the schema references (other than itself) must already
    /// exist; with foreign keys enforced SQLite would otherwise reject each
    /// insert. [`SchemaRegistry::table`](crate::SchemaRegistry::table)
    /// creates them first.
    ///
    /// ## Errors
    /// - `UnknownTable` naming the first referenced table that is missing
    pub async fn create(db: &Database, schema: Arc<TableSchema>) -> DbResult<Self> {
        {
            let mut references = schema
                .referenced_tables()
                .filter(|t| *t != schema.name())
                .peekable();
            if references.peek().is_some() {
                let existing = db.list_tables().await?;
                if let Some(missing) = references.find(|t| !existing.iter().any(|e| e == *t)) {
                    warn!(table = %schema.name(), missing, "Referenced table does not exist");
                    return Err(DbError::UnknownTable(missing.to_string()));
                }
            }
        }

        let columns: Arc<[String]> = schema.column_names().map(str::to_string).collect();
        let table = GenericTable {
            db: db.clone(),
            schema,
            columns,
        };

        table.run(sql::create_table(&table.schema)).await?;
        info!(table = %table.name(), "Table ready");

        Ok(table)
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts one row.
    ///
    /// `values` follow [`TableSchema::insert_columns`] order. Returns the
    /// generated key, or `None` for tables without one.
    pub async fn insert(&self, values: Vec<Value>) -> DbResult<Option<i64>> {
        debug!(table = %self.name(), values = values.len(), "Inserting row");

        let outcome = self.run(sql::insert(&self.schema, values)).await?;

        Ok(self
            .schema
            .generated_key()
            .map(|_| outcome.last_insert_rowid))
    }

    /// Inserts many rows in one transaction. Returns the number inserted.
    ///
    /// With [`OnConflict::Skip`] a row that repeats an existing key is left
    /// out and the rest still go in. Any other failure, or a duplicate under
    /// [`OnConflict::Fail`], rolls back the whole batch.
    pub async fn insert_many(
        &self,
        rows: Vec<Vec<Value>>,
        on_conflict: OnConflict,
    ) -> DbResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        debug!(table = %self.name(), rows = rows.len(), ?on_conflict, "Inserting batch");

        let mut conn = ConnectionManager::open(&self.db).await?;
        let mut inserted = 0;
        for values in rows {
            let statement = match on_conflict {
                OnConflict::Fail => sql::insert(&self.schema, values),
                OnConflict::Skip => sql::insert_or_skip(&self.schema, values),
            };
            match conn.execute(&statement).await {
                Ok(outcome) => inserted += outcome.rows_affected,
                Err(err) => return Err(self.abandon(conn, err).await),
            }
        }
        conn.commit().await?;

        info!(table = %self.name(), inserted, "Batch inserted");
        Ok(inserted)
    }

    /// Sets the given columns on rows where `id_column = id_value`.
    ///
    /// Only the listed columns change. Returns the number of rows updated;
    /// an empty change list returns 0 without touching the database.
    ///
    /// ## Errors
    /// - `UnknownColumn` if `id_column` or a changed column is not in the schema
    /// - `DuplicateColumn` if a column is listed twice
    pub async fn update(
        &self,
        id_column: &str,
        id_value: impl Into<Value>,
        new_values: Vec<(&str, Value)>,
    ) -> DbResult<u64> {
        self.check_column(id_column)?;
        for (i, (column, _)) in new_values.iter().enumerate() {
            self.check_column(column)?;
            if new_values[..i].iter().any(|(seen, _)| seen == column) {
                return Err(DbError::DuplicateColumn {
                    table: self.name().to_string(),
                    column: column.to_string(),
                });
            }
        }

        let Some(statement) = sql::update(&self.schema, id_column, id_value.into(), new_values)
        else {
            debug!(table = %self.name(), "Empty update skipped");
            return Ok(0);
        };

        debug!(table = %self.name(), column = id_column, "Updating rows");
        Ok(self.run(statement).await?.rows_affected)
    }

    /// Deletes rows where `id_column = id_value`. Returns rows deleted.
    pub async fn delete(&self, id_column: &str, id_value: impl Into<Value>) -> DbResult<u64> {
        self.check_column(id_column)?;

        debug!(table = %self.name(), column = id_column, "Deleting rows");
        let statement = sql::delete(&self.schema, id_column, id_value.into());
        Ok(self.run(statement).await?.rows_affected)
    }

    /// Drops the table. The handle is consumed.
    pub async fn drop_table(self) -> DbResult<()> {
        self.run(sql::drop_table(&self.schema)).await?;
        info!(table = %self.name(), "Table dropped");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All distinct rows, in no particular order.
    pub async fn select_all(&self) -> DbResult<Vec<Row>> {
        self.query(sql::select_all(&self.schema, None)).await
    }

    /// All distinct rows ordered by `column`.
    pub async fn select_all_ordered(&self, column: &str) -> DbResult<Vec<Row>> {
        self.check_column(column)?;
        self.query(sql::select_all(&self.schema, Some(column))).await
    }

    /// Rows where `column = value`.
    pub async fn find_by(&self, column: &str, value: impl Into<Value>) -> DbResult<Vec<Row>> {
        self.check_column(column)?;
        self.query(sql::select_where(&self.schema, column, value.into()))
            .await
    }

    /// The row with the given generated key, if any.
    pub async fn get_by_key(&self, key: i64) -> DbResult<Option<Row>> {
        let column = self
            .schema
            .generated_key()
            .ok_or_else(|| DbError::NoGeneratedKey(self.name().to_string()))?;

        let rows = self
            .query(sql::select_where(&self.schema, &column.name, Value::Integer(key)))
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Number of rows in the table.
    pub async fn count(&self) -> DbResult<i64> {
        let rows = self.fetch(sql::count(&self.schema)).await?;
        match rows.first() {
            Some(row) => Ok(row.try_get_unchecked::<i64, _>(0)?),
            None => Ok(0),
        }
    }

    /// Columns of the table as it exists in the database.
    pub async fn live_columns(&self) -> DbResult<Vec<LiveColumn>> {
        let rows = self.fetch(sql::table_info(&self.schema)).await?;

        rows.iter()
            .map(|row| -> DbResult<LiveColumn> {
                Ok(LiveColumn {
                    name: row.try_get_unchecked::<String, _>("name")?,
                    declared_type: row.try_get_unchecked::<String, _>("type")?,
                })
            })
            .collect()
    }

    // =========================================================================
    // Execution
    // =========================================================================

    fn check_column(&self, column: &str) -> DbResult<()> {
        if self.schema.has_column(column) {
            Ok(())
        } else {
            Err(DbError::unknown_column(self.name(), column))
        }
    }

    async fn run(&self, statement: Statement) -> DbResult<ExecOutcome> {
        let mut conn = ConnectionManager::open(&self.db).await?;

        match conn.execute(&statement).await {
            Ok(outcome) => {
                conn.commit().await?;
                Ok(outcome)
            }
            Err(err) => Err(self.abandon(conn, err).await),
        }
    }

    async fn fetch(&self, statement: Statement) -> DbResult<Vec<SqliteRow>> {
        let mut conn = ConnectionManager::open(&self.db).await?;

        match conn.fetch_all(&statement).await {
            Ok(rows) => {
                conn.commit().await?;
                Ok(rows)
            }
            Err(err) => Err(self.abandon(conn, err).await),
        }
    }

    async fn query(&self, statement: Statement) -> DbResult<Vec<Row>> {
        let rows = self.fetch(statement).await?;
        debug!(table = %self.name(), rows = rows.len(), "Fetched rows");

        rows.iter().map(|row| self.decode_row(row)).collect()
    }

    async fn abandon(&self, mut conn: ConnectionManager, err: DbError) -> DbError {
        debug!(table = %self.name(), error = %err, "Statement failed, rolling back");

        if let Err(rollback_err) = conn.rollback().await {
            warn!(table = %self.name(), error = %rollback_err, "Rollback failed");
        }
        err
    }

    // =========================================================================
    // Decoding
    // =========================================================================

    /// Decodes a row selected with the schema's full column list.
    fn decode_row(&self, row: &SqliteRow) -> DbResult<Row> {
        let values = self
            .schema
            .columns()
            .iter()
            .enumerate()
            .map(|(index, column)| decode_cell(row, index, column))
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Row::new(Arc::clone(&self.columns), values))
    }
}

/// SQLite storage class of a stored cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StorageClass {
    Integer,
    Real,
    Text,
    Blob,
}

impl StorageClass {
    fn of(type_name: &str) -> Self {
        match type_name {
            "INTEGER" => StorageClass::Integer,
            "REAL" => StorageClass::Real,
            "TEXT" => StorageClass::Text,
            _ => StorageClass::Blob,
        }
    }
}

fn decode_cell(row: &SqliteRow, index: usize, column: &ColumnDef) -> DbResult<Value> {
    let storage = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        StorageClass::of(raw.type_info().name())
    };

    let value = match (column.ty, storage) {
        (ColumnType::Integer, StorageClass::Integer) => {
            Value::Integer(row.try_get_unchecked::<i64, _>(index)?)
        }
        (ColumnType::Real, StorageClass::Integer | StorageClass::Real) => {
            Value::Real(row.try_get_unchecked::<f64, _>(index)?)
        }
        (ColumnType::Text, StorageClass::Text) => {
            Value::Text(row.try_get_unchecked::<String, _>(index)?)
        }
        (ColumnType::Boolean, StorageClass::Integer) => {
            match row.try_get_unchecked::<i64, _>(index)? {
                0 => Value::Boolean(false),
                1 => Value::Boolean(true),
                other => return Err(decode_error(column, format!("{} is not a boolean", other))),
            }
        }
        (ColumnType::Date, StorageClass::Text) => {
            let text = row.try_get_unchecked::<String, _>(index)?;
            let date = NaiveDate::parse_from_str(&text, DATE_FORMAT)
                .map_err(|_| decode_error(column, format!("'{}' is not a date", text)))?;
            Value::Date(date)
        }
        (ty, storage) => {
            return Err(decode_error(
                column,
                format!("{} column holds a {:?} value", ty.label(), storage),
            ))
        }
    };

    Ok(value)
}

fn decode_error(column: &ColumnDef, reason: String) -> DbError {
    DbError::Decode {
        column: column.name.clone(),
        reason,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use sms_core::entity::{self, columns::*};

    async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn table(db: &Database, schema: TableSchema) -> GenericTable {
        GenericTable::create(db, Arc::new(schema)).await.unwrap()
    }

    /// Worker table along with the Store table it references.
    async fn workers_table(db: &Database) -> GenericTable {
        table(db, entity::store().unwrap()).await;
        table(db, entity::worker().unwrap()).await
    }

    fn jonas() -> Vec<Value> {
        vec![
            "Jonas".into(),
            Value::Integer(37060000000),
            "jonas@example.com".into(),
            "Lithuania".into(),
            15.into(),
            40.into(),
            Value::Null,
        ]
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let db = memory_db().await;
        table(&db, entity::store().unwrap()).await;
        let schema = Arc::new(entity::worker().unwrap());

        let first = GenericTable::create(&db, Arc::clone(&schema)).await.unwrap();
        let second = GenericTable::create(&db, schema).await.unwrap();

        assert_eq!(db.list_tables().await.unwrap(), ["Store", "Worker"]);

        let live = second.live_columns().await.unwrap();
        let names: Vec<&str> = live.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, first.schema().column_names().collect::<Vec<_>>());
        assert_eq!(live[0].declared_type, "INTEGER");
        assert_eq!(live[1].declared_type, "TEXT");
    }

    #[tokio::test]
    async fn test_create_requires_referenced_tables() {
        let db = memory_db().await;

        let err = GenericTable::create(&db, Arc::new(entity::worker().unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UnknownTable(name) if name == "Store"));
        assert!(db.list_tables().await.unwrap().is_empty());

        // Worker with no store is fine once Store exists
        let workers = workers_table(&db).await;
        assert_eq!(workers.insert(jonas()).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_insert_select_round_trip() {
        let db = memory_db().await;
        let workers = workers_table(&db).await;

        let id = workers.insert(jonas()).await.unwrap();
        assert_eq!(id, Some(1));

        let rows = workers.select_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(WORKER_ID), Some(&Value::Integer(1)));
        assert_eq!(rows[0].values_without(WORKER_ID), jonas());
        assert_eq!(entity::worker_salary(&rows[0]).unwrap(), 600);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = memory_db().await;
        let workers = workers_table(&db).await;
        let id = workers.insert(jonas()).await.unwrap().unwrap();

        let updated = workers
            .update(WORKER_ID, id, vec![(HOURLY_RATE, Value::Integer(20))])
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let row = workers.get_by_key(id).await.unwrap().unwrap();
        assert_eq!(row.get(HOURLY_RATE), Some(&Value::Integer(20)));
        assert_eq!(row.get(NAME), Some(&Value::from("Jonas")));
        assert_eq!(entity::worker_salary(&row).unwrap(), 800);

        let missing = workers
            .update(WORKER_ID, 99, vec![(HOURLY_RATE, Value::Integer(1))])
            .await
            .unwrap();
        assert_eq!(missing, 0);
    }

    #[tokio::test]
    async fn test_empty_update_is_noop() {
        let db = memory_db().await;
        let workers = workers_table(&db).await;
        let id = workers.insert(jonas()).await.unwrap().unwrap();

        assert_eq!(workers.update(WORKER_ID, id, vec![]).await.unwrap(), 0);

        // Column names are still checked
        assert!(matches!(
            workers.update("Nope", id, vec![]).await,
            Err(DbError::UnknownColumn { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_bad_columns() {
        let db = memory_db().await;
        let workers = workers_table(&db).await;
        let id = workers.insert(jonas()).await.unwrap().unwrap();

        let err = workers
            .update(WORKER_ID, id, vec![("Salary", Value::Integer(1))])
            .await
            .unwrap_err();
        assert!(matches!(&err, DbError::UnknownColumn { column, .. } if column == "Salary"));

        let err = workers
            .update(
                WORKER_ID,
                id,
                vec![(HOURLY_RATE, Value::Integer(1)), (HOURLY_RATE, Value::Integer(2))],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateColumn { .. }));

        let row = workers.get_by_key(id).await.unwrap().unwrap();
        assert_eq!(row.get(HOURLY_RATE), Some(&Value::Integer(15)));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = memory_db().await;
        let workers = workers_table(&db).await;
        let id = workers.insert(jonas()).await.unwrap().unwrap();

        assert_eq!(workers.delete(WORKER_ID, id).await.unwrap(), 1);
        assert!(workers.find_by(WORKER_ID, id).await.unwrap().is_empty());
        assert!(workers.get_by_key(id).await.unwrap().is_none());

        assert_eq!(workers.delete(WORKER_ID, id).await.unwrap(), 0);
        assert!(matches!(
            workers.delete("Salary", id).await,
            Err(DbError::UnknownColumn { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_table_usable() {
        let db = memory_db().await;
        let workers = workers_table(&db).await;

        let mut short = jonas();
        short.pop();
        let err = workers.insert(short).await.unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(_)));

        let mut wrong_type = jonas();
        wrong_type[4] = "fifteen".into();
        let err = workers.insert(wrong_type).await.unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(_)));

        let mut no_name = jonas();
        no_name[0] = Value::Null;
        let err = workers.insert(no_name).await.unwrap_err();
        assert!(matches!(err, DbError::NotNullViolation { .. }));

        assert_eq!(workers.count().await.unwrap(), 0);
        assert_eq!(workers.insert(jonas()).await.unwrap(), Some(1));
        assert_eq!(workers.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let db = memory_db().await;
        let stores = table(&db, entity::store().unwrap()).await;
        let workers = workers_table(&db).await;

        let mut orphan = jonas();
        orphan[6] = Value::Integer(99);
        assert!(matches!(
            workers.insert(orphan).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));

        let store_id = stores
            .insert(vec!["Maxima".into(), "Lithuania".into()])
            .await
            .unwrap()
            .unwrap();
        let mut employed = jonas();
        employed[6] = Value::Integer(store_id);
        workers.insert(employed).await.unwrap();

        assert!(matches!(
            stores.delete(STORE_ID, store_id).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
        assert_eq!(stores.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_association_composite_key() {
        let db = memory_db().await;
        let stores = table(&db, entity::store().unwrap()).await;
        let food = table(&db, entity::food().unwrap()).await;
        let links = table(&db, entity::store_food_product().unwrap()).await;

        let store_id = stores
            .insert(vec!["Maxima".into(), "Lithuania".into()])
            .await
            .unwrap()
            .unwrap();
        let food_id = food
            .insert(vec!["Milk".into(), 10.into(), 2.into(), "Cold".into(), Value::Null])
            .await
            .unwrap()
            .unwrap();

        let link = vec![Value::Integer(store_id), Value::Integer(food_id)];
        assert_eq!(links.insert(link.clone()).await.unwrap(), None);
        assert!(matches!(
            links.insert(link).await,
            Err(DbError::UniqueViolation { .. })
        ));

        assert_eq!(links.find_by(STORE_ID, store_id).await.unwrap().len(), 1);
        assert!(matches!(
            links.get_by_key(1).await,
            Err(DbError::NoGeneratedKey(name)) if name == "StoreFoodProduct"
        ));
    }

    #[tokio::test]
    async fn test_insert_many_links() {
        let db = memory_db().await;
        let stores = table(&db, entity::store().unwrap()).await;
        let food = table(&db, entity::food().unwrap()).await;
        let links = table(&db, entity::store_food_product().unwrap()).await;

        stores
            .insert(vec!["Maxima".into(), "Lithuania".into()])
            .await
            .unwrap();
        let milk = vec!["Milk".into(), 10.into(), 2.into(), "Cold".into(), Value::Null];
        let bread = vec!["Bread".into(), 5.into(), 1.into(), "Dry".into(), Value::Null];
        assert_eq!(food.insert_many(vec![milk, bread], OnConflict::Fail).await.unwrap(), 2);

        let link = |food_id: i64| vec![Value::Integer(1), Value::Integer(food_id)];
        assert_eq!(
            links
                .insert_many(vec![link(1), link(2), link(1)], OnConflict::Skip)
                .await
                .unwrap(),
            2
        );
        assert_eq!(links.count().await.unwrap(), 2);

        // Re-linking everything is a no-op
        assert_eq!(
            links
                .insert_many(vec![link(1), link(2)], OnConflict::Skip)
                .await
                .unwrap(),
            0
        );
        assert_eq!(links.insert_many(vec![], OnConflict::Fail).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_many_is_all_or_nothing() {
        let db = memory_db().await;
        let duties = table(&db, entity::responsibilities().unwrap()).await;
        let stores = table(&db, entity::store().unwrap()).await;
        let food = table(&db, entity::food().unwrap()).await;
        let links = table(&db, entity::store_food_product().unwrap()).await;

        let err = duties
            .insert_many(
                vec![vec!["Open store".into()], vec![Value::Null]],
                OnConflict::Skip,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotNullViolation { .. }));
        assert_eq!(duties.count().await.unwrap(), 0);

        stores
            .insert(vec!["Maxima".into(), "Lithuania".into()])
            .await
            .unwrap();
        food.insert(vec!["Milk".into(), 10.into(), 2.into(), "Cold".into(), Value::Null])
            .await
            .unwrap();
        let link = vec![Value::Integer(1), Value::Integer(1)];
        let err = links
            .insert_many(vec![link.clone(), link], OnConflict::Fail)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(links.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_date_and_boolean_round_trip() {
        let db = memory_db().await;
        let food = table(&db, entity::food().unwrap()).await;
        let dry = table(&db, entity::dry_storage().unwrap()).await;

        let expiry = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let id = food
            .insert(vec!["Milk".into(), 10.into(), 2.into(), "Cold".into(), expiry.into()])
            .await
            .unwrap()
            .unwrap();
        let row = food.get_by_key(id).await.unwrap().unwrap();
        assert_eq!(row.get(EXPIRY_DATE), Some(&Value::Date(expiry)));
        assert_eq!(entity::stock_value(&row).unwrap(), 20);
        assert!(entity::is_expired(&row, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()).unwrap());

        let id = dry
            .insert(vec![
                "Bleach".into(),
                3.into(),
                4.into(),
                false.into(),
                true.into(),
                "Bottle".into(),
            ])
            .await
            .unwrap()
            .unwrap();
        let row = dry.get_by_key(id).await.unwrap().unwrap();
        assert_eq!(row.get(RECIPE_ITEM), Some(&Value::Boolean(false)));
        assert_eq!(row.get(CHEMICAL), Some(&Value::Boolean(true)));
    }

    #[tokio::test]
    async fn test_ordered_select() {
        let db = memory_db().await;
        let duties = table(&db, entity::responsibilities().unwrap()).await;

        for name in ["Open store", "Count cash", "Lock up"] {
            duties.insert(vec![name.into()]).await.unwrap();
        }

        let rows = duties.select_all_ordered(RESPONSIBILITY_NAME).await.unwrap();
        let names: Vec<&Value> = rows.iter().filter_map(|r| r.get(RESPONSIBILITY_NAME)).collect();
        assert_eq!(
            names,
            [&Value::from("Count cash"), &Value::from("Lock up"), &Value::from("Open store")]
        );

        assert!(matches!(
            duties.select_all_ordered("Priority").await,
            Err(DbError::UnknownColumn { .. })
        ));
    }

    #[tokio::test]
    async fn test_undecodable_cell() {
        let db = memory_db().await;
        sqlx::query(
            "CREATE TABLE \"Food\" (\"FoodID\" INTEGER PRIMARY KEY, \"Name\" TEXT, \
             \"Amount\" INTEGER, \"Price\" INTEGER, \"StorageCondition\" TEXT, \"ExpiryDate\" DATE)",
        )
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query("INSERT INTO \"Food\" (\"Name\", \"ExpiryDate\") VALUES ('Milk', 'soon')")
            .execute(db.pool())
            .await
            .unwrap();

        let food = table(&db, entity::food().unwrap()).await;
        let err = food.select_all().await.unwrap_err();
        assert!(matches!(err, DbError::Decode { column, .. } if column == "ExpiryDate"));
    }

    #[tokio::test]
    async fn test_drop_table() {
        let db = memory_db().await;
        let duties = table(&db, entity::responsibilities().unwrap()).await;
        duties.insert(vec!["Open store".into()]).await.unwrap();

        duties.drop_table().await.unwrap();
        assert!(db.list_tables().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_database() {
        let db = memory_db().await;
        let duties = table(&db, entity::responsibilities().unwrap()).await;
        db.close().await;

        let err = duties.insert(vec!["Open store".into()]).await.unwrap_err();
        assert!(matches!(err, DbError::ConnectionFailed(_)));
        assert_eq!(err.kind(), crate::error::ErrorKind::Connection);
    }
}
