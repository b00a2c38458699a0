//! # Schema Registry
//!
//! The allow-list of table schemas. Table names coming from outside the
//! program (menu choices, arguments) are resolved here before any SQL is
//! built; a name that isn't registered never reaches the database.

use std::sync::Arc;

use sms_core::entity;
use sms_core::TableSchema;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::table::GenericTable;

/// Registered schemas in registration order.
///
/// A schema may only reference tables registered before it (or itself), so
/// registration order is also a valid creation order.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: Vec<Arc<TableSchema>>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every store management entity.
    pub fn standard() -> DbResult<Self> {
        let mut registry = Self::new();
        for schema in entity::all()? {
            registry.register(schema)?;
        }
        Ok(registry)
    }

    /// Adds a schema.
    ///
    /// ## Errors
    /// - `DuplicateTable` if the name is taken
    /// - `UnknownTable` if the schema references an unregistered table
    pub fn register(&mut self, schema: TableSchema) -> DbResult<()> {
        if self.contains(schema.name()) {
            return Err(DbError::DuplicateTable(schema.name().to_string()));
        }

        if let Some(missing) = schema
            .referenced_tables()
            .find(|t| *t != schema.name() && !self.contains(t))
        {
            return Err(DbError::UnknownTable(missing.to_string()));
        }

        self.schemas.push(Arc::new(schema));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.iter().any(|s| s.name() == name)
    }

    /// Looks up a schema by table name.
    pub fn schema(&self, name: &str) -> DbResult<Arc<TableSchema>> {
        self.schemas
            .iter()
            .find(|s| s.name() == name)
            .cloned()
            .ok_or_else(|| DbError::UnknownTable(name.to_string()))
    }

    /// Registered table names in registration order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|s| s.name())
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Table handle for a registered name.
    ///
    /// Creates the table if needed, along with every table it references
    /// directly or transitively, so the handle can insert straight away.
    pub async fn table(&self, db: &Database, name: &str) -> DbResult<GenericTable> {
        let target = self.schema(name)?;

        for schema in self.dependencies(&target) {
            GenericTable::create(db, schema).await?;
        }
        GenericTable::create(db, target).await
    }

    /// Tables `schema` needs, in registration (and so creation) order.
    fn dependencies(&self, schema: &TableSchema) -> Vec<Arc<TableSchema>> {
        let mut needed: Vec<&str> = vec![schema.name()];
        // Later schemas only reference earlier ones, so one backwards pass
        // collects the whole closure
        for candidate in self.schemas.iter().rev() {
            if needed.contains(&candidate.name()) {
                needed.extend(candidate.referenced_tables());
            }
        }

        self.schemas
            .iter()
            .filter(|s| s.name() != schema.name() && needed.contains(&s.name()))
            .cloned()
            .collect()
    }

    /// Creates every registered table, in registration order.
    pub async fn create_all(&self, db: &Database) -> DbResult<Vec<GenericTable>> {
        let mut tables = Vec::with_capacity(self.schemas.len());
        for schema in &self.schemas {
            tables.push(GenericTable::create(db, Arc::clone(schema)).await?);
        }

        info!(tables = tables.len(), "All tables created");
        Ok(tables)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use sms_core::entity::tables;
    use sms_core::ColumnDef;

    #[test]
    fn test_standard_registry() {
        let registry = SchemaRegistry::standard().unwrap();

        assert_eq!(registry.len(), 11);
        assert_eq!(registry.table_names().next(), Some(tables::STORE));
        assert!(registry.contains(tables::STORE_MANAGER));
        assert_eq!(
            registry.schema(tables::WORKER).unwrap().name(),
            tables::WORKER
        );
    }

    #[test]
    fn test_unknown_table() {
        let registry = SchemaRegistry::standard().unwrap();

        assert!(matches!(
            registry.schema("Worker; DROP TABLE Store"),
            Err(DbError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_register_rules() {
        let mut registry = SchemaRegistry::new();
        assert!(registry.is_empty());

        registry.register(entity::store().unwrap()).unwrap();
        assert!(matches!(
            registry.register(entity::store().unwrap()),
            Err(DbError::DuplicateTable(name)) if name == "Store"
        ));

        // Food is not registered yet
        assert!(matches!(
            registry.register(entity::store_food_product().unwrap()),
            Err(DbError::UnknownTable(name)) if name == "Food"
        ));

        let tree = TableSchema::builder("Category")
            .column(ColumnDef::integer("CategoryID").primary_key())
            .column(ColumnDef::integer("ParentID").references("Category", "CategoryID"))
            .build()
            .unwrap();
        registry.register(tree).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_create_all() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let registry = SchemaRegistry::standard().unwrap();

        let created = registry.create_all(&db).await.unwrap();
        assert_eq!(created.len(), 11);

        let mut expected: Vec<String> = registry.table_names().map(str::to_string).collect();
        expected.sort();
        assert_eq!(db.list_tables().await.unwrap(), expected);

        // Second run is a no-op
        registry.create_all(&db).await.unwrap();
        assert_eq!(db.list_tables().await.unwrap().len(), 11);
    }

    #[tokio::test]
    async fn test_table_by_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let registry = SchemaRegistry::standard().unwrap();

        let duties = registry.table(&db, tables::RESPONSIBILITIES).await.unwrap();
        duties.insert(vec!["Open store".into()]).await.unwrap();
        assert_eq!(duties.count().await.unwrap(), 1);

        assert!(matches!(
            registry.table(&db, "Payroll").await,
            Err(DbError::UnknownTable(_))
        ));
    }

    #[tokio::test]
    async fn test_table_creates_referenced_tables() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let registry = SchemaRegistry::standard().unwrap();

        let workers = registry.table(&db, tables::WORKER).await.unwrap();
        assert_eq!(db.list_tables().await.unwrap(), [tables::STORE, tables::WORKER]);

        let jonas = vec![
            "Jonas".into(),
            sms_core::Value::Integer(37060000000),
            "jonas@example.com".into(),
            "Lithuania".into(),
            15.into(),
            40.into(),
            sms_core::Value::Null,
        ];
        assert_eq!(workers.insert(jonas).await.unwrap(), Some(1));

        // An association table pulls in both sides
        registry.table(&db, tables::STORE_FOOD_PRODUCT).await.unwrap();
        assert_eq!(
            db.list_tables().await.unwrap(),
            [tables::FOOD, tables::STORE, tables::STORE_FOOD_PRODUCT, tables::WORKER]
        );
    }
}
