//! # Seed Data Generator
//!
//! Creates every table and populates a demo store for development.
//!
//! ## Usage
//! ```bash
//! # Database from DB_NAME and friends
//! DB_NAME=./sms_dev.db cargo run -p sms-db --bin seed
//!
//! # Specify database path
//! cargo run -p sms-db --bin seed -- --db ./data/sms.db
//!
//! # More logging
//! RUST_LOG=debug cargo run -p sms-db --bin seed -- --db :memory:
//! ```
//!
//! ## Generated Data
//! - One store with two workers, a manager and a store manager
//! - Food and dry storage items linked to the store
//! - Responsibilities assigned to both managers
//!
//! Derived salaries and stock values are logged, and the worker table is
//! printed as JSON at the end.

use std::env;

use chrono::Local;
use sms_core::entity::{self, columns::*, tables};
use sms_core::validation::coerce_row;
use sms_core::{Row, Value};
use sms_db::{Database, DbConfig, GenericTable, OnConflict, SchemaRegistry};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Workers as an operator would type them, in insert column order.
const WORKERS: &[[&str; 7]] = &[
    ["Jonas", "37060000000", "jonas@example.com", "Lithuania", "15", "40", ""],
    ["Ona", "37060000001", "ona@example.com", "Lithuania", "12", "38", ""],
];

/// Petty cash spent by the store manager during the demo.
const DEMO_EXPENSE: i64 = 120;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut db_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Store Management System Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $DB_NAME)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let config = match db_path {
        Some(path) if path == sms_db::config::IN_MEMORY => DbConfig::in_memory(),
        Some(path) => DbConfig::new(path),
        None => DbConfig::from_env()?,
    };

    let db = Database::new(config).await?;
    let registry = SchemaRegistry::standard()?;
    registry.create_all(&db).await?;

    let stores = registry.table(&db, tables::STORE).await?;
    let existing = stores.count().await?;
    if existing > 0 {
        warn!(stores = existing, "Database already seeded, skipping");
        return Ok(());
    }

    let store_id = stores
        .insert(vec!["Maxima Centras".into(), "Lithuania".into()])
        .await?
        .ok_or("store has no generated key")?;
    info!(store_id, "Store created");

    seed_staff(&registry, &db, store_id).await?;
    seed_inventory(&registry, &db, store_id).await?;
    seed_responsibilities(&registry, &db).await?;

    report(&registry, &db).await?;

    let workers = registry.table(&db, tables::WORKER).await?;
    println!("{}", serde_json::to_string_pretty(&workers.select_all().await?)?);

    info!("Seed complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sms=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn seed_staff(
    registry: &SchemaRegistry,
    db: &Database,
    store_id: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let workers = registry.table(db, tables::WORKER).await?;
    for raw in WORKERS {
        let mut values = coerce_row(workers.schema(), raw)?;
        if let Some(last) = values.last_mut() {
            *last = Value::Integer(store_id);
        }
        workers.insert(values).await?;
    }

    let managers = registry.table(db, tables::MANAGER).await?;
    managers
        .insert(vec![
            "Petras".into(),
            Value::Integer(37060000002),
            "petras@example.com".into(),
            "Lithuania".into(),
            3000.into(),
            Value::Integer(store_id),
        ])
        .await?;

    let store_managers = registry.table(db, tables::STORE_MANAGER).await?;
    store_managers
        .insert(vec![
            Value::Integer(store_id),
            "Rasa".into(),
            "Lithuania".into(),
            "rasa@example.com".into(),
            Value::Integer(37060000003),
            2500.into(),
            500.into(),
        ])
        .await?;

    info!(workers = WORKERS.len(), "Staff created");
    Ok(())
}

async fn seed_inventory(
    registry: &SchemaRegistry,
    db: &Database,
    store_id: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let today = Local::now().date_naive();
    let food = registry.table(db, tables::FOOD).await?;
    let dry = registry.table(db, tables::DRY_STORAGE).await?;

    let food_items = [
        ("Milk", 40, 2, "Cold", today.succ_opt()),
        ("Bread", 25, 1, "Dry", today.pred_opt()),
    ];
    let mut food_ids = Vec::new();
    for (name, amount, price, condition, expiry) in food_items {
        let id = food
            .insert(vec![
                name.into(),
                amount.into(),
                price.into(),
                condition.into(),
                expiry.into(),
            ])
            .await?;
        food_ids.extend(id);
    }

    let dry_items = [
        ("Flour", 10, 3, true, false, "Sack"),
        ("Bleach", 6, 4, false, true, "Bottle"),
    ];
    let mut dry_ids = Vec::new();
    for (name, amount, price, recipe, chemical, package) in dry_items {
        let id = dry
            .insert(vec![
                name.into(),
                amount.into(),
                price.into(),
                recipe.into(),
                chemical.into(),
                package.into(),
            ])
            .await?;
        dry_ids.extend(id);
    }

    link_all(registry, db, tables::STORE_FOOD_PRODUCT, store_id, &food_ids).await?;
    link_all(registry, db, tables::STORE_DRY_PRODUCT, store_id, &dry_ids).await?;

    info!(food = food_ids.len(), dry = dry_ids.len(), "Inventory created");
    Ok(())
}

async fn seed_responsibilities(
    registry: &SchemaRegistry,
    db: &Database,
) -> Result<(), Box<dyn std::error::Error>> {
    let duties = registry.table(db, tables::RESPONSIBILITIES).await?;
    let mut duty_ids = Vec::new();
    for name in ["Open store", "Count cash", "Order stock"] {
        duty_ids.extend(duties.insert(vec![name.into()]).await?);
    }

    // Both managers were created first, so they have key 1
    link_all(registry, db, tables::MANAGER_RESPONSIBILITIES, 1, &duty_ids[..2]).await?;
    link_all(registry, db, tables::SM_RESPONSIBILITIES, 1, &duty_ids[1..]).await?;

    Ok(())
}

/// Inserts `(owner, item)` into an association table for every item.
async fn link_all(
    registry: &SchemaRegistry,
    db: &Database,
    table: &str,
    owner: i64,
    items: &[i64],
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = items
        .iter()
        .map(|item| vec![Value::Integer(owner), Value::Integer(*item)])
        .collect();
    let linked = registry
        .table(db, table)
        .await?
        .insert_many(rows, OnConflict::Skip)
        .await?;
    info!(table, linked, "Items linked");
    Ok(())
}

async fn report(registry: &SchemaRegistry, db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let today = Local::now().date_naive();

    for row in registry.table(db, tables::WORKER).await?.select_all().await? {
        info!(worker = %name_of(&row), salary = entity::worker_salary(&row)?, "Worker salary");
    }

    for row in registry.table(db, tables::MANAGER).await?.select_all().await? {
        info!(
            manager = %name_of(&row),
            annual = entity::manager_annual_salary(&row)?,
            "Manager salary"
        );
    }

    let store_managers: GenericTable = registry.table(db, tables::STORE_MANAGER).await?;
    for row in store_managers.select_all().await? {
        let remaining = entity::petty_cash_remaining(&row, DEMO_EXPENSE)?;
        let id = row.require_integer(STORE_MANAGER_ID)?;
        store_managers
            .update(STORE_MANAGER_ID, id, vec![(PETTY_CASH, Value::Integer(remaining))])
            .await?;
        info!(
            store_manager = %name_of(&row),
            annual = entity::manager_annual_salary(&row)?,
            petty_cash = remaining,
            "Store manager paid expense"
        );
    }

    for name in [tables::FOOD, tables::DRY_STORAGE] {
        for row in registry.table(db, name).await?.select_all().await? {
            info!(
                item = %name_of(&row),
                stock_value = entity::stock_value(&row)?,
                "Stock"
            );
        }
    }

    for row in registry.table(db, tables::FOOD).await?.select_all().await? {
        if entity::is_expired(&row, today)? {
            warn!(item = %name_of(&row), "Item expired");
        }
    }

    Ok(())
}

fn name_of(row: &Row) -> String {
    row.get(NAME).map(Value::to_string).unwrap_or_default()
}
