//! # Entity Schemas
//!
//! Every domain entity expressed as schema data, plus the pure derivations
//! computed over rows fetched from those tables.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Entities                                      │
//! │                                                                         │
//! │   Staff                    Places          Inventory                    │
//! │   ─────                    ──────          ─────────                    │
//! │   Worker ─────────┐                        Food                         │
//! │   Manager ────────┼──────► Store ◄───┐     Dry Storage                  │
//! │   Store Manager ──┘          ▲       │        ▲    ▲                    │
//! │        │                     │       │        │    │                    │
//! │        │                StoreFoodProduct ─────┘    │                    │
//! │        │                StoreDryProduct ───────────┘                    │
//! │        ▼                                                                │
//! │   SM Responsibilities ──► Responsibilities ◄── Manager Responsibilities │
//! │                                                                         │
//! │   Arrows are enforced REFERENCES constraints.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Derivations never touch the database and have no side effects.

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult, SchemaError, ValidationError};
use crate::schema::{ColumnDef, TableSchema};
use crate::value::Row;

// =============================================================================
// Names
// =============================================================================

/// Table names.
pub mod tables {
    pub const STORE: &str = "Store";
    pub const WORKER: &str = "Worker";
    pub const MANAGER: &str = "Manager";
    pub const STORE_MANAGER: &str = "Store Manager";
    pub const FOOD: &str = "Food";
    pub const DRY_STORAGE: &str = "Dry Storage";
    pub const RESPONSIBILITIES: &str = "Responsibilities";
    pub const MANAGER_RESPONSIBILITIES: &str = "Manager Responsibilities";
    pub const SM_RESPONSIBILITIES: &str = "SM Responsibilities";
    pub const STORE_FOOD_PRODUCT: &str = "StoreFoodProduct";
    pub const STORE_DRY_PRODUCT: &str = "StoreDryProduct";
}

/// Column names shared across entities.
pub mod columns {
    pub const STORE_ID: &str = "StoreID";
    pub const STORE_NAME: &str = "StoreName";
    pub const WORKER_ID: &str = "WorkerID";
    pub const MANAGER_ID: &str = "ManagerID";
    pub const STORE_MANAGER_ID: &str = "StoreManagerID";
    pub const FOOD_ID: &str = "FoodID";
    pub const DRY_STORAGE_ID: &str = "DryStorageID";
    pub const RESPONSIBILITY_ID: &str = "ResponsibilityID";
    pub const RESPONSIBILITY_NAME: &str = "ResponsibilityName";

    pub const NAME: &str = "Name";
    pub const PHONE_NUMBER: &str = "PhoneNumber";
    pub const EMAIL: &str = "Email";
    pub const COUNTRY: &str = "Country";

    pub const HOURLY_RATE: &str = "HourlyRate";
    pub const AMOUNT_WORKED: &str = "AmountWorked";
    pub const MONTHLY_SALARY: &str = "MonthlySalary";
    pub const PETTY_CASH: &str = "PettyCash";

    pub const AMOUNT: &str = "Amount";
    pub const PRICE: &str = "Price";
    pub const STORAGE_CONDITION: &str = "StorageCondition";
    pub const EXPIRY_DATE: &str = "ExpiryDate";
    pub const RECIPE_ITEM: &str = "RecipeItem";
    pub const CHEMICAL: &str = "Chemical";
    pub const PACKAGE_TYPE: &str = "PackageType";
}

use columns::*;
use tables::*;

// =============================================================================
// Schemas
// =============================================================================

pub fn store() -> Result<TableSchema, SchemaError> {
    TableSchema::builder(STORE)
        .column(ColumnDef::integer(STORE_ID).primary_key())
        .column(ColumnDef::text(STORE_NAME).not_null())
        .column(ColumnDef::text(COUNTRY))
        .build()
}

/// Hourly staff; salary is derived from rate and hours.
pub fn worker() -> Result<TableSchema, SchemaError> {
    TableSchema::builder(WORKER)
        .column(ColumnDef::integer(WORKER_ID).primary_key())
        .column(ColumnDef::text(NAME).not_null())
        .column(ColumnDef::integer(PHONE_NUMBER))
        .column(ColumnDef::text(EMAIL))
        .column(ColumnDef::text(COUNTRY))
        .column(ColumnDef::integer(HOURLY_RATE))
        .column(ColumnDef::integer(AMOUNT_WORKED))
        .column(ColumnDef::integer(STORE_ID).references(STORE, STORE_ID))
        .build()
}

/// Salaried staff.
pub fn manager() -> Result<TableSchema, SchemaError> {
    TableSchema::builder(MANAGER)
        .column(ColumnDef::integer(MANAGER_ID).primary_key())
        .column(ColumnDef::text(NAME).not_null())
        .column(ColumnDef::integer(PHONE_NUMBER))
        .column(ColumnDef::text(EMAIL))
        .column(ColumnDef::text(COUNTRY))
        .column(ColumnDef::integer(MONTHLY_SALARY))
        .column(ColumnDef::integer(STORE_ID).references(STORE, STORE_ID))
        .build()
}

/// Salaried staff holding the store's petty cash.
pub fn store_manager() -> Result<TableSchema, SchemaError> {
    TableSchema::builder(STORE_MANAGER)
        .column(ColumnDef::integer(STORE_MANAGER_ID).primary_key())
        .column(ColumnDef::integer(STORE_ID).references(STORE, STORE_ID))
        .column(ColumnDef::text(NAME).not_null())
        .column(ColumnDef::text(COUNTRY))
        .column(ColumnDef::text(EMAIL))
        .column(ColumnDef::integer(PHONE_NUMBER))
        .column(ColumnDef::integer(MONTHLY_SALARY))
        .column(ColumnDef::integer(PETTY_CASH))
        .build()
}

/// Perishable inventory.
pub fn food() -> Result<TableSchema, SchemaError> {
    TableSchema::builder(FOOD)
        .column(ColumnDef::integer(FOOD_ID).primary_key())
        .column(ColumnDef::text(NAME).not_null())
        .column(ColumnDef::integer(AMOUNT))
        .column(ColumnDef::integer(PRICE))
        .column(ColumnDef::text(STORAGE_CONDITION))
        .column(ColumnDef::date(EXPIRY_DATE))
        .build()
}

/// Non-perishable inventory.
pub fn dry_storage() -> Result<TableSchema, SchemaError> {
    TableSchema::builder(DRY_STORAGE)
        .column(ColumnDef::integer(DRY_STORAGE_ID).primary_key())
        .column(ColumnDef::text(NAME).not_null())
        .column(ColumnDef::integer(AMOUNT))
        .column(ColumnDef::integer(PRICE))
        .column(ColumnDef::boolean(RECIPE_ITEM))
        .column(ColumnDef::boolean(CHEMICAL))
        .column(ColumnDef::text(PACKAGE_TYPE))
        .build()
}

pub fn responsibilities() -> Result<TableSchema, SchemaError> {
    TableSchema::builder(RESPONSIBILITIES)
        .column(ColumnDef::integer(RESPONSIBILITY_ID).primary_key())
        .column(ColumnDef::text(RESPONSIBILITY_NAME).not_null())
        .build()
}

pub fn manager_responsibilities() -> Result<TableSchema, SchemaError> {
    association(
        MANAGER_RESPONSIBILITIES,
        (MANAGER_ID, MANAGER),
        (RESPONSIBILITY_ID, RESPONSIBILITIES),
    )
}

pub fn sm_responsibilities() -> Result<TableSchema, SchemaError> {
    association(
        SM_RESPONSIBILITIES,
        (STORE_MANAGER_ID, STORE_MANAGER),
        (RESPONSIBILITY_ID, RESPONSIBILITIES),
    )
}

pub fn store_food_product() -> Result<TableSchema, SchemaError> {
    association(STORE_FOOD_PRODUCT, (STORE_ID, STORE), (FOOD_ID, FOOD))
}

pub fn store_dry_product() -> Result<TableSchema, SchemaError> {
    association(
        STORE_DRY_PRODUCT,
        (STORE_ID, STORE),
        (DRY_STORAGE_ID, DRY_STORAGE),
    )
}

/// Two non-null reference columns forming a composite key. Each column is
/// named after the key column of the table it references.
fn association(
    name: &str,
    (left, left_table): (&str, &str),
    (right, right_table): (&str, &str),
) -> Result<TableSchema, SchemaError> {
    TableSchema::builder(name)
        .column(ColumnDef::integer(left).not_null().references(left_table, left))
        .column(ColumnDef::integer(right).not_null().references(right_table, right))
        .composite_key([left, right])
        .build()
}

/// All entity schemas, referenced tables before the tables referencing them.
pub fn all() -> Result<Vec<TableSchema>, SchemaError> {
    Ok(vec![
        store()?,
        worker()?,
        manager()?,
        store_manager()?,
        food()?,
        dry_storage()?,
        responsibilities()?,
        manager_responsibilities()?,
        sm_responsibilities()?,
        store_food_product()?,
        store_dry_product()?,
    ])
}

// =============================================================================
// Derivations
// =============================================================================

/// Worker salary: hourly rate × hours worked.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use sms_core::entity::worker_salary;
/// use sms_core::{Row, Value};
///
/// let columns: Arc<[String]> = ["HourlyRate", "AmountWorked"]
///     .iter()
///     .map(|c| c.to_string())
///     .collect();
/// let row = Row::new(columns, vec![Value::Integer(15), Value::Integer(40)]);
///
/// assert_eq!(worker_salary(&row).unwrap(), 600);
/// ```
pub fn worker_salary(row: &Row) -> CoreResult<i64> {
    let rate = row.require_integer(HOURLY_RATE)?;
    let hours = row.require_integer(AMOUNT_WORKED)?;

    rate.checked_mul(hours)
        .ok_or(CoreError::Overflow("worker salary"))
}

/// Yearly pay of a manager or store manager: monthly salary × 12.
pub fn manager_annual_salary(row: &Row) -> CoreResult<i64> {
    row.require_integer(MONTHLY_SALARY)?
        .checked_mul(12)
        .ok_or(CoreError::Overflow("annual salary"))
}

/// Petty cash left after paying `expense` out of a store manager's float.
///
/// Nothing is written back; the caller decides whether to persist the
/// new balance with an update.
pub fn petty_cash_remaining(row: &Row, expense: i64) -> CoreResult<i64> {
    if expense < 0 {
        return Err(ValidationError::Negative {
            field: "expense".to_string(),
        }
        .into());
    }

    let available = row.require_integer(PETTY_CASH)?;
    if expense > available {
        return Err(CoreError::InsufficientPettyCash {
            available,
            requested: expense,
        });
    }

    Ok(available - expense)
}

/// Value of stock on hand for a food or dry-storage row: amount × price.
pub fn stock_value(row: &Row) -> CoreResult<i64> {
    let amount = row.require_integer(AMOUNT)?;
    let price = row.require_integer(PRICE)?;

    amount
        .checked_mul(price)
        .ok_or(CoreError::Overflow("stock value"))
}

/// True if a food row's expiry date is before `today`. Rows without an
/// expiry date never expire.
pub fn is_expired(row: &Row, today: NaiveDate) -> CoreResult<bool> {
    Ok(row.date(EXPIRY_DATE)?.is_some_and(|expiry| expiry < today))
}

// =============================================================================
// Unit Tests
// =============================================================================
