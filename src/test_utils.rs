//! Shared test utilities.
//!
//! This module provides helper functions for setting up test databases and a small
//! catalog with sensible defaults.

use crate::{
    core::{catalog, invoice, reconcile::LineItemFields},
    entities,
    errors::Result,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A vendor and one of its items.
pub struct TestCatalog {
    /// The vendor
    pub vendor: entities::vendor::Model,
    /// An item scoped to the vendor
    pub item: entities::item::Model,
}

/// Creates a vendor with a single item coded `code`.
pub async fn create_test_catalog(
    db: &DatabaseConnection,
    vendor_name: &str,
    item_name: &str,
    code: &str,
) -> Result<TestCatalog> {
    let vendor = catalog::create_vendor(db, vendor_name).await?;
    let item = catalog::create_item(db, item_name, code, Some(vendor.id)).await?;
    Ok(TestCatalog { vendor, item })
}

/// Price helper: `price(300)` is $3.00.
#[must_use]
pub fn price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Line item fields for `catalog` with an empty info column.
#[must_use]
pub fn fields(catalog: &TestCatalog, quantity: i64, unit_price: Decimal) -> LineItemFields {
    LineItemFields {
        vendor_id: catalog.vendor.id,
        item_id: catalog.item.id,
        quantity,
        unit_price,
        optional_info: String::new(),
    }
}

/// Sets up a database holding one catalog entry and one empty invoice.
///
/// # Defaults
/// * vendor: "Acme Wholesale", item "Paper Towels" coded "A001"
/// * invoice date: 2025-03-14
pub async fn setup_with_invoice()
-> Result<(DatabaseConnection, TestCatalog, entities::invoice::Model)> {
    let db = setup_test_db().await?;
    let catalog = create_test_catalog(&db, "Acme Wholesale", "Paper Towels", "A001").await?;
    let invoice = invoice::create_invoice(&db, test_date()).await?;
    Ok((db, catalog, invoice))
}

/// Fixed invoice date used across tests.
#[must_use]
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap_or_default()
}
