//! Catalog lookup - vendors and the items they sell.
//!
//! The invoice editor resolves vendor/item identity by name through these functions; the
//! store checks line item references against the same tables. Items without a vendor are
//! shared and listed under every vendor.

use crate::{
    config::CatalogSeed,
    entities::{Item, Vendor, item, vendor},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, prelude::*};
use tracing::{debug, info, instrument};

/// Retrieves all vendors ordered alphabetically by name.
pub async fn list_vendors(db: &DatabaseConnection) -> Result<Vec<vendor::Model>> {
    Vendor::find()
        .order_by_asc(vendor::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the items a vendor sells: its own items plus shared ones, ordered by name.
pub async fn list_items_for_vendor(
    db: &DatabaseConnection,
    vendor_id: i64,
) -> Result<Vec<item::Model>> {
    Item::find()
        .filter(
            Condition::any()
                .add(item::Column::VendorId.eq(vendor_id))
                .add(item::Column::VendorId.is_null()),
        )
        .order_by_asc(item::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a vendor by its unique name.
pub async fn find_vendor_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<vendor::Model>> {
    Vendor::find()
        .filter(vendor::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Resolves an item name to its id.
///
/// When several vendors carry an item with the same name the lowest id wins.
pub async fn find_item_id_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<i64>> {
    let found = Item::find()
        .filter(item::Column::Name.eq(name))
        .order_by_asc(item::Column::Id)
        .one(db)
        .await?;
    Ok(found.map(|item| item.id))
}

/// Finds an item by name among the items `vendor_id` sells.
pub async fn find_item_for_vendor(
    db: &DatabaseConnection,
    vendor_id: i64,
    name: &str,
) -> Result<Option<item::Model>> {
    Item::find()
        .filter(item::Column::Name.eq(name))
        .filter(
            Condition::any()
                .add(item::Column::VendorId.eq(vendor_id))
                .add(item::Column::VendorId.is_null()),
        )
        .order_by_asc(item::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a vendor, trimming whitespace from the name.
///
/// # Errors
/// Returns `Validation` for an empty name and `Storage` when the name is already taken.
pub async fn create_vendor(db: &DatabaseConnection, name: &str) -> Result<vendor::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            field: "vendor name",
            message: "cannot be empty".to_string(),
        });
    }

    let vendor = vendor::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    };
    vendor.insert(db).await.map_err(Into::into)
}

/// Creates a catalog item, optionally scoped to a vendor.
///
/// # Errors
/// Returns `Validation` for an empty name or code and `NotFound` for an unknown vendor.
pub async fn create_item(
    db: &DatabaseConnection,
    name: &str,
    code: &str,
    vendor_id: Option<i64>,
) -> Result<item::Model> {
    let (name, code) = (name.trim(), code.trim());
    if name.is_empty() {
        return Err(Error::Validation {
            field: "item name",
            message: "cannot be empty".to_string(),
        });
    }
    if code.is_empty() {
        return Err(Error::Validation {
            field: "item code",
            message: "cannot be empty".to_string(),
        });
    }

    if let Some(vendor_id) = vendor_id {
        Vendor::find_by_id(vendor_id)
            .one(db)
            .await?
            .ok_or_else(|| Error::not_found("vendor", vendor_id))?;
    }

    let item = item::ActiveModel {
        name: Set(name.to_string()),
        code: Set(code.to_string()),
        vendor_id: Set(vendor_id),
        ..Default::default()
    };
    item.insert(db).await.map_err(Into::into)
}

/// Seeds vendors and items from configuration, skipping entries that already exist.
///
/// Returns the number of vendors and items created.
#[instrument(skip(db, seed))]
pub async fn seed_catalog(db: &DatabaseConnection, seed: &CatalogSeed) -> Result<(usize, usize)> {
    let mut vendors_created = 0;
    let mut items_created = 0;

    for vendor_seed in &seed.vendors {
        let existing = find_vendor_by_name(db, vendor_seed.name.trim()).await?;
        let vendor = if let Some(existing) = existing {
            existing
        } else {
            vendors_created += 1;
            create_vendor(db, &vendor_seed.name).await?
        };

        for item_seed in &vendor_seed.items {
            let exists = Item::find()
                .filter(item::Column::Name.eq(item_seed.name.trim()))
                .filter(item::Column::VendorId.eq(vendor.id))
                .one(db)
                .await?
                .is_some();
            if exists {
                debug!("Item '{}' already seeded for '{}'", item_seed.name, vendor.name);
                continue;
            }
            create_item(db, &item_seed.name, &item_seed.code, Some(vendor.id)).await?;
            items_created += 1;
        }
    }

    for item_seed in &seed.shared_items {
        let exists = Item::find()
            .filter(item::Column::Name.eq(item_seed.name.trim()))
            .filter(item::Column::VendorId.is_null())
            .one(db)
            .await?
            .is_some();
        if !exists {
            create_item(db, &item_seed.name, &item_seed.code, None).await?;
            items_created += 1;
        }
    }

    info!("Seeded {vendors_created} vendors and {items_created} items");
    Ok((vendors_created, items_created))
}
