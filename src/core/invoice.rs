//! Invoice store - the durable, transactional home of invoices and their line items.
//!
//! Every write that touches more than one row runs inside a single `SeaORM` transaction and
//! commits before returning. An early return drops the transaction, which rolls it back, so
//! a failed call leaves storage exactly as it was.

use crate::{
    core::reconcile::{ChangeSet, LineItemFields},
    entities::{Invoice, Item, LineItem, Vendor, invoice, item, line_item, vendor},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, info, instrument};

/// A persisted line item joined with its vendor and item display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItemDetail {
    /// Persisted line item id
    pub id: i64,
    /// Owning invoice
    pub invoice_id: i64,
    /// Vendor id
    pub vendor_id: i64,
    /// Vendor display name
    pub vendor_name: String,
    /// Catalog item id
    pub item_id: i64,
    /// Short item code
    pub item_code: String,
    /// Item display name
    pub item_name: String,
    /// Units ordered
    pub quantity: i64,
    /// Price per unit
    pub unit_price: Decimal,
    /// Free-form note
    pub optional_info: String,
}

impl LineItemDetail {
    /// The editable fields of this row.
    #[must_use]
    pub fn fields(&self) -> LineItemFields {
        LineItemFields {
            vendor_id: self.vendor_id,
            item_id: self.item_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            optional_info: self.optional_info.clone(),
        }
    }
}

/// Creates an invoice header dated `date`.
pub async fn create_invoice(db: &DatabaseConnection, date: NaiveDate) -> Result<invoice::Model> {
    let invoice = invoice::ActiveModel {
        date: Set(date),
        ..Default::default()
    };
    let invoice = invoice.insert(db).await?;
    info!("Created invoice {} dated {}", invoice.id, invoice.date);
    Ok(invoice)
}

/// Creates an invoice header dated today (local time).
pub async fn create_blank_invoice(db: &DatabaseConnection) -> Result<invoice::Model> {
    create_invoice(db, chrono::Local::now().date_naive()).await
}

/// Lists invoice headers, newest first.
pub async fn list_invoices(db: &DatabaseConnection) -> Result<Vec<invoice::Model>> {
    Invoice::find()
        .order_by_desc(invoice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an invoice header by id.
pub async fn get_invoice(
    db: &DatabaseConnection,
    invoice_id: i64,
) -> Result<Option<invoice::Model>> {
    Invoice::find_by_id(invoice_id)
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_invoice<C>(db: &C, invoice_id: i64) -> Result<invoice::Model>
where
    C: ConnectionTrait,
{
    Invoice::find_by_id(invoice_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("invoice", invoice_id))
}

/// Returns the line items of an invoice in insertion order, with vendor and item names.
///
/// # Errors
/// Returns `NotFound` if the invoice does not exist.
#[instrument(skip(db))]
pub async fn get_line_items(
    db: &DatabaseConnection,
    invoice_id: i64,
) -> Result<Vec<LineItemDetail>> {
    require_invoice(db, invoice_id).await?;

    let rows = LineItem::find()
        .filter(line_item::Column::InvoiceId.eq(invoice_id))
        .order_by_asc(line_item::Column::Id)
        .all(db)
        .await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let vendor_ids: Vec<i64> = rows.iter().map(|row| row.vendor_id).collect();
    let item_ids: Vec<i64> = rows.iter().map(|row| row.item_id).collect();
    let vendors: HashMap<i64, String> = Vendor::find()
        .filter(vendor::Column::Id.is_in(vendor_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|vendor| (vendor.id, vendor.name))
        .collect();
    let items: HashMap<i64, (String, String)> = Item::find()
        .filter(item::Column::Id.is_in(item_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|item| (item.id, (item.code, item.name)))
        .collect();

    let details = rows
        .into_iter()
        .map(|row| {
            let vendor_name = vendors
                .get(&row.vendor_id)
                .cloned()
                .ok_or_else(|| Error::not_found("vendor", row.vendor_id))?;
            let (item_code, item_name) = items
                .get(&row.item_id)
                .cloned()
                .ok_or_else(|| Error::not_found("item", row.item_id))?;
            Ok(LineItemDetail {
                id: row.id,
                invoice_id: row.invoice_id,
                vendor_id: row.vendor_id,
                vendor_name,
                item_id: row.item_id,
                item_code,
                item_name,
                quantity: row.quantity,
                unit_price: stored_price(&row)?,
                optional_info: row.optional_info,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    debug!("Loaded {} line items", details.len());
    Ok(details)
}

fn stored_price(row: &line_item::Model) -> Result<Decimal> {
    Decimal::from_str(&row.unit_price).map_err(|e| {
        Error::Storage(DbErr::Type(format!(
            "line item {} has unreadable unit price '{}': {e}",
            row.id, row.unit_price
        )))
    })
}

/// Counts the line items an invoice holds.
pub async fn count_line_items(db: &DatabaseConnection, invoice_id: i64) -> Result<u64> {
    LineItem::find()
        .filter(line_item::Column::InvoiceId.eq(invoice_id))
        .count(db)
        .await
        .map_err(Into::into)
}

/// What [`apply_changes`] wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedChanges {
    /// Rows actually removed; ids that were already gone are not counted
    pub deleted: u64,
    /// Ids assigned to the inserted rows, in change-set order
    pub inserted_ids: Vec<i64>,
}

/// Checks that the vendor and item exist, and that a vendor-scoped item belongs to the vendor.
async fn check_references<C>(db: &C, fields: &LineItemFields) -> Result<()>
where
    C: ConnectionTrait,
{
    Vendor::find_by_id(fields.vendor_id)
        .one(db)
        .await?
        .ok_or(Error::ReferentialIntegrity {
            entity: "vendor",
            id: fields.vendor_id,
        })?;
    let item = Item::find_by_id(fields.item_id)
        .one(db)
        .await?
        .ok_or(Error::ReferentialIntegrity {
            entity: "item",
            id: fields.item_id,
        })?;
    if item.vendor_id.is_some_and(|owner| owner != fields.vendor_id) {
        return Err(Error::ReferentialIntegrity {
            entity: "item",
            id: item.id,
        });
    }
    Ok(())
}

/// Applies pre-classified changes to one invoice in a single transaction.
///
/// Deletes run first, then updates (every field overwritten), then inserts. Deleting an id
/// that this invoice no longer holds is a no-op, so a change set can be applied again
/// after a retry or a repeated save.
///
/// # Errors
/// * `Validation` if a quantity or unit price is negative (checked before storage is touched)
/// * `NotFound` if the invoice, or an updated line item of this invoice, is missing
/// * `ReferentialIntegrity` if a vendor or item id does not resolve
/// * `Storage` on any database failure
///
/// Nothing is written unless the whole change set succeeds.
#[instrument(
    skip(db, changes),
    fields(
        updates = changes.updates.len(),
        inserts = changes.inserts.len(),
        deletes = changes.deletes.len()
    )
)]
pub async fn apply_changes(
    db: &DatabaseConnection,
    invoice_id: i64,
    changes: &ChangeSet,
) -> Result<AppliedChanges> {
    changes.validate()?;

    let txn = db.begin().await?;
    require_invoice(&txn, invoice_id).await?;

    let mut deleted = 0;
    for &id in &changes.deletes {
        let result = LineItem::delete_many()
            .filter(line_item::Column::Id.eq(id))
            .filter(line_item::Column::InvoiceId.eq(invoice_id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            debug!(id, "Line item already absent, nothing to delete");
        }
        deleted += result.rows_affected;
    }

    for (id, fields) in &changes.updates {
        let existing = LineItem::find_by_id(*id)
            .one(&txn)
            .await?
            .filter(|row| row.invoice_id == invoice_id)
            .ok_or_else(|| Error::not_found("line item", id))?;
        check_references(&txn, fields).await?;

        let mut row: line_item::ActiveModel = existing.into();
        row.vendor_id = Set(fields.vendor_id);
        row.item_id = Set(fields.item_id);
        row.quantity = Set(fields.quantity);
        row.unit_price = Set(fields.unit_price.to_string());
        row.optional_info = Set(fields.optional_info.clone());
        row.update(&txn).await?;
    }

    let mut inserted_ids = Vec::with_capacity(changes.inserts.len());
    for fields in &changes.inserts {
        check_references(&txn, fields).await?;
        let row = line_item::ActiveModel {
            invoice_id: Set(invoice_id),
            vendor_id: Set(fields.vendor_id),
            item_id: Set(fields.item_id),
            quantity: Set(fields.quantity),
            unit_price: Set(fields.unit_price.to_string()),
            optional_info: Set(fields.optional_info.clone()),
            ..Default::default()
        };
        inserted_ids.push(row.insert(&txn).await?.id);
    }

    txn.commit().await?;
    debug!(deleted, ?inserted_ids, "Committed line item changes");
    Ok(AppliedChanges {
        deleted,
        inserted_ids,
    })
}

/// Deletes an invoice header and all of its line items.
///
/// # Errors
/// Returns `NotFound` if the invoice does not exist, including when it was already deleted.
#[instrument(skip(db))]
pub async fn delete_invoice(db: &DatabaseConnection, invoice_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    require_invoice(&txn, invoice_id).await?;

    let items = LineItem::delete_many()
        .filter(line_item::Column::InvoiceId.eq(invoice_id))
        .exec(&txn)
        .await?;
    Invoice::delete_by_id(invoice_id).exec(&txn).await?;

    txn.commit().await?;
    info!(
        "Deleted invoice {invoice_id} with {} line items",
        items.rows_affected
    );
    Ok(())
}
