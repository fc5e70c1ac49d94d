//! Retention cleanup for old and empty invoices.

use crate::{
    entities::{Invoice, LineItem, invoice, line_item},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{QuerySelect, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Deletes every invoice dated strictly before `cutoff`, with its line items, in one
/// transaction. Returns the number of invoices removed.
#[instrument(skip(db))]
pub async fn prune_invoices_before(db: &DatabaseConnection, cutoff: NaiveDate) -> Result<u64> {
    let txn = db.begin().await?;

    let expired: Vec<i64> = Invoice::find()
        .select_only()
        .column(invoice::Column::Id)
        .filter(invoice::Column::Date.lt(cutoff))
        .into_tuple()
        .all(&txn)
        .await?;
    if expired.is_empty() {
        return Ok(0);
    }

    let items = LineItem::delete_many()
        .filter(line_item::Column::InvoiceId.is_in(expired.clone()))
        .exec(&txn)
        .await?;
    let invoices = Invoice::delete_many()
        .filter(invoice::Column::Id.is_in(expired))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    info!(
        "Pruned {} invoices dated before {cutoff} ({} line items)",
        invoices.rows_affected, items.rows_affected
    );
    Ok(invoices.rows_affected)
}

/// Deletes invoice headers that have no line items. Returns the number removed.
#[instrument(skip(db))]
pub async fn delete_empty_invoices(db: &DatabaseConnection) -> Result<u64> {
    let txn = db.begin().await?;

    let used: Vec<i64> = LineItem::find()
        .select_only()
        .column(line_item::Column::InvoiceId)
        .distinct()
        .into_tuple()
        .all(&txn)
        .await?;
    let removed = Invoice::delete_many()
        .filter(invoice::Column::Id.is_not_in(used))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    if removed.rows_affected > 0 {
        info!("Deleted {} empty invoices", removed.rows_affected);
    }
    Ok(removed.rows_affected)
}
