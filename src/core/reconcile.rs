//! Line item reconciliation.
//!
//! The editing surface keeps a [`WorkingSet`]: rows loaded from the store (tagged
//! [`LineItemEdit::Existing`]), rows typed in by the user ([`LineItemEdit::New`]) and the ids
//! the user explicitly removed. [`reconcile`] classifies that working set into updates,
//! inserts and deletes and hands the [`ChangeSet`] to the store, which applies it in one
//! transaction.
//!
//! Only ids in `deleted_ids` are deleted. A loaded row that simply disappears from the
//! working set stays persisted; it is reported in [`ReconcileOutcome::dropped_ids`].

use crate::{
    core::invoice::{self, LineItemDetail},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use tracing::{info, instrument, warn};

/// The mutable fields of a line item. An update writes all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemFields {
    /// Vendor billed for this line
    pub vendor_id: i64,
    /// Catalog item on this line
    pub item_id: i64,
    /// Units ordered, never negative
    pub quantity: i64,
    /// Price per unit, never negative
    pub unit_price: Decimal,
    /// Free-form note
    pub optional_info: String,
}

impl LineItemFields {
    /// Checks the quantity and unit price invariants.
    pub fn validate(&self) -> Result<()> {
        if self.quantity < 0 {
            return Err(Error::Validation {
                field: "quantity",
                message: format!("must not be negative, got {}", self.quantity),
            });
        }
        if self.unit_price.is_sign_negative() && !self.unit_price.is_zero() {
            return Err(Error::Validation {
                field: "unit price",
                message: format!("must not be negative, got {}", self.unit_price),
            });
        }
        Ok(())
    }
}

/// Parses a quantity typed into the editor.
pub fn parse_quantity(input: &str) -> Result<i64> {
    let quantity = input.trim().parse::<i64>().map_err(|e| Error::Validation {
        field: "quantity",
        message: format!("'{input}' is not a whole number: {e}"),
    })?;
    if quantity < 0 {
        return Err(Error::Validation {
            field: "quantity",
            message: format!("must not be negative, got {quantity}"),
        });
    }
    Ok(quantity)
}

/// Parses a unit price typed into the editor. A leading `$` is accepted.
pub fn parse_unit_price(input: &str) -> Result<Decimal> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let price = Decimal::from_str(digits).map_err(|e| Error::Validation {
        field: "unit price",
        message: format!("'{input}' is not a number: {e}"),
    })?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(Error::Validation {
            field: "unit price",
            message: format!("must not be negative, got {price}"),
        });
    }
    Ok(price)
}

/// One row of the working set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineItemEdit {
    /// A row loaded from the store, carrying its persisted id
    Existing {
        /// Persisted line item id
        id: i64,
        /// Current (possibly edited) values
        fields: LineItemFields,
    },
    /// A row that only exists in the working set so far
    New {
        /// Values entered by the user
        fields: LineItemFields,
    },
}

impl LineItemEdit {
    /// The persisted id, if any.
    #[must_use]
    pub const fn id(&self) -> Option<i64> {
        match self {
            Self::Existing { id, .. } => Some(*id),
            Self::New { .. } => None,
        }
    }

    /// The row's values.
    #[must_use]
    pub const fn fields(&self) -> &LineItemFields {
        match self {
            Self::Existing { fields, .. } | Self::New { fields } => fields,
        }
    }

    /// Mutable access for in-place edits.
    pub fn fields_mut(&mut self) -> &mut LineItemFields {
        match self {
            Self::Existing { fields, .. } | Self::New { fields } => fields,
        }
    }
}

/// The in-memory, user-edited line items of one invoice.
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    invoice_id: i64,
    rows: Vec<LineItemEdit>,
    deleted_ids: BTreeSet<i64>,
    loaded_ids: BTreeSet<i64>,
}

impl WorkingSet {
    /// An empty working set for `invoice_id`.
    #[must_use]
    pub fn new(invoice_id: i64) -> Self {
        Self {
            invoice_id,
            ..Self::default()
        }
    }

    /// Builds a working set of Existing rows from the store's canonical read.
    #[must_use]
    pub fn from_line_items(invoice_id: i64, items: &[LineItemDetail]) -> Self {
        let rows: Vec<LineItemEdit> = items
            .iter()
            .map(|item| LineItemEdit::Existing {
                id: item.id,
                fields: item.fields(),
            })
            .collect();
        let loaded_ids = items.iter().map(|item| item.id).collect();
        Self {
            invoice_id,
            rows,
            deleted_ids: BTreeSet::new(),
            loaded_ids,
        }
    }

    /// Loads the persisted line items of `invoice_id`.
    pub async fn load(db: &DatabaseConnection, invoice_id: i64) -> Result<Self> {
        let items = invoice::get_line_items(db, invoice_id).await?;
        Ok(Self::from_line_items(invoice_id, &items))
    }

    /// The invoice this working set edits.
    #[must_use]
    pub const fn invoice_id(&self) -> i64 {
        self.invoice_id
    }

    /// Current rows in display order.
    #[must_use]
    pub fn rows(&self) -> &[LineItemEdit] {
        &self.rows
    }

    /// Direct access to the rows. Removing a row here does not mark it deleted.
    pub fn rows_mut(&mut self) -> &mut Vec<LineItemEdit> {
        &mut self.rows
    }

    /// Ids explicitly marked for deletion.
    #[must_use]
    pub const fn deleted_ids(&self) -> &BTreeSet<i64> {
        &self.deleted_ids
    }

    /// Appends a row the user entered.
    pub fn push_new(&mut self, fields: LineItemFields) {
        self.rows.push(LineItemEdit::New { fields });
    }

    /// Removes the row at `index`, recording its id for deletion when it was persisted.
    pub fn remove(&mut self, index: usize) -> Option<LineItemEdit> {
        if index >= self.rows.len() {
            return None;
        }
        let removed = self.rows.remove(index);
        if let Some(id) = removed.id() {
            self.deleted_ids.insert(id);
        }
        Some(removed)
    }

    /// Removes the Existing row with `id` (if present) and records the deletion.
    pub fn remove_by_id(&mut self, id: i64) {
        self.rows.retain(|row| row.id() != Some(id));
        self.deleted_ids.insert(id);
    }

    /// Loaded ids that are neither in the rows nor marked deleted.
    #[must_use]
    pub fn dropped_ids(&self) -> Vec<i64> {
        let present: BTreeSet<i64> = self.rows.iter().filter_map(LineItemEdit::id).collect();
        self.loaded_ids
            .iter()
            .filter(|id| !present.contains(id) && !self.deleted_ids.contains(id))
            .copied()
            .collect()
    }

    /// Brings the working set in line with storage after a successful [`reconcile`].
    ///
    /// New rows become Existing rows carrying the ids in `outcome.inserted_ids` (both are in
    /// working-set order) and the applied deletions are forgotten, so saving the same working
    /// set again neither re-inserts nor re-deletes anything.
    pub fn absorb(&mut self, outcome: &ReconcileOutcome) {
        let mut inserted = outcome.inserted_ids.iter().copied();
        for row in &mut self.rows {
            if let LineItemEdit::New { fields } = row {
                let Some(id) = inserted.next() else {
                    break;
                };
                let fields = std::mem::take(fields);
                *row = LineItemEdit::Existing { id, fields };
            }
        }
        for id in std::mem::take(&mut self.deleted_ids) {
            self.loaded_ids.remove(&id);
        }
        self.loaded_ids.extend(outcome.inserted_ids.iter().copied());
    }

    /// Reconciles this working set and, on success, absorbs the outcome.
    ///
    /// On error the working set is left exactly as it was.
    pub async fn save(&mut self, db: &DatabaseConnection) -> Result<ReconcileOutcome> {
        let outcome = reconcile(db, self).await?;
        self.absorb(&outcome);
        Ok(outcome)
    }

    /// Partitions the rows into updates and inserts; deletes are `deleted_ids` verbatim.
    #[must_use]
    pub fn classify(&self) -> ChangeSet {
        let mut changes = ChangeSet {
            deletes: self.deleted_ids.clone(),
            ..ChangeSet::default()
        };
        for row in &self.rows {
            match row {
                LineItemEdit::Existing { id, fields } => {
                    if !self.deleted_ids.contains(id) {
                        changes.updates.push((*id, fields.clone()));
                    }
                }
                LineItemEdit::New { fields } => changes.inserts.push(fields.clone()),
            }
        }
        changes
    }
}

/// Pre-classified writes for one invoice, applied atomically by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Rows to overwrite, keyed by persisted id
    pub updates: Vec<(i64, LineItemFields)>,
    /// Rows to insert; the store assigns their ids
    pub inserts: Vec<LineItemFields>,
    /// Persisted ids to delete
    pub deletes: BTreeSet<i64>,
}

impl ChangeSet {
    /// True when applying would not touch storage.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty() && self.deletes.is_empty()
    }

    /// Validates every update and insert.
    pub fn validate(&self) -> Result<()> {
        self.updates
            .iter()
            .map(|(_, fields)| fields)
            .chain(&self.inserts)
            .try_for_each(LineItemFields::validate)
    }
}

/// What a successful reconciliation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Number of rows overwritten
    pub updated: usize,
    /// Ids assigned to inserted rows, in working-set order
    pub inserted_ids: Vec<i64>,
    /// Number of rows actually deleted; ids already gone are not counted
    pub deleted: u64,
    /// Line items the invoice holds afterwards
    pub remaining: u64,
    /// Loaded rows absent from the working set but not marked deleted; still persisted
    pub dropped_ids: Vec<i64>,
}

impl ReconcileOutcome {
    /// True when the invoice has no line items left.
    ///
    /// The caller may then offer to delete the invoice header; nothing here does it.
    #[must_use]
    pub const fn invoice_is_empty(&self) -> bool {
        self.remaining == 0
    }
}

/// Classifies `working_set` and applies it to the store as one transaction.
///
/// On error nothing is written and the working set is untouched, so the caller can retry
/// with it or discard it.
#[instrument(skip(db, working_set), fields(invoice_id = working_set.invoice_id()))]
pub async fn reconcile(
    db: &DatabaseConnection,
    working_set: &WorkingSet,
) -> Result<ReconcileOutcome> {
    let changes = working_set.classify();
    let dropped_ids = working_set.dropped_ids();
    if !dropped_ids.is_empty() {
        warn!(
            ?dropped_ids,
            "Rows removed without an explicit delete are kept in storage"
        );
    }

    let applied = invoice::apply_changes(db, working_set.invoice_id(), &changes).await?;
    let remaining = invoice::count_line_items(db, working_set.invoice_id()).await?;

    let outcome = ReconcileOutcome {
        updated: changes.updates.len(),
        inserted_ids: applied.inserted_ids,
        deleted: applied.deleted,
        remaining,
        dropped_ids,
    };
    info!(
        updated = outcome.updated,
        inserted = outcome.inserted_ids.len(),
        deleted = outcome.deleted,
        remaining = outcome.remaining,
        "Reconciled working set"
    );
    Ok(outcome)
}
