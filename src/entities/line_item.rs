//! Invoice line item entity.
//!
//! Each row belongs to exactly one invoice and references a vendor and a catalog item.
//! `quantity` and `unit_price` are never negative once written by the store.
//!
//! The price is kept as decimal text ("3.50") so it round-trips exactly, scale included;
//! `SQLite` would otherwise hold it as a binary float.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice line item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice_items")]
pub struct Model {
    /// Unique identifier, assigned by the store on insert
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning invoice
    pub invoice_id: i64,
    /// Vendor billed for this line
    pub vendor_id: i64,
    /// Catalog item on this line
    pub item_id: i64,
    /// Units ordered
    pub quantity: i64,
    /// Price per unit, the `Decimal` string form
    pub unit_price: String,
    /// Free-form note shown in the report's Info column
    pub optional_info: String,
}

/// Defines relationships between `LineItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line item belongs to one invoice
    #[sea_orm(
        belongs_to = "super::invoice::Entity",
        from = "Column::InvoiceId",
        to = "super::invoice::Column::Id"
    )]
    Invoice,
    /// Each line item references one vendor
    #[sea_orm(
        belongs_to = "super::vendor::Entity",
        from = "Column::VendorId",
        to = "super::vendor::Column::Id"
    )]
    Vendor,
    /// Each line item references one catalog item
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl Related<super::vendor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendor.def()
    }
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
