//! Item entity - a catalog entry.
//!
//! `code` is the short identifier printed on reports. Items with a `vendor_id` are
//! vendor-scoped; items without one are shared by every vendor.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Item name (e.g., "Paper Towels 12ct")
    pub name: String,
    /// Short item code shown on reports (e.g., "A001")
    pub code: String,
    /// Owning vendor, None for items shared across vendors
    pub vendor_id: Option<i64>,
}

/// Defines relationships between Item and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// An item optionally belongs to one vendor
    #[sea_orm(
        belongs_to = "super::vendor::Entity",
        from = "Column::VendorId",
        to = "super::vendor::Column::Id"
    )]
    Vendor,
    /// Line items referencing this item
    #[sea_orm(has_many = "super::line_item::Entity")]
    LineItems,
}

impl Related<super::vendor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendor.def()
    }
}

impl Related<super::line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
