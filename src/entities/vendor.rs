//! Vendor entity - a wholesale supplier.
//!
//! The name is the business key; `id` is the stable surrogate referenced by items and line items.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Vendor database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vendors")]
pub struct Model {
    /// Unique identifier for the vendor
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique across vendors
    #[sea_orm(unique)]
    pub name: String,
}

/// Defines relationships between Vendor and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Vendor-scoped catalog items
    #[sea_orm(has_many = "super::item::Entity")]
    Items,
    /// Line items billed by this vendor
    #[sea_orm(has_many = "super::line_item::Entity")]
    LineItems,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
