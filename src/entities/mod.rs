//! Entity module - Contains all SeaORM entity definitions for the database.
//! Vendors and items form the catalog; invoices own their line items.

pub mod invoice;
pub mod item;
pub mod line_item;
pub mod vendor;

// Re-export specific types to avoid conflicts
pub use invoice::{Column as InvoiceColumn, Entity as Invoice, Model as InvoiceModel};
pub use item::{Column as ItemColumn, Entity as Item, Model as ItemModel};
pub use line_item::{Column as LineItemColumn, Entity as LineItem, Model as LineItemModel};
pub use vendor::{Column as VendorColumn, Entity as Vendor, Model as VendorModel};
