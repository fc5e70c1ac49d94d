/// Database connection and schema creation
pub mod database;

/// Application settings loaded from config.toml
pub mod settings;

pub use settings::{
    AppConfig, CatalogSeed, ItemSeed, PageGeometry, ReportConfig, RetentionConfig, VendorSeed,
    load_app_configuration, load_config,
};
