//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust models, including the foreign keys declared by
//! each `belongs_to` relation.

use crate::entities::{Invoice, Item, LineItem, Vendor};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Fallback database location when neither `DATABASE_URL` nor config.toml name one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/invoices.sqlite?mode=rwc";

/// Gets the database URL, preferring the `DATABASE_URL` environment variable.
#[must_use]
pub fn get_database_url(configured: Option<&str>) -> String {
    std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| configured.unwrap_or(DEFAULT_DATABASE_URL).to_string())
}

/// Filesystem path of a file-backed `SQLite` URL, without the query string.
///
/// Returns `None` for in-memory databases and non-`SQLite` URLs.
#[must_use]
pub fn sqlite_file_path(database_url: &str) -> Option<&Path> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        None
    } else {
        Some(Path::new(path))
    }
}

/// Creates the directory holding the database file so `mode=rwc` can create the file.
pub fn ensure_database_directory(database_url: &str) -> Result<()> {
    if let Some(parent) = sqlite_file_path(database_url)
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)?;
        debug!("Ensured database directory {}", parent.display());
    }
    Ok(())
}

/// Establishes a connection to the `SQLite` database at `database_url`.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Opening database connection");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables that do not exist yet.
///
/// Order matters: referenced tables are created before the tables holding foreign keys.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, Vendor).await?;
    create_table(db, &schema, Item).await?;
    create_table(db, &schema, Invoice).await?;
    create_table(db, &schema, LineItem).await?;

    info!("Database tables ensured");
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        invoice::Model as InvoiceModel, item::Model as ItemModel,
        line_item::Model as LineItemModel, vendor::Model as VendorModel,
    };
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<VendorModel> = Vendor::find().limit(1).all(&db).await?;
        let _: Vec<ItemModel> = Item::find().limit(1).all(&db).await?;
        let _: Vec<InvoiceModel> = Invoice::find().limit(1).all(&db).await?;
        let _: Vec<LineItemModel> = LineItem::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_sqlite_file_path() {
        assert_eq!(
            sqlite_file_path(DEFAULT_DATABASE_URL),
            Some(Path::new("data/invoices.sqlite"))
        );
        assert_eq!(
            sqlite_file_path("sqlite:invoices.db"),
            Some(Path::new("invoices.db"))
        );
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("postgres://localhost/db"), None);
    }

    #[test]
    fn test_ensure_database_directory_creates_parent() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let db_path = dir.path().join("nested").join("invoices.sqlite");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        ensure_database_directory(&url)?;
        assert!(dir.path().join("nested").is_dir());
        ensure_database_directory("sqlite::memory:")?;
        Ok(())
    }

    #[test]
    fn test_configured_url_used_without_env_override() {
        if std::env::var("DATABASE_URL").is_err() {
            assert_eq!(
                get_database_url(Some("sqlite::memory:")),
                "sqlite::memory:"
            );
            assert_eq!(get_database_url(None), DEFAULT_DATABASE_URL);
        }
    }
}
