//! Application settings loaded from config.toml
//!
//! Every section is optional; missing values fall back to the defaults below, which
//! reproduce a US Letter report with a 1" bottom margin and 0.2" rows.

use crate::errors::{Error, Result};
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Points per inch in PDF user space.
const INCH: f64 = 72.0;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database URL; the `DATABASE_URL` environment variable takes precedence
    pub database_url: Option<String>,
    /// Report output settings
    pub report: ReportConfig,
    /// How long invoices are kept before `prune` removes them
    pub retention: RetentionConfig,
    /// Catalog entries seeded by `init`
    #[serde(flatten)]
    pub catalog: CatalogSeed,
}

/// Report output settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Heading printed at the top of the first page
    pub title: String,
    /// Directory receiving exported files; empty means the working directory
    pub output_directory: PathBuf,
    /// Output file name template, accepts `{invoiceId}` (or `{id}`) and `{date}`
    pub filename_template: String,
    /// Page layout
    pub page: PageGeometry,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Wholesale Invoices - Accounting Report".to_string(),
            output_directory: PathBuf::new(),
            filename_template: "invoice_{invoiceId}_{date}".to_string(),
            page: PageGeometry::default(),
        }
    }
}

/// Fixed page geometry in PDF points, origin at the bottom-left corner.
///
/// The vertical cursor starts at `first_page_top` on page one (below the title block) and
/// at `content_top` on every following page; each row moves it down by `row_height`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    /// Page width
    pub page_width: f64,
    /// Page height
    pub page_height: f64,
    /// Cursor position of the column header on the first page
    pub first_page_top: f64,
    /// Cursor position of the column header on continuation pages
    pub content_top: f64,
    /// Vertical space consumed by every row
    pub row_height: f64,
    /// A data row is never started below this cursor position
    pub bottom_margin: f64,
    /// Extra space left after each vendor subtotal
    pub group_gap: f64,
    /// X offsets of the seven report columns
    pub column_offsets: [f64; 7],
    /// Apply the bottom-margin check to subtotal and grand-total rows as well
    pub guard_totals: bool,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_width: 8.5 * INCH,
            page_height: 11.0 * INCH,
            first_page_top: 11.0 * INCH - 1.75 * INCH,
            content_top: 10.0 * INCH,
            row_height: 0.2 * INCH,
            bottom_margin: INCH,
            group_gap: 0.2 * INCH,
            column_offsets: [
                0.5 * INCH,
                1.7 * INCH,
                2.5 * INCH,
                4.0 * INCH,
                5.5 * INCH,
                6.0 * INCH,
                6.7 * INCH,
            ],
            guard_totals: false,
        }
    }
}

impl PageGeometry {
    /// Checks that at least one data row fits below the header on every page.
    ///
    /// Without this the paginator would break pages forever.
    pub fn validate(&self) -> Result<()> {
        if !(self.row_height.is_finite() && self.row_height > 0.0) {
            return Err(Error::Config {
                message: format!("row_height must be positive, got {}", self.row_height),
            });
        }
        let lowest_top = self.first_page_top.min(self.content_top);
        if lowest_top - self.row_height < self.bottom_margin {
            return Err(Error::Config {
                message: format!(
                    "no data row fits between header at {lowest_top} and bottom margin {}",
                    self.bottom_margin
                ),
            });
        }
        Ok(())
    }

    /// Number of data rows that fit on a continuation page.
    #[must_use]
    pub fn rows_per_page(&self) -> usize {
        let usable = self.content_top - self.row_height - self.bottom_margin;
        if usable < 0.0 {
            return 0;
        }
        // Cast safety: usable / row_height is a small non-negative page count.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rows = (usable / self.row_height).floor() as usize + 1;
        rows
    }
}

/// Invoice retention window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Whole years to keep
    pub years: u32,
    /// Additional months to keep
    pub months: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            years: 2,
            months: 0,
        }
    }
}

impl RetentionConfig {
    /// Invoices dated strictly before the returned date are expired.
    ///
    /// Months count as 30 days.
    #[must_use]
    pub fn cutoff(&self, today: NaiveDate) -> NaiveDate {
        let days = (i64::from(self.years) * 12 + i64::from(self.months)) * 30;
        today - Duration::days(days)
    }
}

/// Catalog entries to seed, keyed by vendor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogSeed {
    /// Vendors with their vendor-scoped items
    pub vendors: Vec<VendorSeed>,
    /// Items available under every vendor
    pub shared_items: Vec<ItemSeed>,
}

/// Configuration for a single vendor
#[derive(Debug, Clone, Deserialize)]
pub struct VendorSeed {
    /// Vendor name
    pub name: String,
    /// Items sold only by this vendor
    #[serde(default)]
    pub items: Vec<ItemSeed>,
}

/// Configuration for a single catalog item
#[derive(Debug, Clone, Deserialize)]
pub struct ItemSeed {
    /// Item name
    pub name: String,
    /// Short item code shown on reports
    pub code: String,
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    let config: AppConfig = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })?;
    config.report.page.validate()?;
    Ok(config)
}

/// Loads config.toml from `path` when it exists, otherwise the built-in defaults.
pub fn load_app_configuration(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let config = load_config(path)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    } else {
        info!("{} not found, using default configuration", path.display());
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            database_url = "sqlite://data/test.sqlite?mode=rwc"

            [report]
            title = "Weekly Order"
            output_directory = "out"
            filename_template = "order_{id}"

            [report.page]
            row_height = 12.0
            guard_totals = true

            [retention]
            years = 1
            months = 6

            [[vendors]]
            name = "Acme Wholesale"
            items = [
                { name = "Paper Towels", code = "A001" },
                { name = "Napkins", code = "A002" },
            ]

            [[vendors]]
            name = "Bolt Supply"

            [[shared_items]]
            name = "Delivery Fee"
            code = "FEE"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.database_url.as_deref(),
            Some("sqlite://data/test.sqlite?mode=rwc")
        );
        assert_eq!(config.report.title, "Weekly Order");
        assert_eq!(config.report.filename_template, "order_{id}");
        assert_eq!(config.report.page.row_height, 12.0);
        assert!(config.report.page.guard_totals);
        // Unspecified geometry keeps its default
        assert_eq!(config.report.page.bottom_margin, 72.0);
        assert_eq!(config.retention.years, 1);
        assert_eq!(config.retention.months, 6);
        assert_eq!(config.catalog.vendors.len(), 2);
        assert_eq!(config.catalog.vendors[0].items[1].code, "A002");
        assert!(config.catalog.vendors[1].items.is_empty());
        assert_eq!(config.catalog.shared_items[0].name, "Delivery Fee");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.retention, RetentionConfig::default());
        assert_eq!(config.report.page, PageGeometry::default());
        assert!(!config.report.page.guard_totals);
    }

    #[test]
    fn test_default_geometry_is_valid() {
        let geometry = PageGeometry::default();
        assert!(geometry.validate().is_ok());
        // 720 - 14.4 header, then rows down to the 72pt margin
        assert_eq!(geometry.rows_per_page(), 45);
    }

    #[test]
    fn test_geometry_without_room_for_rows_rejected() {
        let geometry = PageGeometry {
            content_top: 80.0,
            ..PageGeometry::default()
        };
        assert!(matches!(geometry.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_retention_cutoff() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let retention = RetentionConfig {
            years: 0,
            months: 2,
        };
        assert_eq!(
            retention.cutoff(today),
            NaiveDate::from_ymd_opt(2024, 12, 2).unwrap()
        );
    }

    #[test]
    fn test_load_config_missing_file_is_config_error() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
