//! Invoice export: canonical read, aggregation, layout, then an output backend.
//!
//! Exports only read from the store. A failed export leaves the invoice untouched and may
//! simply be retried.

use crate::{
    config::ReportConfig,
    core::{invoice, report},
    errors::{Error, Result},
    render::{self, ReportDocument, ReportHeading},
};
use sea_orm::DatabaseConnection;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Reads an invoice and lays out its report.
///
/// # Errors
/// Returns `NotFound` for an unknown invoice, `Config` for unusable page geometry, or any
/// storage error from the read.
#[instrument(skip(db, config))]
pub async fn build_report(
    db: &DatabaseConnection,
    invoice_id: i64,
    config: &ReportConfig,
) -> Result<ReportDocument> {
    let header = invoice::get_invoice(db, invoice_id)
        .await?
        .ok_or_else(|| Error::not_found("invoice", invoice_id))?;
    let items = invoice::get_line_items(db, invoice_id).await?;
    let grouped = report::group_invoice_items(&items);

    let heading = ReportHeading {
        title: config.title.clone(),
        invoice_id,
        date: header.date,
    };
    render::paginate(heading, &grouped, &config.page)
}

/// Exports an invoice as a PDF and returns the written path.
///
/// Without an explicit `destination` the file name comes from the configured template,
/// inside the configured output directory.
///
/// # Errors
/// Returns the errors of [`build_report`] plus `Render`/`Io` if the file cannot be produced.
#[instrument(skip(db, config))]
pub async fn export_pdf(
    db: &DatabaseConnection,
    invoice_id: i64,
    config: &ReportConfig,
    destination: Option<&Path>,
) -> Result<PathBuf> {
    let document = build_report(db, invoice_id, config).await?;
    let path = destination.map_or_else(
        || {
            render::output_path(
                &config.output_directory,
                &config.filename_template,
                invoice_id,
                document.heading.date,
            )
        },
        Path::to_path_buf,
    );

    render::write_pdf(&document, &path)?;
    info!(
        "Exported invoice {invoice_id} ({} pages) to {}",
        document.page_count(),
        path.display()
    );
    Ok(path)
}

/// Renders an invoice report as fixed-width text.
///
/// # Errors
/// Same as [`build_report`].
pub async fn export_text(
    db: &DatabaseConnection,
    invoice_id: i64,
    config: &ReportConfig,
) -> Result<String> {
    let document = build_report(db, invoice_id, config).await?;
    Ok(render::render_text(&document))
}
