//! Output file naming.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Expands `{invoiceId}` (or `{id}`) and `{date}` in `template`, appending `.pdf` when the
/// result has no such extension.
///
/// Dates render as `YYYY-MM-DD`. Path separators produced by the template are replaced so
/// the name always stays inside the output directory.
#[must_use]
pub fn render_filename(template: &str, invoice_id: i64, date: NaiveDate) -> String {
    let id = invoice_id.to_string();
    let mut name = template
        .replace("{invoiceId}", &id)
        .replace("{id}", &id)
        .replace("{date}", &date.format("%Y-%m-%d").to_string())
        .replace(['/', '\\'], "-");
    if name.trim().is_empty() {
        name = format!("invoice_{id}");
    }
    if !name.to_ascii_lowercase().ends_with(".pdf") {
        name.push_str(".pdf");
    }
    name
}

/// Joins the rendered file name onto `directory`.
#[must_use]
pub fn output_path(directory: &Path, template: &str, invoice_id: i64, date: NaiveDate) -> PathBuf {
    directory.join(render_filename(template, invoice_id, date))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn test_default_template() {
        assert_eq!(
            render_filename("invoice_{invoiceId}_{date}", 42, date()),
            "invoice_42_2025-03-14.pdf"
        );
    }

    #[test]
    fn test_short_id_token_and_existing_extension() {
        assert_eq!(render_filename("{id}-{date}.PDF", 7, date()), "7-2025-03-14.PDF");
        assert_eq!(render_filename("report", 7, date()), "report.pdf");
    }

    #[test]
    fn test_separators_replaced() {
        assert_eq!(render_filename("{date}/{id}", 3, date()), "2025-03-14-3.pdf");
    }

    #[test]
    fn test_blank_template_falls_back() {
        assert_eq!(render_filename("  ", 9, date()), "invoice_9.pdf");
    }

    #[test]
    fn test_output_path_joins_directory() {
        let path = output_path(Path::new("reports"), "inv_{id}", 5, date());
        assert_eq!(path, Path::new("reports").join("inv_5.pdf"));
    }
}
