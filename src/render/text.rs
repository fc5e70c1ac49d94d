//! Fixed-width text rendering of a laid out report, used by the `show` command.

use super::layout::{PlacedRow, ReportDocument, RowKind};
use std::fmt::Write;

/// Character width of each column; numeric columns (Qty onwards) are right aligned.
const WIDTHS: [usize; 7] = [18, 10, 22, 18, 6, 11, 14];
const FIRST_NUMERIC: usize = 4;

/// Renders `document` page by page.
#[must_use]
pub fn render_text(document: &ReportDocument) -> String {
    let heading = &document.heading;
    let rule_width = WIDTHS.iter().sum::<usize>() + WIDTHS.len() - 1;
    let mut out = String::new();

    let _ = writeln!(out, "{}", heading.title);
    let _ = writeln!(
        out,
        "Invoice ID: {}    Order Date: {}",
        heading.invoice_id,
        heading.date.format("%Y-%m-%d")
    );

    for page in &document.pages {
        let _ = writeln!(out);
        let _ = writeln!(out, "--- Page {} of {} ---", page.number, document.page_count());
        for row in &page.rows {
            let _ = writeln!(out, "{}", format_row(document, row).trim_end());
            match row.kind {
                RowKind::ColumnHeader | RowKind::Subtotal => {
                    let _ = writeln!(out, "{}", "-".repeat(rule_width));
                }
                RowKind::GrandTotal => {
                    let _ = writeln!(out, "{}", "=".repeat(rule_width));
                }
                RowKind::Data => {}
            }
        }
    }
    out
}

fn format_row(document: &ReportDocument, row: &PlacedRow) -> String {
    let offsets = &document.geometry.column_offsets;
    let mut line = String::new();
    for (index, (&x, &width)) in offsets.iter().zip(WIDTHS.iter()).enumerate() {
        let text = row.cell_text(x).unwrap_or_default();
        let text = truncate(text, width);
        if index > 0 {
            line.push(' ');
        }
        if index >= FIRST_NUMERIC && row.kind != RowKind::ColumnHeader {
            let _ = write!(line, "{text:>width$}");
        } else {
            let _ = write!(line, "{text:<width$}");
        }
    }
    line
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
        short.push('~');
        short
    }
}
