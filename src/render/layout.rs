//! Report pagination.
//!
//! A small state machine walks the vendor groups and places rows on fixed-height pages:
//!
//! * `PageHeader` draws the column header at the top of the content area
//! * `DataRow` draws one merged row; if the cursor is already below the bottom margin it
//!   goes through `PageBreak` first
//! * `SubtotalRow` closes a vendor group
//! * `GrandTotalRow` is drawn once after the last group
//!
//! Subtotal and grand-total rows only break pages when `guard_totals` is set; otherwise they
//! may land at or below the bottom margin.

use crate::{
    config::PageGeometry,
    core::report::{
        GroupedLines, ReportLine, ReportTotals, VendorGroup, format_amount, format_currency,
    },
    errors::Result,
};
use chrono::NaiveDate;
use tracing::debug;

/// Column titles, left to right.
pub const COLUMN_TITLES: [&str; 7] = [
    "Vendor",
    "Item Code",
    "Item Name",
    "Info",
    "Qty",
    "Unit Price",
    "Extended Cost",
];

/// What a placed row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Column titles, repeated on every page
    ColumnHeader,
    /// One merged line item
    Data,
    /// Per-vendor quantity and cost
    Subtotal,
    /// Invoice-wide quantity and cost
    GrandTotal,
}

impl RowKind {
    /// Header and total rows are printed bold.
    #[must_use]
    pub const fn is_bold(self) -> bool {
        !matches!(self, Self::Data)
    }
}

/// A text fragment at a column offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Horizontal position in points
    pub x: f64,
    /// Text to draw
    pub text: String,
}

/// A row placed on a page; `y` is the baseline in points from the bottom edge.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRow {
    /// Row role
    pub kind: RowKind,
    /// Baseline position
    pub y: f64,
    /// Non-empty cells
    pub cells: Vec<Cell>,
}

impl PlacedRow {
    /// Text of the cell drawn at offset `x`, if any.
    #[must_use]
    pub fn cell_text(&self, x: f64) -> Option<&str> {
        self.cells
            .iter()
            .find(|cell| (cell.x - x).abs() < f64::EPSILON)
            .map(|cell| cell.text.as_str())
    }
}

/// One page of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based page number
    pub number: usize,
    /// Rows in drawing order
    pub rows: Vec<PlacedRow>,
}

impl Page {
    /// Number of rows of `kind` on this page.
    #[must_use]
    pub fn count(&self, kind: RowKind) -> usize {
        self.rows.iter().filter(|row| row.kind == kind).count()
    }
}

/// Title block printed on the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeading {
    /// Report title
    pub title: String,
    /// Invoice being reported
    pub invoice_id: i64,
    /// Invoice date
    pub date: NaiveDate,
}

/// A fully laid out report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    /// First-page title block
    pub heading: ReportHeading,
    /// Geometry the pages were laid out with
    pub geometry: PageGeometry,
    /// Pages in order
    pub pages: Vec<Page>,
    /// Totals printed in the grand-total row
    pub totals: ReportTotals,
}

impl ReportDocument {
    /// Number of pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of rows of `kind` across all pages.
    #[must_use]
    pub fn count(&self, kind: RowKind) -> usize {
        self.pages.iter().map(|page| page.count(kind)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    PageHeader,
    DataRow,
    SubtotalRow,
    GrandTotalRow,
    PageBreak,
    Finished,
}

struct Paginator<'a> {
    geometry: &'a PageGeometry,
    groups: &'a [VendorGroup],
    totals: ReportTotals,
    group_index: usize,
    row_index: usize,
    cursor: f64,
    pages: Vec<Page>,
}

impl<'a> Paginator<'a> {
    fn new(geometry: &'a PageGeometry, grouped: &'a GroupedLines) -> Self {
        Self {
            geometry,
            groups: grouped.groups(),
            totals: grouped.totals(),
            group_index: 0,
            row_index: 0,
            cursor: geometry.first_page_top,
            pages: vec![Page {
                number: 1,
                rows: Vec::new(),
            }],
        }
    }

    fn run(mut self) -> Vec<Page> {
        let mut state = State::PageHeader;
        while state != State::Finished {
            state = self.step(state);
        }
        self.pages
    }

    fn step(&mut self, state: State) -> State {
        match state {
            State::PageHeader => {
                let cells = self.cells(COLUMN_TITLES.map(str::to_string));
                self.place(RowKind::ColumnHeader, cells);
                self.next_body_state()
            }
            State::DataRow => {
                if self.below_margin() {
                    return State::PageBreak;
                }
                let row = &self.groups[self.group_index].rows[self.row_index];
                let cells = self.cells(data_cells(row));
                self.place(RowKind::Data, cells);
                self.row_index += 1;
                self.next_body_state()
            }
            State::SubtotalRow => {
                if self.geometry.guard_totals && self.below_margin() {
                    return State::PageBreak;
                }
                let group = &self.groups[self.group_index];
                let cells = self.cells([
                    String::new(),
                    String::new(),
                    String::new(),
                    "Subtotal:".to_string(),
                    group.subtotal_quantity().to_string(),
                    String::new(),
                    format_amount(group.subtotal_cost()),
                ]);
                self.place(RowKind::Subtotal, cells);
                self.cursor -= self.geometry.group_gap;
                self.group_index += 1;
                self.row_index = 0;
                self.next_body_state()
            }
            State::GrandTotalRow => {
                if self.geometry.guard_totals && self.below_margin() {
                    return State::PageBreak;
                }
                let cells = self.cells([
                    "GRAND TOTAL:".to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                    self.totals.quantity.to_string(),
                    String::new(),
                    format_currency(self.totals.cost),
                ]);
                self.place(RowKind::GrandTotal, cells);
                State::Finished
            }
            State::PageBreak => {
                let number = self.pages.len() + 1;
                debug!(page = number, "Starting new report page");
                self.pages.push(Page {
                    number,
                    rows: Vec::new(),
                });
                self.cursor = self.geometry.content_top;
                State::PageHeader
            }
            State::Finished => State::Finished,
        }
    }

    fn next_body_state(&self) -> State {
        match self.groups.get(self.group_index) {
            Some(group) if self.row_index < group.rows.len() => State::DataRow,
            Some(_) => State::SubtotalRow,
            None => State::GrandTotalRow,
        }
    }

    fn below_margin(&self) -> bool {
        self.cursor < self.geometry.bottom_margin
    }

    fn cells(&self, texts: [String; 7]) -> Vec<Cell> {
        self.geometry
            .column_offsets
            .iter()
            .zip(texts)
            .filter(|(_, text)| !text.is_empty())
            .map(|(&x, text)| Cell { x, text })
            .collect()
    }

    fn place(&mut self, kind: RowKind, cells: Vec<Cell>) {
        let row = PlacedRow {
            kind,
            y: self.cursor,
            cells,
        };
        if let Some(page) = self.pages.last_mut() {
            page.rows.push(row);
        }
        self.cursor -= self.geometry.row_height;
    }
}

fn data_cells(row: &ReportLine) -> [String; 7] {
    [
        row.vendor_name.clone(),
        row.item_code.clone(),
        row.item_name.clone(),
        row.optional_info.clone(),
        row.quantity.to_string(),
        format_amount(row.unit_price),
        format_amount(row.extended_cost()),
    ]
}

/// Lays out `grouped` across pages.
///
/// # Errors
/// Returns `Config` if the geometry cannot fit a single data row per page.
pub fn paginate(
    heading: ReportHeading,
    grouped: &GroupedLines,
    geometry: &PageGeometry,
) -> Result<ReportDocument> {
    geometry.validate()?;
    let pages = Paginator::new(geometry, grouped).run();
    debug!(
        pages = pages.len(),
        rows = grouped.row_count(),
        "Paginated report"
    );
    Ok(ReportDocument {
        heading,
        geometry: geometry.clone(),
        pages,
        totals: grouped.totals(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::report::group_line_items;
    use crate::errors::Error;
    use rust_decimal::Decimal;

    /// Ten data rows per page: header at 110, rows at 100 down to 10.
    fn ten_row_geometry() -> PageGeometry {
        PageGeometry {
            page_height: 130.0,
            first_page_top: 110.0,
            content_top: 110.0,
            row_height: 10.0,
            bottom_margin: 10.0,
            group_gap: 0.0,
            ..PageGeometry::default()
        }
    }

    fn heading() -> ReportHeading {
        ReportHeading {
            title: "Test Report".to_string(),
            invoice_id: 1,
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        }
    }

    fn lines(vendor: &str, count: usize) -> Vec<ReportLine> {
        (0..count)
            .map(|i| ReportLine {
                vendor_name: vendor.to_string(),
                item_code: format!("{vendor}{i:03}"),
                item_name: format!("Item {i}"),
                optional_info: String::new(),
                quantity: 1,
                unit_price: Decimal::new(100, 2),
            })
            .collect()
    }

    fn data_rows_per_page(document: &ReportDocument) -> Vec<usize> {
        document
            .pages
            .iter()
            .map(|page| page.count(RowKind::Data))
            .collect()
    }

    #[test]
    fn test_header_repeats_on_every_page() {
        let mut all = lines("Acme", 10);
        all.extend(lines("Bolt", 10));
        all.extend(lines("Cobalt", 3));
        let grouped = group_line_items(all);
        assert_eq!(grouped.row_count(), 23);

        let document = paginate(heading(), &grouped, &ten_row_geometry()).unwrap();

        assert_eq!(document.page_count(), 3);
        assert_eq!(document.count(RowKind::ColumnHeader), 3);
        assert_eq!(data_rows_per_page(&document), vec![10, 10, 3]);
        for page in &document.pages {
            assert_eq!(page.rows[0].kind, RowKind::ColumnHeader);
        }
    }

    #[test]
    fn test_single_vendor_splits_across_pages() {
        let grouped = group_line_items(lines("Acme", 23));
        let document = paginate(heading(), &grouped, &ten_row_geometry()).unwrap();

        assert_eq!(document.count(RowKind::ColumnHeader), 3);
        assert_eq!(data_rows_per_page(&document), vec![10, 10, 3]);
        assert_eq!(document.count(RowKind::Subtotal), 1);
        assert_eq!(document.count(RowKind::GrandTotal), 1);
    }

    #[test]
    fn test_subtotal_can_print_below_margin() {
        let grouped = group_line_items(lines("Acme", 10));
        let geometry = ten_row_geometry();
        let document = paginate(heading(), &grouped, &geometry).unwrap();

        // Subtotal and grand total stay on the full first page
        assert_eq!(document.page_count(), 1);
        let subtotal = document.pages[0]
            .rows
            .iter()
            .find(|row| row.kind == RowKind::Subtotal)
            .unwrap();
        assert!(subtotal.y < geometry.bottom_margin);
    }

    #[test]
    fn test_guarded_totals_break_page() {
        let grouped = group_line_items(lines("Acme", 10));
        let geometry = PageGeometry {
            guard_totals: true,
            ..ten_row_geometry()
        };
        let document = paginate(heading(), &grouped, &geometry).unwrap();

        assert_eq!(document.page_count(), 2);
        assert_eq!(document.pages[1].count(RowKind::ColumnHeader), 1);
        assert_eq!(document.pages[1].count(RowKind::Subtotal), 1);
        assert_eq!(document.pages[1].count(RowKind::GrandTotal), 1);
        assert!(
            document
                .pages
                .iter()
                .flat_map(|page| &page.rows)
                .all(|row| row.y >= geometry.bottom_margin)
        );
    }

    #[test]
    fn test_rows_follow_vendor_order_with_subtotals() {
        let mut all = lines("Zephyr", 2);
        all.extend(lines("Acme", 1));
        let grouped = group_line_items(all);
        let document = paginate(heading(), &grouped, &PageGeometry::default()).unwrap();

        let geometry = &document.geometry;
        let kinds: Vec<RowKind> = document.pages[0].rows.iter().map(|row| row.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RowKind::ColumnHeader,
                RowKind::Data,
                RowKind::Subtotal,
                RowKind::Data,
                RowKind::Data,
                RowKind::Subtotal,
                RowKind::GrandTotal,
            ]
        );
        let first_data = &document.pages[0].rows[1];
        assert_eq!(first_data.cell_text(geometry.column_offsets[0]), Some("Acme"));
        assert_eq!(first_data.cell_text(geometry.column_offsets[6]), Some("1.00"));
        let grand_total = document.pages[0].rows.last().unwrap();
        assert_eq!(grand_total.cell_text(geometry.column_offsets[4]), Some("3"));
        assert_eq!(grand_total.cell_text(geometry.column_offsets[6]), Some("$3.00"));
    }

    #[test]
    fn test_grand_total_matches_subtotals() {
        let grouped = group_line_items(vec![
            ReportLine {
                quantity: 7,
                unit_price: Decimal::new(300, 2),
                ..lines("V", 1).remove(0)
            },
            ReportLine {
                quantity: 1,
                unit_price: Decimal::new(500, 2),
                ..lines("V", 1).remove(0)
            },
            ReportLine {
                quantity: 5,
                unit_price: Decimal::new(290, 2),
                ..lines("W", 1).remove(0)
            },
        ]);
        let document = paginate(heading(), &grouped, &PageGeometry::default()).unwrap();
        let offsets = document.geometry.column_offsets;

        let subtotals: Vec<(String, String)> = document.pages[0]
            .rows
            .iter()
            .filter(|row| row.kind == RowKind::Subtotal)
            .map(|row| {
                (
                    row.cell_text(offsets[4]).unwrap().to_string(),
                    row.cell_text(offsets[6]).unwrap().to_string(),
                )
            })
            .collect();
        assert_eq!(
            subtotals,
            vec![
                ("8".to_string(), "26.00".to_string()),
                ("5".to_string(), "14.50".to_string()),
            ]
        );

        let grand_total = document.pages[0].rows.last().unwrap();
        assert_eq!(grand_total.cell_text(offsets[4]), Some("13"));
        assert_eq!(grand_total.cell_text(offsets[6]), Some("$40.50"));
    }

    #[test]
    fn test_empty_report_has_header_and_grand_total() {
        let grouped = group_line_items(Vec::new());
        let document = paginate(heading(), &grouped, &PageGeometry::default()).unwrap();
        assert_eq!(document.page_count(), 1);
        assert_eq!(document.count(RowKind::ColumnHeader), 1);
        assert_eq!(document.count(RowKind::GrandTotal), 1);
        assert_eq!(document.count(RowKind::Data), 0);
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let geometry = PageGeometry {
            content_top: 15.0,
            ..ten_row_geometry()
        };
        let result = paginate(heading(), &group_line_items(lines("Acme", 1)), &geometry);
        assert!(matches!(result.unwrap_err(), Error::Config { .. }));
    }
}
