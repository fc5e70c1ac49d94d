//! Report aggregation - merges duplicate line items and computes subtotals.
//!
//! Two lines merge when they share vendor name, item code and unit price. The merged row
//! keeps the first item name and info text it saw and sums the quantities. Vendors are
//! visited in lexicographic order; rows inside a vendor keep their encounter order.
//!
//! Extended costs and totals are computed on demand at full precision. Rounding to cents
//! happens only in [`format_amount`] / [`format_currency`].

use crate::core::invoice::LineItemDetail;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, HashMap};

/// One reported line: either a single line item or several merged ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    /// Vendor display name
    pub vendor_name: String,
    /// Short item code
    pub item_code: String,
    /// Item display name
    pub item_name: String,
    /// Free-form note
    pub optional_info: String,
    /// Units ordered
    pub quantity: i64,
    /// Price per unit
    pub unit_price: Decimal,
}

impl ReportLine {
    /// `quantity × unit_price`, unrounded.
    #[must_use]
    pub fn extended_cost(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

impl From<&LineItemDetail> for ReportLine {
    fn from(item: &LineItemDetail) -> Self {
        Self {
            vendor_name: item.vendor_name.clone(),
            item_code: item.item_code.clone(),
            item_name: item.item_name.clone(),
            optional_info: item.optional_info.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

/// The merged rows of one vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorGroup {
    /// Vendor display name
    pub vendor_name: String,
    /// Merged rows in encounter order
    pub rows: Vec<ReportLine>,
}

impl VendorGroup {
    /// Sum of quantities across the group.
    #[must_use]
    pub fn subtotal_quantity(&self) -> i64 {
        self.rows.iter().map(|row| row.quantity).sum()
    }

    /// Sum of extended costs across the group.
    #[must_use]
    pub fn subtotal_cost(&self) -> Decimal {
        self.rows.iter().map(ReportLine::extended_cost).sum()
    }
}

/// Invoice-wide totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportTotals {
    /// Sum of all vendor subtotal quantities
    pub quantity: i64,
    /// Sum of all vendor subtotal costs
    pub cost: Decimal,
}

/// Line items grouped by vendor, vendors in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedLines {
    groups: Vec<VendorGroup>,
}

impl GroupedLines {
    /// Vendor groups in report order.
    #[must_use]
    pub fn groups(&self) -> &[VendorGroup] {
        &self.groups
    }

    /// Total number of merged rows across vendors.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|group| group.rows.len()).sum()
    }

    /// True when there is nothing to report.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Grand totals across every vendor.
    #[must_use]
    pub fn totals(&self) -> ReportTotals {
        ReportTotals {
            quantity: self.groups.iter().map(VendorGroup::subtotal_quantity).sum(),
            cost: self.groups.iter().map(VendorGroup::subtotal_cost).sum(),
        }
    }

    /// Flattens the groups back into merged rows, in report order.
    #[must_use]
    pub fn into_lines(self) -> Vec<ReportLine> {
        self.groups
            .into_iter()
            .flat_map(|group| group.rows)
            .collect()
    }
}

/// Merges lines sharing `(vendor_name, item_code, unit_price)` and groups them by vendor.
///
/// Grouping already-merged rows again yields the same groups.
pub fn group_line_items<I>(lines: I) -> GroupedLines
where
    I: IntoIterator<Item = ReportLine>,
{
    let mut by_vendor: BTreeMap<String, Vec<ReportLine>> = BTreeMap::new();
    let mut positions: HashMap<(String, String, Decimal), usize> = HashMap::new();

    for line in lines {
        let key = (
            line.vendor_name.clone(),
            line.item_code.clone(),
            line.unit_price,
        );
        let rows = by_vendor.entry(line.vendor_name.clone()).or_default();
        if let Some(&index) = positions.get(&key) {
            rows[index].quantity += line.quantity;
        } else {
            positions.insert(key, rows.len());
            rows.push(line);
        }
    }

    GroupedLines {
        groups: by_vendor
            .into_iter()
            .map(|(vendor_name, rows)| VendorGroup { vendor_name, rows })
            .collect(),
    }
}

/// Groups the store's canonical line items for reporting.
#[must_use]
pub fn group_invoice_items(items: &[LineItemDetail]) -> GroupedLines {
    group_line_items(items.iter().map(ReportLine::from))
}

/// Rounds to cents for display, halves away from zero.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount with exactly two decimals, e.g. "26.00".
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", round_cents(amount))
}

/// Formats an amount as dollars, e.g. "$40.50" or "-$3.10".
#[must_use]
pub fn format_currency(amount: Decimal) -> String {
    if amount.is_sign_negative() && !round_cents(amount).is_zero() {
        format!("-${}", format_amount(amount.abs()))
    } else {
        format!("${}", format_amount(amount.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(vendor: &str, code: &str, quantity: i64, cents: i64) -> ReportLine {
        ReportLine {
            vendor_name: vendor.to_string(),
            item_code: code.to_string(),
            item_name: format!("{code} name"),
            optional_info: String::new(),
            quantity,
            unit_price: Decimal::new(cents, 2),
        }
    }

    #[test]
    fn test_merge_by_vendor_code_and_price() {
        let grouped = group_line_items(vec![
            line("V", "A001", 2, 300),
            line("V", "A001", 5, 300),
            line("V", "A001", 1, 500),
        ]);

        assert_eq!(grouped.groups().len(), 1);
        let group = &grouped.groups()[0];
        assert_eq!(group.rows.len(), 2);
        assert_eq!(group.rows[0].quantity, 7);
        assert_eq!(group.rows[0].unit_price, Decimal::new(300, 2));
        assert_eq!(group.rows[1].quantity, 1);
        assert_eq!(group.rows[1].unit_price, Decimal::new(500, 2));
        assert_eq!(group.subtotal_quantity(), 8);
        assert_eq!(group.subtotal_cost(), Decimal::new(2600, 2));
    }

    #[test]
    fn test_merged_row_keeps_first_name_and_info() {
        let mut first = line("V", "A001", 1, 300);
        first.item_name = "Towels".to_string();
        first.optional_info = "first note".to_string();
        let mut second = line("V", "A001", 4, 300);
        second.item_name = "Towels (renamed)".to_string();
        second.optional_info = "second note".to_string();

        let grouped = group_line_items(vec![first, second]);
        let row = &grouped.groups()[0].rows[0];
        assert_eq!(row.item_name, "Towels");
        assert_eq!(row.optional_info, "first note");
        assert_eq!(row.quantity, 5);
    }

    #[test]
    fn test_equal_prices_with_different_scale_merge() {
        let mut scaled = line("V", "A001", 1, 0);
        scaled.unit_price = Decimal::new(3, 0);
        let grouped = group_line_items(vec![line("V", "A001", 2, 300), scaled]);
        assert_eq!(grouped.row_count(), 1);
        assert_eq!(grouped.groups()[0].rows[0].quantity, 3);
    }

    #[test]
    fn test_vendors_sorted_rows_in_encounter_order() {
        let grouped = group_line_items(vec![
            line("Zephyr", "Z2", 1, 100),
            line("Acme", "A9", 1, 100),
            line("Zephyr", "Z1", 1, 100),
            line("Acme", "A1", 1, 100),
        ]);

        let vendors: Vec<&str> = grouped
            .groups()
            .iter()
            .map(|group| group.vendor_name.as_str())
            .collect();
        assert_eq!(vendors, vec!["Acme", "Zephyr"]);
        let acme_codes: Vec<&str> = grouped.groups()[0]
            .rows
            .iter()
            .map(|row| row.item_code.as_str())
            .collect();
        assert_eq!(acme_codes, vec!["A9", "A1"]);
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let grouped = group_line_items(vec![
            line("B", "X1", 2, 199),
            line("A", "Y1", 1, 250),
            line("B", "X1", 3, 199),
            line("B", "X1", 1, 200),
            line("A", "Y2", 6, 250),
            line("A", "Y1", 2, 250),
        ]);

        let regrouped = group_line_items(grouped.clone().into_lines());
        assert_eq!(regrouped, grouped);
    }

    #[test]
    fn test_grand_total_across_vendors() {
        let grouped = group_line_items(vec![
            line("V", "A001", 7, 300),
            line("V", "A001", 1, 500),
            line("W", "B001", 3, 450),
            line("W", "B002", 1, 100),
        ]);

        let subtotals: Vec<Decimal> = grouped
            .groups()
            .iter()
            .map(VendorGroup::subtotal_cost)
            .collect();
        assert_eq!(subtotals, vec![Decimal::new(2600, 2), Decimal::new(1450, 2)]);

        let totals = grouped.totals();
        assert_eq!(totals.cost, Decimal::new(4050, 2));
        assert_eq!(totals.quantity, 8 + 4);
        assert_eq!(format_currency(totals.cost), "$40.50");
    }

    #[test]
    fn test_rounding_only_at_display() {
        // 3 × 0.335 = 1.005; rounding each unit price first would print 1.02
        let grouped = group_line_items(vec![ReportLine {
            unit_price: Decimal::new(335, 3),
            ..line("V", "A001", 3, 0)
        }]);
        let cost = grouped.totals().cost;
        assert_eq!(cost, Decimal::new(1005, 3));
        assert_eq!(format_amount(cost), "1.01");
    }

    #[test]
    fn test_format_amounts() {
        assert_eq!(format_amount(Decimal::new(26, 0)), "26.00");
        assert_eq!(format_amount(Decimal::new(12345, 3)), "12.35");
        assert_eq!(format_currency(Decimal::ZERO), "$0.00");
        assert_eq!(format_currency(Decimal::new(-310, 2)), "-$3.10");
    }

    #[test]
    fn test_empty_input() {
        let grouped = group_line_items(Vec::new());
        assert!(grouped.is_empty());
        assert_eq!(grouped.totals().quantity, 0);
        assert_eq!(grouped.totals().cost, Decimal::ZERO);
    }
}
