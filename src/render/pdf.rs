//! PDF output for a laid out report.
//!
//! Pages use the two standard Type1 fonts (`F1` Helvetica, `F2` Helvetica-Bold), so the
//! file needs no embedded font data. Both fonts use `WinAnsiEncoding`; text is converted
//! to that code page and characters outside it print as `?`. Coordinates are rounded to
//! whole points.

use super::layout::{PlacedRow, ReportDocument, RowKind};
use crate::errors::Result;
use lopdf::{
    Document, Object, ObjectId, Stream,
    content::{Content, Operation},
    dictionary,
};
use std::path::Path;
use tracing::{debug, instrument};

const REGULAR: &str = "F1";
const BOLD: &str = "F2";
const TITLE_SIZE: i64 = 16;
const META_SIZE: i64 = 10;
const ROW_SIZE: i64 = 9;
/// Horizontal rules span from the first column to one inch before the right page edge.
const RULE_RIGHT_INSET: f64 = 72.0;

// Layout positions are bounded by the page size
#[allow(clippy::cast_possible_truncation)]
fn points(value: f64) -> Object {
    Object::Integer(value.round() as i64)
}

/// Converts `value` to `WinAnsiEncoding` bytes.
///
/// Latin-1 printable characters map to themselves; the typographic characters Windows-1252
/// adds at 0x80-0x9F are mapped explicitly.
#[must_use]
pub fn encode_win_ansi(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| match c {
            ' '..='~' | '\u{a0}'..='\u{ff}' => u8::try_from(u32::from(c)).unwrap_or(b'?'),
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => b'?',
        })
        .collect()
}

fn text(ops: &mut Vec<Operation>, font: &str, size: i64, x: f64, y: f64, value: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![points(x), points(y)]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(encode_win_ansi(value))],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn rule(ops: &mut Vec<Operation>, x1: f64, x2: f64, y: f64) {
    ops.push(Operation::new("m", vec![points(x1), points(y)]));
    ops.push(Operation::new("l", vec![points(x2), points(y)]));
    ops.push(Operation::new("S", vec![]));
}

fn row_operations(ops: &mut Vec<Operation>, document: &ReportDocument, row: &PlacedRow) {
    let font = if row.kind.is_bold() { BOLD } else { REGULAR };
    let size = if row.kind == RowKind::GrandTotal {
        META_SIZE
    } else {
        ROW_SIZE
    };
    for cell in &row.cells {
        text(ops, font, size, cell.x, row.y, &cell.text);
    }

    let geometry = &document.geometry;
    let left = geometry.column_offsets[0];
    let right = geometry.page_width - RULE_RIGHT_INSET;
    // Underline below subtotal and grand-total baselines
    if matches!(row.kind, RowKind::Subtotal | RowKind::GrandTotal) {
        rule(ops, left, right, row.y - geometry.row_height * 0.25);
    }
}

fn page_content(document: &ReportDocument, index: usize) -> Vec<Operation> {
    let mut ops = Vec::new();
    if index == 0 {
        let heading = &document.heading;
        let top = document.geometry.page_height;
        text(&mut ops, BOLD, TITLE_SIZE, 72.0, top - 72.0, &heading.title);
        text(
            &mut ops,
            REGULAR,
            META_SIZE,
            72.0,
            top - 90.0,
            &format!("Invoice ID: {}", heading.invoice_id),
        );
        text(
            &mut ops,
            REGULAR,
            META_SIZE,
            288.0,
            top - 90.0,
            &format!("Order Date: {}", heading.date.format("%Y-%m-%d")),
        );
    }
    for row in &document.pages[index].rows {
        row_operations(&mut ops, document, row);
    }
    ops
}

/// Builds the in-memory PDF for `document`.
///
/// # Errors
/// Returns `Render` if a content stream cannot be encoded.
pub fn build_pdf(document: &ReportDocument) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => regular_id,
            BOLD => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(document.pages.len());
    for index in 0..document.pages.len() {
        let content = Content {
            operations: page_content(document, index),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let geometry = &document.geometry;
    let page_count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            points(geometry.page_width),
            points(geometry.page_height),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    Ok(doc)
}

/// Writes `document` as a PDF file at `path`, creating parent directories as needed.
///
/// # Errors
/// Returns `Render` if the PDF cannot be built or serialised and `Io` if the file cannot be
/// written.
#[instrument(skip(document), fields(invoice_id = document.heading.invoice_id))]
pub fn write_pdf(document: &ReportDocument, path: &Path) -> Result<()> {
    let mut pdf = build_pdf(document)?;
    let mut bytes = Vec::new();
    pdf.save_to(&mut bytes)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &bytes)?;
    debug!(
        pages = document.page_count(),
        bytes = bytes.len(),
        "Wrote PDF report"
    );
    Ok(())
}
