//! Report layout and output backends.
//!
//! [`layout`] turns grouped line items into fixed-height pages; [`pdf`] and [`text`] draw
//! those pages. Nothing in here touches the database.

pub mod filename;
pub mod layout;
pub mod pdf;
pub mod text;

pub use filename::{output_path, render_filename};
pub use layout::{Cell, Page, PlacedRow, ReportDocument, ReportHeading, RowKind, paginate};
pub use pdf::write_pdf;
pub use text::render_text;
