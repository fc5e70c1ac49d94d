//! `WholesaleInvoices` - vendor/item catalog, invoice line items and grouped reports
//!
//! This crate stores wholesale invoices in `SQLite`, reconciles an interactively edited
//! working set of line items against the persisted set in one atomic write, and exports
//! a vendor-grouped, subtotaled report paginated across fixed-height pages.

// Deny the most critical lints that could lead to bugs
#![deny(
    unsafe_code,
    unreachable_code,
    unreachable_patterns,
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::exit,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::large_enum_variant,
    clippy::match_same_arms,
    clippy::too_many_lines,
    clippy::enum_glob_use,
    clippy::semicolon_if_nothing_returned,
    clippy::wildcard_imports,
    future_incompatible,
    rust_2018_idioms,
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
)]

/// Configuration loading, database connection and schema creation
pub mod config;
/// Core business logic - catalog, invoice store, reconciliation and aggregation
pub mod core;
/// `SeaORM` entity definitions for database tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;
/// Report pagination and output backends (PDF, plain text)
pub mod render;

#[cfg(test)]
pub mod test_utils;
