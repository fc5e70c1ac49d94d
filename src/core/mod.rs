//! Core business logic, independent of the command-line front end.
//!
//! * [`catalog`] - vendors and catalog items
//! * [`invoice`] - the transactional invoice store
//! * [`reconcile`] - working sets of edited line items and their reconciliation
//! * [`report`] - duplicate merging, subtotals and totals
//! * [`export`] - report output for a stored invoice
//! * [`retention`] - pruning of old and empty invoices

pub mod catalog;
pub mod export;
pub mod invoice;
pub mod reconcile;
pub mod report;
pub mod retention;
