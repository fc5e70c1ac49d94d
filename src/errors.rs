//! Error taxonomy shared by the store, the reconciler and the report backends.
//!
//! Store failures are surfaced to callers unmodified; nothing in this crate retries.

use thiserror::Error;

/// Errors raised by every fallible operation in the crate
#[derive(Debug, Error)]
pub enum Error {
    /// config.toml or page geometry is unusable
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// An invoice, vendor, item or line item id does not resolve
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record looked up
        entity: &'static str,
        /// Id or name that did not resolve
        id: String,
    },

    /// A line item write references a vendor or item absent from the catalog
    #[error("Line item references unknown {entity} (id {id})")]
    ReferentialIntegrity {
        /// "vendor" or "item"
        entity: &'static str,
        /// The unresolved id
        id: i64,
    },

    /// Quantity or unit price failed its invariant
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        message: String,
    },

    /// The database rejected or failed a statement
    #[error("Storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),

    /// Reserved: concurrent writers are not detected yet
    #[error("Invoice {invoice_id} was modified concurrently")]
    ConcurrentModification {
        /// Invoice written by someone else
        invoice_id: i64,
    },

    /// The PDF backend failed
    #[error("Report rendering error: {message}")]
    Render {
        /// Backend error text
        message: String,
    },

    /// Reading config or writing report files failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(value: lopdf::Error) -> Self {
        Self::Render {
            message: value.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
