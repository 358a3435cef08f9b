//! FILENAME: view-engine/src/error.rs

use thiserror::Error;

/// Configuration errors. These indicate a programming error in the calling
/// view; bad record data never produces one.
#[derive(Error, Debug)]
pub enum ViewError {
    #[error("Invalid view definition: {0}")]
    InvalidDefinition(#[from] serde_json::Error),

    #[error("Duplicate column key: {0}")]
    DuplicateColumn(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column is not sortable: {0}")]
    NotSortable(String),

    #[error("Column is not derived: {0}")]
    NotDerived(String),

    #[error("Duplicate filter key: {0}")]
    DuplicateFilter(String),

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Filter {filter} does not accept this value: {reason}")]
    FilterColumnMismatch { filter: String, reason: String },

    #[error("Filter {0} refers to the current user but no identity is configured")]
    MissingIdentity(String),

    #[error("Page size must be at least 1")]
    InvalidPageSize,

    #[error("Record not found: {0}")]
    UnknownRecord(String),
}
