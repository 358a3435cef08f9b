//! FILENAME: view-export/src/error.rs

use thiserror::Error;
use view_engine::ViewError;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON write error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("View error: {0}")]
    View(#[from] ViewError),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
}
