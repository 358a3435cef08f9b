//! FILENAME: view-export/src/lib.rs
//! Tabular view export.
//!
//! Writes the selected, visible or filtered rows of a `TabularViewEngine` to
//! CSV or JSON. Rows follow the view's current sort order; values are resolved
//! exactly as the view displays them (derived columns included).

mod csv_writer;
mod error;
mod json_writer;

pub use csv_writer::write_csv;
pub use error::ExportError;
pub use json_writer::{record_to_json, write_json};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use view_engine::{log_error, log_info, ColumnSpec, Record, TabularViewEngine};

// ============================================================================
// OPTIONS
// ============================================================================

/// Which rows to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportScope {
    /// Selected records, including those hidden by search or filters.
    Selected,
    /// The current page.
    Visible,
    /// Every record matching the current search and filters, all pages.
    Filtered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Picks the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    pub scope: ExportScope,
    pub format: ExportFormat,

    /// Column keys to export, in order. `None` exports every column.
    #[serde(default)]
    pub columns: Option<Vec<String>>,

    /// Write a header row of column labels (CSV only).
    #[serde(default = "default_true")]
    pub include_header: bool,
}

fn default_true() -> bool {
    true
}

impl ExportOptions {
    pub fn new(scope: ExportScope, format: ExportFormat) -> Self {
        ExportOptions {
            scope,
            format,
            columns: None,
            include_header: true,
        }
    }

    /// Options for writing to `path`, with the format taken from its extension.
    pub fn for_path(scope: ExportScope, path: &Path) -> Result<Self, ExportError> {
        let format = ExportFormat::from_path(path)
            .ok_or_else(|| ExportError::UnsupportedFormat(path.display().to_string()))?;
        Ok(ExportOptions::new(scope, format))
    }

    pub fn with_columns<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn without_header(mut self) -> Self {
        self.include_header = false;
        self
    }
}

// ============================================================================
// EXPORT
// ============================================================================

/// Records in `scope`, in the order the view presents them.
pub fn scoped_records<R: Record>(engine: &TabularViewEngine<R>, scope: ExportScope) -> Vec<&R> {
    match scope {
        ExportScope::Selected => engine.selected_records(),
        ExportScope::Visible => engine.visible_records(),
        ExportScope::Filtered => engine.filtered_records(),
    }
}

fn export_columns<'a, R: Record>(
    engine: &'a TabularViewEngine<R>,
    keys: Option<&[String]>,
) -> Result<Vec<&'a ColumnSpec<R>>, ExportError> {
    let columns = engine.columns();
    match keys {
        Some(keys) => keys
            .iter()
            .map(|key| columns.require(key).map_err(ExportError::from))
            .collect(),
        None => Ok(columns.iter().collect()),
    }
}

/// Writes the scoped rows to `writer`. Returns the number of records written.
pub fn export_to_writer<R: Record, W: Write>(
    engine: &TabularViewEngine<R>,
    options: &ExportOptions,
    writer: W,
) -> Result<usize, ExportError> {
    let columns = export_columns(engine, options.columns.as_deref())?;
    let records = scoped_records(engine, options.scope);

    match options.format {
        ExportFormat::Csv => write_csv(&records, &columns, options.include_header, writer)?,
        ExportFormat::Json => write_json(&records, &columns, writer)?,
    }

    log_info!(
        "EXPORT",
        "exported {} records ({:?}, {:?}, {} columns)",
        records.len(),
        options.scope,
        options.format,
        columns.len()
    );
    Ok(records.len())
}

pub fn export_to_string<R: Record>(
    engine: &TabularViewEngine<R>,
    options: &ExportOptions,
) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    export_to_writer(engine, options, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| ExportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Writes the scoped rows to a file, replacing it if it exists.
pub fn export_to_path<R: Record>(
    engine: &TabularViewEngine<R>,
    options: &ExportOptions,
    path: &Path,
) -> Result<usize, ExportError> {
    let file = File::create(path).map_err(|e| {
        log_error!("EXPORT", "cannot create {}: {}", path.display(), e);
        e
    })?;
    let count = export_to_writer(engine, options, BufWriter::new(file))?;
    log_info!("EXPORT", "wrote {}", path.display());
    Ok(count)
}
