//! FILENAME: view-export/src/csv_writer.rs

use std::io::Write;

use view_engine::accessor::resolve;
use view_engine::{ColumnSpec, Record};

use crate::ExportError;

/// Writes one CSV line per record. Cells hold the display text of the
/// resolved value: lists joined with ", ", dates as RFC 3339, empty as "".
pub fn write_csv<R: Record, W: Write>(
    records: &[&R],
    columns: &[&ColumnSpec<R>],
    include_header: bool,
    writer: W,
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);

    if include_header {
        csv.write_record(columns.iter().map(|spec| spec.definition.header()))?;
    }

    for record in records {
        csv.write_record(columns.iter().map(|spec| resolve(*record, spec).display()))?;
    }

    csv.flush()?;
    Ok(())
}
