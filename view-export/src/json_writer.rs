//! FILENAME: view-export/src/json_writer.rs

use std::io::Write;

use serde_json::{Map, Value};
use view_engine::accessor::resolve;
use view_engine::{ColumnSpec, Record};

use crate::ExportError;

/// Builds the JSON object for one record, keyed by column key.
pub fn record_to_json<R: Record>(record: &R, columns: &[&ColumnSpec<R>]) -> Value {
    let mut object = Map::with_capacity(columns.len());
    for spec in columns {
        object.insert(spec.key().to_string(), resolve(record, spec).to_json());
    }
    Value::Object(object)
}

/// Writes the records as a pretty-printed JSON array of objects.
pub fn write_json<R: Record, W: Write>(
    records: &[&R],
    columns: &[&ColumnSpec<R>],
    mut writer: W,
) -> Result<(), ExportError> {
    let rows: Vec<Value> = records
        .iter()
        .map(|record| record_to_json(*record, columns))
        .collect();
    serde_json::to_writer_pretty(&mut writer, &rows)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
