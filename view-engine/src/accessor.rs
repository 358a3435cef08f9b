//! FILENAME: view-engine/src/accessor.rs
//! Accessor - resolves a column's value for a record.
//!
//! Derived columns call their derivation function; every other column reads
//! the named field. The result is then normalized to the column kind so later
//! stages see one representation per column (dates as `Date`, a lone string in
//! a list column as a one-element `List`, unparseable dates as `Empty`).

use crate::definition::{ColumnKind, ColumnSpec};
use crate::record::Record;
use crate::value::FieldValue;

/// Resolves `spec`'s value for `record`. Never panics on missing data.
pub fn resolve<R: Record>(record: &R, spec: &ColumnSpec<R>) -> FieldValue {
    let raw = match spec.derivation() {
        Some(derive) => derive(record),
        // Derived column with no function attached
        None if spec.is_derived() => FieldValue::Empty,
        None => record.field(spec.key()),
    };
    normalize(raw, spec.kind())
}

/// Coerces a raw value into the shape expected for `kind`.
pub fn normalize(value: FieldValue, kind: ColumnKind) -> FieldValue {
    match (kind, value) {
        (ColumnKind::Temporal, FieldValue::Text(s)) => {
            crate::value::parse_datetime(&s).map(FieldValue::Date).unwrap_or(FieldValue::Empty)
        }
        (ColumnKind::List, FieldValue::Text(s)) => {
            if s.is_empty() {
                FieldValue::List(Vec::new())
            } else {
                FieldValue::List(vec![s])
            }
        }
        (_, value) => value,
    }
}
