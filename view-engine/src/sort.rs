//! FILENAME: view-engine/src/sort.rs
//! Sorter - single-column, stable, null-safe ordering.
//!
//! Values are first normalized into one `SortKey` variant per column kind,
//! so every column compares within a single total order:
//! - Temporal: epoch milliseconds, missing dates sort as epoch 0
//! - Number / Boolean: f64, missing values sort as 0
//! - Text / List: lowercased text, missing values sort as ""
//!
//! Rows are decorated with their key once, then sorted with a stable sort.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::accessor::resolve;
use crate::definition::{ColumnKind, ColumnSet};
use crate::record::{Record, RowIndex};
use crate::search::SEARCH_SEPARATOR;
use crate::value::FieldValue;

// ============================================================================
// SORT STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Ascending
    }
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// The one active sort of a view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortState {
    pub key: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        SortState {
            key: key.into(),
            direction,
        }
    }

    pub fn ascending(key: impl Into<String>) -> Self {
        SortState::new(key, SortDirection::Ascending)
    }

    pub fn descending(key: impl Into<String>) -> Self {
        SortState::new(key, SortDirection::Descending)
    }
}

/// Next state when a column header is clicked:
/// none -> ascending -> descending -> none. Clicking another column starts
/// over at ascending.
pub fn cycle(current: Option<&SortState>, key: &str) -> Option<SortState> {
    match current {
        Some(state) if state.key == key => match state.direction {
            SortDirection::Ascending => Some(SortState::descending(key)),
            SortDirection::Descending => None,
        },
        _ => Some(SortState::ascending(key)),
    }
}

// ============================================================================
// SORT KEYS
// ============================================================================

/// A comparable, already-normalized value.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Millis(i64),
    Number(f64),
    Text(String),
}

impl SortKey {
    /// Normalizes a resolved value for a column of `kind`.
    pub fn from_value(value: &FieldValue, kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Temporal => SortKey::Millis(value.timestamp_millis().unwrap_or(0)),
            ColumnKind::Number | ColumnKind::Boolean => {
                SortKey::Number(value.as_number().unwrap_or(0.0))
            }
            ColumnKind::Text | ColumnKind::List => {
                SortKey::Text(value.search_text(SEARCH_SEPARATOR))
            }
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Millis(_) | SortKey::Number(_) => 0,
            SortKey::Text(_) => 1,
        }
    }
}

/// Three-way comparison of two sort keys (ascending).
pub fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Millis(x), SortKey::Millis(y)) => x.cmp(y),
        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
        (SortKey::Millis(x), SortKey::Number(y)) => (*x as f64).total_cmp(y),
        (SortKey::Number(x), SortKey::Millis(y)) => x.total_cmp(&(*y as f64)),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
        (x, y) => x.rank().cmp(&y.rank()),
    }
}

/// Three-way comparison of two values as a column of `kind` would order them.
pub fn compare_values(a: &FieldValue, b: &FieldValue, kind: ColumnKind) -> Ordering {
    compare_keys(&SortKey::from_value(a, kind), &SortKey::from_value(b, kind))
}

// ============================================================================
// SORTER
// ============================================================================

/// Orders `rows` by the active sort. No sort keeps the input order.
/// Unknown sort keys leave the order unchanged; the engine rejects them earlier.
pub fn apply<R: Record>(
    records: &[R],
    rows: Vec<RowIndex>,
    sort: Option<&SortState>,
    columns: &ColumnSet<R>,
) -> Vec<RowIndex> {
    let Some(sort) = sort else {
        return rows;
    };
    let Some(spec) = columns.get(&sort.key) else {
        return rows;
    };

    let kind = spec.kind();
    let mut decorated: Vec<(SortKey, RowIndex)> = rows
        .into_iter()
        .map(|row| (SortKey::from_value(&resolve(&records[row], spec), kind), row))
        .collect();

    // slice::sort_by is stable: equal keys keep their input order
    match sort.direction {
        SortDirection::Ascending => decorated.sort_by(|a, b| compare_keys(&a.0, &b.0)),
        SortDirection::Descending => decorated.sort_by(|a, b| compare_keys(&b.0, &a.0)),
    }

    decorated.into_iter().map(|(_, row)| row).collect()
}
