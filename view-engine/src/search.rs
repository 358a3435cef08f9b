//! FILENAME: view-engine/src/search.rs
//! Search Filter - free-text search across the searchable columns.
//!
//! Matching is a case-insensitive substring test against one haystack per
//! record: the lowercased text of every searchable column, concatenated.
//! No tokenizing, no fuzzy matching.

use crate::accessor::resolve;
use crate::definition::ColumnSet;
use crate::record::{Record, RowIndex};

/// Joins list items and column texts inside the haystack.
pub const SEARCH_SEPARATOR: &str = " ";

/// Lowercases a user query. Whitespace is kept and takes part in matching.
pub fn normalize_query(query: &str) -> String {
    query.to_lowercase()
}

/// Builds the lowercased search haystack for a record.
pub fn haystack<R: Record>(record: &R, columns: &ColumnSet<R>) -> String {
    let mut text = String::new();
    for spec in columns.searchable() {
        let part = resolve(record, spec).search_text(SEARCH_SEPARATOR);
        if part.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push_str(SEARCH_SEPARATOR);
        }
        text.push_str(&part);
    }
    text
}

/// Keeps the rows whose haystack contains `query`. An empty query keeps all.
pub fn apply<R: Record>(
    records: &[R],
    rows: Vec<RowIndex>,
    query: &str,
    columns: &ColumnSet<R>,
) -> Vec<RowIndex> {
    if query.is_empty() {
        return rows;
    }
    let needle = normalize_query(query);
    rows.into_iter()
        .filter(|&row| haystack(&records[row], columns).contains(&needle))
        .collect()
}
