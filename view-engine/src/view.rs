//! FILENAME: view-engine/src/view.rs
//! View output - what a list view renders besides the rows themselves.
//!
//! `ViewSnapshot` is a serializable summary of the current view state
//! (counts, pager position, ids on the page, selection) for hosts that pass
//! state across a bridge. `FacetSummary` feeds filter dropdowns.

use serde::{Deserialize, Serialize};

use crate::filter::{FilterState, FilterValue};
use crate::record::RecordId;
use crate::sort::SortState;

/// Summary of one computed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    /// Records in the source collection.
    pub total_records: usize,

    /// Records left after search and filters.
    pub matched_records: usize,

    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,

    /// Ids on the current page, in display order.
    pub visible_ids: Vec<RecordId>,

    /// Selected ids, sorted.
    pub selected_ids: Vec<RecordId>,

    pub query: String,
    pub sort: Option<SortState>,
    pub filters: FilterState,

    /// Every matched record is selected (and there is at least one).
    pub all_selected: bool,
}

/// One option of a filter dropdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetValue {
    /// Value to pass to `set_filter` when this option is picked.
    pub value: FilterValue,
    pub label: String,
    /// Records carrying this value.
    pub count: usize,
}

/// Distinct values of a filter's column with their counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetSummary {
    pub filter_key: String,
    pub values: Vec<FacetValue>,
    /// Records with no value for the column.
    pub blank_count: usize,
}
