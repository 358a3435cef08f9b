//! FILENAME: view-engine/src/paginate.rs
//! Paginator - fixed-size pages over the filtered, sorted rows.

use serde::{Deserialize, Serialize};

use crate::record::RowIndex;

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Requested page position. `page_index` is re-clamped whenever the number
/// of filtered rows changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        PageState::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageState {
    pub fn new(page_size: usize) -> Self {
        PageState {
            page_index: 0,
            page_size,
        }
    }

    fn size(&self) -> usize {
        self.page_size.max(1)
    }

    /// `max(1, ceil(row_count / page_size))`.
    pub fn total_pages(&self, row_count: usize) -> usize {
        row_count.div_ceil(self.size()).max(1)
    }

    /// Clamps `page_index` into `[0, total_pages - 1]`. Returns true if it moved.
    pub fn clamp(&mut self, row_count: usize) -> bool {
        let last = self.total_pages(row_count) - 1;
        if self.page_index > last {
            self.page_index = last;
            true
        } else {
            false
        }
    }
}

/// One page of rows plus the numbers a pager needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub rows: Vec<RowIndex>,
    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,
    /// Rows across all pages.
    pub total_rows: usize,
}

impl Page {
    /// Zero-based offset of the first row on this page within all rows.
    pub fn start_offset(&self) -> usize {
        self.page_index * self.page_size
    }

    pub fn has_previous(&self) -> bool {
        self.page_index > 0
    }

    pub fn has_next(&self) -> bool {
        self.page_index + 1 < self.total_pages
    }
}

/// Slices `rows` to the page in `state`, clamping the index first.
pub fn apply(rows: &[RowIndex], state: &mut PageState) -> Page {
    state.clamp(rows.len());
    let size = state.size();
    let start = (state.page_index * size).min(rows.len());
    let end = (start + size).min(rows.len());

    Page {
        rows: rows[start..end].to_vec(),
        page_index: state.page_index,
        page_size: size,
        total_pages: state.total_pages(rows.len()),
        total_rows: rows.len(),
    }
}
