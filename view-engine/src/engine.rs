//! FILENAME: view-engine/src/engine.rs
//! Tabular View Engine - orchestrates the pipeline for one list view.
//!
//! Every mutation recomputes in a fixed order:
//! raw -> search -> field filters -> sort -> clamp page -> paginate
//!
//! The filtered and sorted row list is cached under the tuple
//! (raw version, query, filter state, sort, start of today). A mutation that
//! leaves the tuple unchanged (paging, selection) reuses it; anything else
//! recomputes from the raw records.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDateTime};
use rustc_hash::FxHashMap;

use crate::accessor::resolve;
use crate::action::{RowAction, RowActionHandler, RowActionKind};
use crate::clock::{Clock, SystemClock};
use crate::definition::{ColumnKind, ColumnSet, DeriveFn, FilterKind, ViewDefinition};
use crate::error::ViewError;
use crate::filter::{
    check_value, matches_filter, offset_from_minutes, DateBucket, FilterContext, FilterSet,
    FilterState, FilterValue,
};
use crate::paginate::{self, Page, PageState};
use crate::record::{Record, RecordId, RowIndex};
use crate::search;
use crate::selection::SelectionModel;
use crate::sort::{self, compare_values, SortDirection, SortState};
use crate::value::FieldValue;
use crate::view::{FacetSummary, FacetValue, ViewSnapshot};
use crate::{log_debug, log_info, log_warn};

// ============================================================================
// STAGE CACHE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct StageKey {
    raw_version: u64,
    query: String,
    filters: FilterState,
    sort: Option<SortState>,
    start_of_today: NaiveDateTime,
}

#[derive(Debug, Clone)]
struct StageCache {
    key: StageKey,
    /// Filtered and sorted rows.
    rows: Vec<RowIndex>,
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builds a `TabularViewEngine` from a definition plus the parts that cannot
/// be serialized: derivation functions, the clock and the action handler.
pub struct ViewEngineBuilder<R: Record> {
    definition: ViewDefinition,
    derivations: Vec<(String, DeriveFn<R>)>,
    records: Vec<R>,
    clock: Box<dyn Clock>,
    action_handler: Option<Box<dyn RowActionHandler>>,
}

impl<R: Record> ViewEngineBuilder<R> {
    /// Attaches the function computing a derived column.
    pub fn derive<F>(mut self, key: impl Into<String>, derive: F) -> Self
    where
        F: Fn(&R) -> FieldValue + Send + Sync + 'static,
    {
        let derive: DeriveFn<R> = Arc::new(derive);
        self.derivations.push((key.into(), derive));
        self
    }

    pub fn records(mut self, records: Vec<R>) -> Self {
        self.records = records;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn on_action(mut self, handler: impl RowActionHandler + 'static) -> Self {
        self.action_handler = Some(Box::new(handler));
        self
    }

    pub fn build(self) -> Result<TabularViewEngine<R>, ViewError> {
        let definition = self.definition;
        definition.validate()?;

        let mut columns = ColumnSet::from_definitions(&definition.columns)?;
        for (key, derive) in self.derivations {
            columns.attach_shared(&key, derive)?;
        }

        let filters = FilterSet::new(definition.filters.clone());
        let filter_state = filters.initial_state();
        let offset = offset_from_minutes(definition.utc_offset_minutes);

        let mut engine = TabularViewEngine {
            page_state: PageState::new(definition.page_size),
            sort: definition.initial_sort.clone(),
            definition,
            columns,
            filters,
            offset,
            records: Vec::new(),
            index_by_id: FxHashMap::default(),
            raw_version: 0,
            query: String::new(),
            filter_state,
            selection: SelectionModel::new(),
            clock: self.clock,
            action_handler: self.action_handler,
            stages: None,
            page: Page::default(),
        };
        engine.install_records(self.records);
        engine.recompute();

        log_info!(
            "VIEW",
            "built view columns={} filters={} records={}",
            engine.columns.len(),
            engine.definition.filters.len(),
            engine.records.len()
        );
        Ok(engine)
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// One list view's search/filter/sort/page/selection state over a resident
/// record collection.
pub struct TabularViewEngine<R: Record> {
    definition: ViewDefinition,
    columns: ColumnSet<R>,
    filters: FilterSet,
    offset: FixedOffset,

    records: Vec<R>,
    index_by_id: FxHashMap<RecordId, RowIndex>,
    /// Bumped whenever the record collection is replaced.
    raw_version: u64,

    query: String,
    filter_state: FilterState,
    sort: Option<SortState>,
    page_state: PageState,
    selection: SelectionModel,

    clock: Box<dyn Clock>,
    action_handler: Option<Box<dyn RowActionHandler>>,

    stages: Option<StageCache>,
    page: Page,
}

impl<R: Record> TabularViewEngine<R> {
    pub fn builder(definition: ViewDefinition) -> ViewEngineBuilder<R> {
        ViewEngineBuilder {
            definition,
            derivations: Vec::new(),
            records: Vec::new(),
            clock: Box::new(SystemClock),
            action_handler: None,
        }
    }

    pub fn new(definition: ViewDefinition, records: Vec<R>) -> Result<Self, ViewError> {
        Self::builder(definition).records(records).build()
    }

    // ------------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------------

    fn install_records(&mut self, records: Vec<R>) {
        let mut index_by_id = FxHashMap::default();
        for (row, record) in records.iter().enumerate() {
            let id = record.id();
            if index_by_id.contains_key(&id) {
                log_warn!("VIEW", "duplicate record id {} at row {}, keeping first", id, row);
                continue;
            }
            index_by_id.insert(id, row);
        }

        self.records = records;
        self.index_by_id = index_by_id;
        self.raw_version += 1;

        let index_by_id = &self.index_by_id;
        let pruned = self.selection.retain_existing(|id| index_by_id.contains_key(id));
        if pruned > 0 {
            log_debug!("SELECT", "pruned {} selected ids no longer in source", pruned);
        }
    }

    fn filter_context(&self) -> FilterContext<'_> {
        FilterContext::new(self.definition.identity.as_deref(), self.clock.now(), self.offset)
    }

    /// Runs the pipeline. Cheap when only the page or selection changed.
    fn recompute(&mut self) {
        let context = self.filter_context();
        let key = StageKey {
            raw_version: self.raw_version,
            query: self.query.clone(),
            filters: self.filter_state.clone(),
            sort: self.sort.clone(),
            start_of_today: context.start_of_today,
        };

        let cached = matches!(&self.stages, Some(stages) if stages.key == key);
        if !cached {
            let all: Vec<RowIndex> = (0..self.records.len()).collect();
            let searched = search::apply(&self.records, all, &self.query, &self.columns);
            let searched_count = searched.len();
            let filtered = self.filters.apply(
                &self.records,
                searched,
                &self.filter_state,
                &self.columns,
                &context,
            );
            let filtered_count = filtered.len();
            let rows = sort::apply(&self.records, filtered, self.sort.as_ref(), &self.columns);

            log_debug!(
                "VIEW",
                "recompute raw={} searched={} filtered={} sort={:?}",
                self.records.len(),
                searched_count,
                filtered_count,
                self.sort
            );
            self.stages = Some(StageCache { key, rows });
        } else {
            log_debug!("VIEW", "stage cache hit (raw_version={})", self.raw_version);
        }

        let rows: &[RowIndex] = match &self.stages {
            Some(stages) => &stages.rows,
            None => &[],
        };
        let requested = self.page_state.page_index;
        self.page = paginate::apply(rows, &mut self.page_state);
        if self.page_state.page_index != requested {
            log_debug!(
                "VIEW",
                "page clamped {} -> {} (total_pages={})",
                requested,
                self.page_state.page_index,
                self.page.total_pages
            );
        }
    }

    /// Recomputes against the current time (date buckets move at midnight).
    pub fn refresh(&mut self) {
        self.recompute();
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Replaces the source records. Selected ids that no longer exist are dropped.
    pub fn set_records(&mut self, records: Vec<R>) {
        self.install_records(records);
        self.recompute();
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.recompute();
    }

    pub fn clear_query(&mut self) {
        self.set_query(String::new());
    }

    /// Sets one filter. `FilterValue::All` removes it.
    pub fn set_filter(&mut self, key: &str, value: FilterValue) -> Result<(), ViewError> {
        let definition = self.filters.require(key)?;
        check_value(definition, &value, self.definition.identity.as_deref())?;
        log_debug!("VIEW", "set_filter {}={:?}", key, value);
        self.filter_state.set(key, value);
        self.recompute();
        Ok(())
    }

    pub fn clear_filter(&mut self, key: &str) -> Result<(), ViewError> {
        self.set_filter(key, FilterValue::All)
    }

    pub fn clear_filters(&mut self) {
        self.filter_state.clear();
        self.recompute();
    }

    /// Sets or clears the active sort.
    pub fn set_sort(&mut self, sort: Option<SortState>) -> Result<(), ViewError> {
        if let Some(sort) = &sort {
            self.check_sortable(&sort.key)?;
        }
        self.sort = sort;
        self.recompute();
        Ok(())
    }

    pub fn sort_by(&mut self, key: &str, direction: SortDirection) -> Result<(), ViewError> {
        self.set_sort(Some(SortState::new(key, direction)))
    }

    /// Header-click behavior: none -> ascending -> descending -> none.
    pub fn toggle_sort(&mut self, key: &str) -> Result<Option<&SortState>, ViewError> {
        self.check_sortable(key)?;
        self.sort = sort::cycle(self.sort.as_ref(), key);
        self.recompute();
        Ok(self.sort.as_ref())
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
        self.recompute();
    }

    fn check_sortable(&self, key: &str) -> Result<(), ViewError> {
        let spec = self.columns.require(key)?;
        if !spec.definition.sortable {
            return Err(ViewError::NotSortable(key.to_string()));
        }
        Ok(())
    }

    /// Moves to a page. Out-of-range indexes are clamped.
    pub fn set_page(&mut self, page_index: usize) {
        self.page_state.page_index = page_index;
        self.recompute();
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page_state.page_index.saturating_add(1));
    }

    pub fn previous_page(&mut self) {
        self.set_page(self.page_state.page_index.saturating_sub(1));
    }

    /// Changes the page size, keeping the first row of the current page visible.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), ViewError> {
        if page_size == 0 {
            return Err(ViewError::InvalidPageSize);
        }
        let first_row = self.page.start_offset();
        self.page_state = PageState {
            page_index: first_row / page_size,
            page_size,
        };
        self.recompute();
        Ok(())
    }

    /// Flips the selection of a record. The record need not be in the current
    /// view, but it must exist in the source.
    pub fn toggle_selection(&mut self, id: &str) -> Result<bool, ViewError> {
        if !self.index_by_id.contains_key(id) {
            return Err(ViewError::UnknownRecord(id.to_string()));
        }
        let selected = self.selection.toggle(id);
        log_debug!("SELECT", "toggle {} -> {}", id, selected);
        self.recompute();
        Ok(selected)
    }

    /// Replaces the selection with every record matching the current search
    /// and filters (all pages).
    pub fn select_all(&mut self) {
        let ids: Vec<RecordId> = self.filtered_rows().iter().map(|&row| self.records[row].id()).collect();
        log_debug!("SELECT", "select_all {} ids", ids.len());
        self.selection.select_all(ids);
        self.recompute();
    }

    /// Replaces the selection with the records on the current page.
    pub fn select_page(&mut self) {
        let ids: Vec<RecordId> = self.page.rows.iter().map(|&row| self.records[row].id()).collect();
        log_debug!("SELECT", "select_page {} ids", ids.len());
        self.selection.select_all(ids);
        self.recompute();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.recompute();
    }

    pub fn set_action_handler(&mut self, handler: impl RowActionHandler + 'static) {
        self.action_handler = Some(Box::new(handler));
    }

    /// Forwards a row action to the registered handler. Returns false when no
    /// handler is registered.
    pub fn dispatch(
        &mut self,
        record_id: &str,
        kind: RowActionKind,
        payload: serde_json::Value,
    ) -> Result<bool, ViewError> {
        if !self.index_by_id.contains_key(record_id) {
            return Err(ViewError::UnknownRecord(record_id.to_string()));
        }
        let action = RowAction {
            record_id: record_id.to_string(),
            kind,
            payload,
        };
        match self.action_handler.as_mut() {
            Some(handler) => {
                log_info!("ACTION", "{:?} record={}", action.kind, action.record_id);
                handler.handle(action);
                Ok(true)
            }
            None => {
                log_warn!("ACTION", "no handler for {:?} record={}", action.kind, action.record_id);
                Ok(false)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Readers
    // ------------------------------------------------------------------------

    pub fn definition(&self) -> &ViewDefinition {
        &self.definition
    }

    pub fn columns(&self) -> &ColumnSet<R> {
        &self.columns
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn record(&self, id: &str) -> Option<&R> {
        self.index_by_id.get(id).map(|&row| &self.records[row])
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter_state
    }

    pub fn sort_state(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    pub fn page_state(&self) -> PageState {
        self.page_state
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Rows matching search and filters, in sorted order.
    pub fn filtered_rows(&self) -> &[RowIndex] {
        match &self.stages {
            Some(stages) => &stages.rows,
            None => &[],
        }
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered_rows().len()
    }

    pub fn filtered_records(&self) -> Vec<&R> {
        self.filtered_rows().iter().map(|&row| &self.records[row]).collect()
    }

    /// Records on the current page, in display order.
    pub fn visible_records(&self) -> Vec<&R> {
        self.page.rows.iter().map(|&row| &self.records[row]).collect()
    }

    pub fn visible_ids(&self) -> Vec<RecordId> {
        self.page.rows.iter().map(|&row| self.records[row].id()).collect()
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.is_selected(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    /// Selected records: those matching the current view first, in display
    /// order, then selected records hidden by search or filters, in source order.
    /// Duplicate ids resolve to their first row only.
    pub fn selected_records(&self) -> Vec<&R> {
        let mut result = Vec::with_capacity(self.selection.len());
        let mut taken = vec![false; self.records.len()];
        for &row in self.filtered_rows() {
            if self.is_selected_row(row) {
                taken[row] = true;
                result.push(&self.records[row]);
            }
        }
        for row in 0..self.records.len() {
            if !taken[row] && self.is_selected_row(row) {
                result.push(&self.records[row]);
            }
        }
        result
    }

    /// True when `row` is the indexed row of a selected id.
    fn is_selected_row(&self, row: RowIndex) -> bool {
        let id = self.records[row].id();
        self.index_by_id.get(&id) == Some(&row) && self.selection.is_selected(&id)
    }

    /// State of the "select all" checkbox: every matched record is selected
    /// and at least one matched.
    pub fn all_visible_selected(&self) -> bool {
        let rows = self.filtered_rows();
        !rows.is_empty()
            && rows
                .iter()
                .all(|&row| self.selection.is_selected(&self.records[row].id()))
    }

    /// Resolves one column of a record, as every stage sees it.
    pub fn value(&self, record: &R, column_key: &str) -> Result<FieldValue, ViewError> {
        Ok(resolve(record, self.columns.require(column_key)?))
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            total_records: self.records.len(),
            matched_records: self.filtered_count(),
            page_index: self.page.page_index,
            page_size: self.page.page_size,
            total_pages: self.page.total_pages,
            visible_ids: self.visible_ids(),
            selected_ids: self.selection.ids().into_iter().map(String::from).collect(),
            query: self.query.clone(),
            sort: self.sort.clone(),
            filters: self.filter_state.clone(),
            all_selected: self.all_visible_selected(),
        }
    }

    /// Distinct values of a filter's column across all records, for filter
    /// dropdowns. List fields count each element; date-range filters count
    /// records per bucket.
    pub fn facet_values(&self, filter_key: &str) -> Result<FacetSummary, ViewError> {
        let definition = self.filters.require(filter_key)?;
        let spec = self.columns.require(definition.column_key())?;

        if definition.kind == FilterKind::DateRange {
            let context = self.filter_context();
            let mut values = Vec::new();
            for bucket in [DateBucket::Today, DateBucket::Week, DateBucket::Month] {
                let value = FilterValue::Bucket(bucket);
                let count = self
                    .records
                    .iter()
                    .filter(|r| matches_filter(*r, definition, &value, &self.columns, &context))
                    .count();
                let label = format!("{:?}", bucket).to_lowercase();
                values.push(FacetValue { value, label, count });
            }
            let blank_count = self
                .records
                .iter()
                .filter(|r| resolve(*r, spec).as_datetime().is_none())
                .count();
            return Ok(FacetSummary {
                filter_key: filter_key.to_string(),
                values,
                blank_count,
            });
        }

        let mut counts: FxHashMap<String, (FieldValue, usize)> = FxHashMap::default();
        let mut blank_count = 0;
        for record in &self.records {
            let value = resolve(record, spec);
            if value.is_blank() {
                blank_count += 1;
                continue;
            }
            let items = match value {
                FieldValue::List(items) => items.into_iter().map(FieldValue::Text).collect(),
                other => vec![other],
            };
            for item in items {
                counts
                    .entry(item.display())
                    .or_insert_with(|| (item, 0))
                    .1 += 1;
            }
        }

        let kind = match spec.kind() {
            ColumnKind::List => ColumnKind::Text,
            other => other,
        };
        let mut entries: Vec<(String, (FieldValue, usize))> = counts.into_iter().collect();
        // Label tiebreak keeps the order independent of hash iteration
        entries.sort_by(|a, b| compare_values(&a.1 .0, &b.1 .0, kind).then_with(|| a.0.cmp(&b.0)));

        Ok(FacetSummary {
            filter_key: filter_key.to_string(),
            values: entries
                .into_iter()
                .map(|(label, (value, count))| FacetValue {
                    value: FilterValue::Value(value),
                    label,
                    count,
                })
                .collect(),
            blank_count,
        })
    }
}
