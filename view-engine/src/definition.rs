//! FILENAME: view-engine/src/definition.rs
//! View Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a tabular view.
//! These structures are designed to be:
//! - Serializable (view configs can live in JSON next to the view)
//! - Validated once, up front (configuration errors fail fast)
//! - Immutable for the lifetime of the view
//!
//! `ColumnSpec` is the runtime counterpart of `ColumnDefinition`: it adds the
//! optional derivation function that computes a value from the whole record.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ViewError;
use crate::filter::FilterValue;
use crate::paginate::DEFAULT_PAGE_SIZE;
use crate::sort::SortState;
use crate::value::FieldValue;

// ============================================================================
// COLUMNS
// ============================================================================

/// Semantic type of a column. Drives sort-key normalization and which
/// filter kinds the column accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnKind {
    Text,
    Number,
    Boolean,
    /// Timestamps and dates. Sorted by epoch milliseconds.
    Temporal,
    /// Multi-valued (tags, assignees).
    List,
}

impl Default for ColumnKind {
    fn default() -> Self {
        ColumnKind::Text
    }
}

/// Declares one displayable field of a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Field key passed to `Record::field`, unique within the view.
    pub key: String,

    /// Header label (defaults to the key).
    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub kind: ColumnKind,

    /// Included in the free-text search haystack.
    #[serde(default)]
    pub searchable: bool,

    #[serde(default = "default_true")]
    pub sortable: bool,

    /// Offered as a field filter.
    #[serde(default)]
    pub filterable: bool,

    /// Value is computed by a derivation function attached at build time
    /// instead of being read from the record.
    #[serde(default)]
    pub derived: bool,
}

fn default_true() -> bool {
    true
}

impl ColumnDefinition {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: ColumnKind) -> Self {
        ColumnDefinition {
            key: key.into(),
            label: label.into(),
            kind,
            searchable: false,
            sortable: true,
            filterable: false,
            derived: false,
        }
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn derived(mut self) -> Self {
        self.derived = true;
        self
    }

    /// Label shown in headers, falling back to the key.
    pub fn header(&self) -> &str {
        if self.label.is_empty() {
            &self.key
        } else {
            &self.label
        }
    }
}

// ============================================================================
// FILTERS
// ============================================================================

/// How a filter's value is tested against the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    /// Exact match on scalar fields, membership on list fields.
    Equals,
    /// Relative date window (today / week / month) on a temporal column.
    DateRange,
}

impl Default for FilterKind {
    fn default() -> Self {
        FilterKind::Equals
    }
}

/// Declares one field filter of a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDefinition {
    /// Filter key used by `set_filter`.
    pub key: String,

    /// Column the filter reads (defaults to the filter key).
    #[serde(default)]
    pub column: String,

    #[serde(default)]
    pub kind: FilterKind,

    /// Value applied when the view opens.
    #[serde(default)]
    pub initial: FilterValue,
}

impl FilterDefinition {
    pub fn new(key: impl Into<String>, column: impl Into<String>, kind: FilterKind) -> Self {
        FilterDefinition {
            key: key.into(),
            column: column.into(),
            kind,
            initial: FilterValue::All,
        }
    }

    pub fn with_initial(mut self, initial: FilterValue) -> Self {
        self.initial = initial;
        self
    }

    pub fn column_key(&self) -> &str {
        if self.column.is_empty() {
            &self.key
        } else {
            &self.column
        }
    }
}

// ============================================================================
// VIEW DEFINITION
// ============================================================================

/// Complete configuration of one list view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDefinition {
    pub columns: Vec<ColumnDefinition>,

    #[serde(default)]
    pub filters: Vec<FilterDefinition>,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Id of the signed-in user. `FilterValue::CurrentUser` resolves to it.
    #[serde(default)]
    pub identity: Option<String>,

    /// Offset from UTC used to compute date-range bucket boundaries.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    #[serde(default)]
    pub initial_sort: Option<SortState>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl ViewDefinition {
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        ViewDefinition {
            columns,
            filters: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            identity: None,
            utc_offset_minutes: 0,
            initial_sort: None,
        }
    }

    /// Parses and validates a JSON view definition.
    pub fn from_json(json: &str) -> Result<Self, ViewError> {
        let definition: ViewDefinition = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn to_json(&self) -> Result<String, ViewError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_filter(mut self, filter: FilterDefinition) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    pub fn with_initial_sort(mut self, sort: SortState) -> Self {
        self.initial_sort = Some(sort);
        self
    }

    pub fn column(&self, key: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn filter(&self, key: &str) -> Option<&FilterDefinition> {
        self.filters.iter().find(|f| f.key == key)
    }

    /// Checks the definition for programming errors: duplicate or unknown
    /// keys, filters on incompatible columns, a zero page size, and initial
    /// values the filters would reject.
    pub fn validate(&self) -> Result<(), ViewError> {
        let mut seen: FxHashMap<&str, ()> = FxHashMap::default();
        for column in &self.columns {
            if seen.insert(column.key.as_str(), ()).is_some() {
                return Err(ViewError::DuplicateColumn(column.key.clone()));
            }
        }

        let mut seen_filters: FxHashMap<&str, ()> = FxHashMap::default();
        for filter in &self.filters {
            if seen_filters.insert(filter.key.as_str(), ()).is_some() {
                return Err(ViewError::DuplicateFilter(filter.key.clone()));
            }
            let column = self
                .column(filter.column_key())
                .ok_or_else(|| ViewError::UnknownColumn(filter.column_key().to_string()))?;
            if !column.filterable {
                return Err(ViewError::FilterColumnMismatch {
                    filter: filter.key.clone(),
                    reason: format!("column {} is not filterable", column.key),
                });
            }
            if filter.kind == FilterKind::DateRange && column.kind != ColumnKind::Temporal {
                return Err(ViewError::FilterColumnMismatch {
                    filter: filter.key.clone(),
                    reason: format!("date-range filter on non-temporal column {}", column.key),
                });
            }
            crate::filter::check_value(filter, &filter.initial, self.identity.as_deref())?;
        }

        if self.page_size == 0 {
            return Err(ViewError::InvalidPageSize);
        }

        if let Some(sort) = &self.initial_sort {
            let column = self
                .column(&sort.key)
                .ok_or_else(|| ViewError::UnknownColumn(sort.key.clone()))?;
            if !column.sortable {
                return Err(ViewError::NotSortable(sort.key.clone()));
            }
        }

        Ok(())
    }
}

// ============================================================================
// RUNTIME COLUMN SPECS
// ============================================================================

/// Computes a column value from a whole record (e.g. "is overdue").
pub type DeriveFn<R> = Arc<dyn Fn(&R) -> FieldValue + Send + Sync>;

/// A column definition plus its optional derivation function.
pub struct ColumnSpec<R> {
    pub definition: ColumnDefinition,
    derive: Option<DeriveFn<R>>,
}

impl<R> ColumnSpec<R> {
    pub fn new(definition: ColumnDefinition) -> Self {
        ColumnSpec {
            definition,
            derive: None,
        }
    }

    pub fn with_derivation<F>(mut definition: ColumnDefinition, derive: F) -> Self
    where
        F: Fn(&R) -> FieldValue + Send + Sync + 'static,
    {
        definition.derived = true;
        ColumnSpec {
            definition,
            derive: Some(Arc::new(derive)),
        }
    }

    pub fn key(&self) -> &str {
        &self.definition.key
    }

    pub fn kind(&self) -> ColumnKind {
        self.definition.kind
    }

    pub fn derivation(&self) -> Option<&DeriveFn<R>> {
        self.derive.as_ref()
    }

    pub fn is_derived(&self) -> bool {
        self.definition.derived
    }
}

impl<R> Clone for ColumnSpec<R> {
    fn clone(&self) -> Self {
        ColumnSpec {
            definition: self.definition.clone(),
            derive: self.derive.clone(),
        }
    }
}

impl<R> fmt::Debug for ColumnSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("definition", &self.definition)
            .field("has_derivation", &self.derive.is_some())
            .finish()
    }
}

/// Ordered column specs with O(1) lookup by key.
pub struct ColumnSet<R> {
    specs: Vec<ColumnSpec<R>>,
    by_key: FxHashMap<String, usize>,
}

impl<R> ColumnSet<R> {
    pub fn from_definitions(definitions: &[ColumnDefinition]) -> Result<Self, ViewError> {
        let mut set = ColumnSet {
            specs: Vec::with_capacity(definitions.len()),
            by_key: FxHashMap::default(),
        };
        for definition in definitions {
            set.push(ColumnSpec::new(definition.clone()))?;
        }
        Ok(set)
    }

    pub fn push(&mut self, spec: ColumnSpec<R>) -> Result<(), ViewError> {
        if self.by_key.contains_key(spec.key()) {
            return Err(ViewError::DuplicateColumn(spec.key().to_string()));
        }
        self.by_key.insert(spec.key().to_string(), self.specs.len());
        self.specs.push(spec);
        Ok(())
    }

    /// Attaches a derivation function to a column declared as derived.
    pub fn attach<F>(&mut self, key: &str, derive: F) -> Result<(), ViewError>
    where
        F: Fn(&R) -> FieldValue + Send + Sync + 'static,
    {
        self.attach_shared(key, Arc::new(derive))
    }

    pub fn attach_shared(&mut self, key: &str, derive: DeriveFn<R>) -> Result<(), ViewError> {
        let index = *self
            .by_key
            .get(key)
            .ok_or_else(|| ViewError::UnknownColumn(key.to_string()))?;
        let spec = &mut self.specs[index];
        if !spec.is_derived() {
            return Err(ViewError::NotDerived(key.to_string()));
        }
        spec.derive = Some(derive);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ColumnSpec<R>> {
        self.by_key.get(key).map(|&i| &self.specs[i])
    }

    pub fn require(&self, key: &str) -> Result<&ColumnSpec<R>, ViewError> {
        self.get(key).ok_or_else(|| ViewError::UnknownColumn(key.to_string()))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnSpec<R>> {
        self.specs.iter()
    }

    /// Columns included in the search haystack, in declaration order.
    pub fn searchable(&self) -> impl Iterator<Item = &ColumnSpec<R>> {
        self.specs.iter().filter(|spec| spec.definition.searchable)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl<R> Clone for ColumnSet<R> {
    fn clone(&self) -> Self {
        ColumnSet {
            specs: self.specs.clone(),
            by_key: self.by_key.clone(),
        }
    }
}

impl<R> fmt::Debug for ColumnSet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.specs.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DateBucket;
    use crate::sort::SortDirection;

    fn task_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("title", "Title", ColumnKind::Text).searchable(),
            ColumnDefinition::new("status", "Status", ColumnKind::Text).filterable(),
            ColumnDefinition::new("due_date", "Due", ColumnKind::Temporal).filterable(),
            ColumnDefinition::new("tags", "Tags", ColumnKind::List).unsortable(),
        ]
    }

    #[test]
    fn test_parse_json_definition() {
        let json = r#"{
            "columns": [
                {"key": "title", "label": "Title", "searchable": true},
                {"key": "status", "filterable": true},
                {"key": "due_date", "kind": "temporal", "filterable": true}
            ],
            "filters": [
                {"key": "status"},
                {"key": "due", "column": "due_date", "kind": "dateRange",
                 "initial": {"type": "bucket", "value": "week"}}
            ],
            "pageSize": 10,
            "initialSort": {"key": "due_date", "direction": "descending"}
        }"#;

        let def = ViewDefinition::from_json(json).unwrap();
        assert_eq!(def.columns.len(), 3);
        assert_eq!(def.page_size, 10);
        assert!(def.columns[0].sortable);
        assert_eq!(def.columns[1].header(), "status");
        assert_eq!(def.filters[0].column_key(), "status");
        assert_eq!(def.filters[1].initial, FilterValue::Bucket(DateBucket::Week));
        assert_eq!(
            def.initial_sort,
            Some(SortState::new("due_date", SortDirection::Descending))
        );
    }

    #[test]
    fn test_default_page_size() {
        let def = ViewDefinition::from_json(r#"{"columns": [{"key": "title"}]}"#).unwrap();
        assert_eq!(def.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let mut columns = task_columns();
        columns.push(ColumnDefinition::new("title", "Again", ColumnKind::Text));
        let result = ViewDefinition::new(columns).validate();
        assert!(matches!(result, Err(ViewError::DuplicateColumn(key)) if key == "title"));
    }

    #[test]
    fn test_filter_on_unknown_column_rejected() {
        let def = ViewDefinition::new(task_columns())
            .with_filter(FilterDefinition::new("owner", "owner_id", FilterKind::Equals));
        assert!(matches!(def.validate(), Err(ViewError::UnknownColumn(key)) if key == "owner_id"));
    }

    #[test]
    fn test_date_range_requires_temporal_column() {
        let def = ViewDefinition::new(task_columns())
            .with_filter(FilterDefinition::new("when", "status", FilterKind::DateRange));
        assert!(matches!(def.validate(), Err(ViewError::FilterColumnMismatch { .. })));
    }

    #[test]
    fn test_filter_requires_filterable_column() {
        let def = ViewDefinition::new(task_columns())
            .with_filter(FilterDefinition::new("title", "title", FilterKind::Equals));
        assert!(matches!(def.validate(), Err(ViewError::FilterColumnMismatch { .. })));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let def = ViewDefinition::new(task_columns()).with_page_size(0);
        assert!(matches!(def.validate(), Err(ViewError::InvalidPageSize)));
    }

    #[test]
    fn test_initial_sort_must_be_sortable() {
        let def = ViewDefinition::new(task_columns())
            .with_initial_sort(SortState::new("tags", SortDirection::Ascending));
        assert!(matches!(def.validate(), Err(ViewError::NotSortable(key)) if key == "tags"));
    }

    #[test]
    fn test_attach_requires_derived_column() {
        let mut columns = task_columns();
        columns.push(ColumnDefinition::new("overdue", "Overdue", ColumnKind::Boolean).derived());
        let mut set: ColumnSet<serde_json::Value> = ColumnSet::from_definitions(&columns).unwrap();

        assert!(set.attach("overdue", |_| FieldValue::Bool(true)).is_ok());
        assert!(matches!(
            set.attach("title", |_| FieldValue::Empty),
            Err(ViewError::NotDerived(_))
        ));
        assert!(matches!(
            set.attach("nope", |_| FieldValue::Empty),
            Err(ViewError::UnknownColumn(_))
        ));
        assert!(set.get("overdue").unwrap().derivation().is_some());
    }

    #[test]
    fn test_searchable_columns_in_order() {
        let columns = vec![
            ColumnDefinition::new("b", "B", ColumnKind::Text).searchable(),
            ColumnDefinition::new("a", "A", ColumnKind::Text),
            ColumnDefinition::new("c", "C", ColumnKind::Text).searchable(),
        ];
        let set: ColumnSet<serde_json::Value> = ColumnSet::from_definitions(&columns).unwrap();
        let keys: Vec<&str> = set.searchable().map(|spec| spec.key()).collect();
        assert_eq!(keys, vec!["b", "c"]);
    }
}
