//! FILENAME: view-engine/src/filter.rs
//! Field Filters - exact/categorical filters and relative date buckets.
//!
//! Every active filter must pass (logical AND). `FilterValue::All` and blank
//! values (empty text, empty list, `FieldValue::Empty`) mean "no constraint"
//! and are never stored in a `FilterState`.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Months, NaiveDateTime, NaiveTime, Offset, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::accessor::resolve;
use crate::definition::{ColumnSet, FilterDefinition, FilterKind};
use crate::error::ViewError;
use crate::record::{Record, RowIndex};
use crate::value::FieldValue;

// ============================================================================
// FILTER VALUES
// ============================================================================

/// Relative time window for date-range filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateBucket {
    /// From start of today to start of tomorrow.
    Today,
    /// Seven days from start of today.
    Week,
    /// One calendar month from start of today.
    Month,
}

impl DateBucket {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "today" => Some(DateBucket::Today),
            "week" => Some(DateBucket::Week),
            "month" => Some(DateBucket::Month),
            _ => None,
        }
    }

    /// Half-open window `[start, end)` in local wall-clock time.
    pub fn window(self, start_of_today: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
        let end = match self {
            DateBucket::Today => start_of_today + TimeDelta::days(1),
            DateBucket::Week => start_of_today + TimeDelta::days(7),
            DateBucket::Month => start_of_today
                .checked_add_months(Months::new(1))
                .unwrap_or(start_of_today + TimeDelta::days(31)),
        };
        (start_of_today, end)
    }
}

/// The selected value of one filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum FilterValue {
    /// No constraint.
    All,
    /// Field equals (or, for lists, contains) this value.
    Value(FieldValue),
    /// Date falls inside this bucket.
    Bucket(DateBucket),
    /// Field equals (or contains) the view's configured identity.
    CurrentUser,
}

impl Default for FilterValue {
    fn default() -> Self {
        FilterValue::All
    }
}

impl FilterValue {
    pub fn value(value: impl Into<FieldValue>) -> Self {
        FilterValue::Value(value.into())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, FilterValue::All)
    }

    /// True for `All` and for blank values, which dropdowns use for "any".
    pub fn is_unconstrained(&self) -> bool {
        match self {
            FilterValue::All => true,
            FilterValue::Value(value) => value.is_blank(),
            _ => false,
        }
    }
}

/// Currently selected value per filter key. Keys are kept sorted so two
/// states with the same selections compare equal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    values: BTreeMap<String, FilterValue>,
}

impl FilterState {
    pub fn new() -> Self {
        FilterState::default()
    }

    /// Sets a filter. Setting `All` or a blank value removes the constraint.
    pub fn set(&mut self, key: impl Into<String>, value: FilterValue) {
        let key = key.into();
        if value.is_unconstrained() {
            self.values.remove(&key);
        } else {
            self.values.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> &FilterValue {
        static ALL: FilterValue = FilterValue::All;
        self.values.get(key).unwrap_or(&ALL)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Active (non-`All`) filters in key order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ============================================================================
// EVALUATION CONTEXT
// ============================================================================

/// Inputs a filter pass needs besides the records: the injected identity
/// and the local start of today for date buckets.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    pub identity: Option<&'a str>,
    pub start_of_today: NaiveDateTime,
    pub offset: FixedOffset,
}

impl<'a> FilterContext<'a> {
    pub fn new(identity: Option<&'a str>, now: DateTime<Utc>, offset: FixedOffset) -> Self {
        FilterContext {
            identity,
            start_of_today: start_of_day(now, offset),
            offset,
        }
    }
}

/// Builds the offset for a minutes-from-UTC setting. Out-of-range values
/// (beyond +/- 24h) fall back to UTC.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
}

/// Local midnight of the day containing `now`.
pub fn start_of_day(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDateTime {
    let local = now.with_timezone(&offset).naive_local();
    local.date().and_time(NaiveTime::MIN)
}

// ============================================================================
// FILTER SET
// ============================================================================

/// Validates a value against a filter definition.
pub fn check_value(
    definition: &FilterDefinition,
    value: &FilterValue,
    identity: Option<&str>,
) -> Result<(), ViewError> {
    if value.is_unconstrained() {
        return Ok(());
    }
    match (definition.kind, value) {
        (FilterKind::DateRange, FilterValue::Bucket(_)) => Ok(()),
        (FilterKind::DateRange, _) => Err(ViewError::FilterColumnMismatch {
            filter: definition.key.clone(),
            reason: "date-range filters only accept bucket values".to_string(),
        }),
        (FilterKind::Equals, FilterValue::Bucket(_)) => Err(ViewError::FilterColumnMismatch {
            filter: definition.key.clone(),
            reason: "bucket values need a date-range filter".to_string(),
        }),
        (FilterKind::Equals, FilterValue::CurrentUser) if identity.is_none() => {
            Err(ViewError::MissingIdentity(definition.key.clone()))
        }
        (FilterKind::Equals, _) => Ok(()),
    }
}

/// The filter definitions of one view.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    definitions: Vec<FilterDefinition>,
}

impl FilterSet {
    pub fn new(definitions: Vec<FilterDefinition>) -> Self {
        FilterSet { definitions }
    }

    pub fn get(&self, key: &str) -> Option<&FilterDefinition> {
        self.definitions.iter().find(|d| d.key == key)
    }

    pub fn require(&self, key: &str) -> Result<&FilterDefinition, ViewError> {
        self.get(key).ok_or_else(|| ViewError::UnknownFilter(key.to_string()))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilterDefinition> {
        self.definitions.iter()
    }

    /// Initial state from each definition's `initial` value.
    pub fn initial_state(&self) -> FilterState {
        let mut state = FilterState::new();
        for definition in &self.definitions {
            state.set(definition.key.clone(), definition.initial.clone());
        }
        state
    }

    /// Keeps the rows that pass every active filter in `state`.
    pub fn apply<R: Record>(
        &self,
        records: &[R],
        rows: Vec<RowIndex>,
        state: &FilterState,
        columns: &ColumnSet<R>,
        context: &FilterContext<'_>,
    ) -> Vec<RowIndex> {
        let active: Vec<(&FilterDefinition, &FilterValue)> = state
            .active()
            .filter_map(|(key, value)| self.get(key).map(|d| (d, value)))
            .collect();
        if active.is_empty() {
            return rows;
        }

        rows.into_iter()
            .filter(|&row| {
                active.iter().all(|(definition, value)| {
                    matches_filter(&records[row], definition, value, columns, context)
                })
            })
            .collect()
    }
}

/// Tests one record against one filter.
pub fn matches_filter<R: Record>(
    record: &R,
    definition: &FilterDefinition,
    value: &FilterValue,
    columns: &ColumnSet<R>,
    context: &FilterContext<'_>,
) -> bool {
    let spec = match columns.get(definition.column_key()) {
        Some(spec) => spec,
        None => return false,
    };

    match value {
        FilterValue::All => true,
        FilterValue::Value(wanted) => resolve(record, spec).matches(wanted),
        FilterValue::CurrentUser => match context.identity {
            Some(identity) => resolve(record, spec).matches(&FieldValue::text(identity)),
            None => false,
        },
        FilterValue::Bucket(bucket) => match resolve(record, spec).as_datetime() {
            Some(date) => {
                let local = date.with_timezone(&context.offset).naive_local();
                let (start, end) = bucket.window(context.start_of_today);
                local >= start && local < end
            }
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ColumnDefinition, ColumnKind};
    use chrono::TimeZone;
    use serde_json::{json, Value};

    fn columns() -> ColumnSet<Value> {
        ColumnSet::from_definitions(&[
            ColumnDefinition::new("status", "Status", ColumnKind::Text).filterable(),
            ColumnDefinition::new("priority", "Priority", ColumnKind::Text).filterable(),
            ColumnDefinition::new("assignees", "Assignees", ColumnKind::List).filterable(),
            ColumnDefinition::new("due_date", "Due", ColumnKind::Temporal),
        ])
        .unwrap()
    }

    fn filters() -> FilterSet {
        FilterSet::new(vec![
            FilterDefinition::new("status", "status", FilterKind::Equals),
            FilterDefinition::new("priority", "priority", FilterKind::Equals),
            FilterDefinition::new("assignee", "assignees", FilterKind::Equals),
            FilterDefinition::new("due", "due_date", FilterKind::DateRange),
        ])
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 13, 30, 0).unwrap()
    }

    fn context(identity: Option<&str>) -> FilterContext<'_> {
        FilterContext::new(identity, now(), offset_from_minutes(0))
    }

    fn records() -> Vec<Value> {
        vec![
            json!({"id": 1, "status": "todo", "priority": "high", "assignees": ["u1", "u2"], "due_date": "2024-05-15T20:00:00Z"}),
            json!({"id": 2, "status": "done", "priority": "high", "assignees": ["u2"], "due_date": "2024-05-20"}),
            json!({"id": 3, "status": "todo", "priority": "low", "assignees": [], "due_date": "2024-06-10"}),
            json!({"id": 4, "status": "todo", "priority": "high", "due_date": null}),
            json!({"id": 5, "status": "done", "priority": "low", "assignees": "u1", "due_date": "2024-05-14T23:59:59Z"}),
        ]
    }

    fn run(state: &FilterState, identity: Option<&str>) -> Vec<RowIndex> {
        let records = records();
        filters().apply(&records, (0..records.len()).collect(), state, &columns(), &context(identity))
    }

    #[test]
    fn test_setting_all_removes_constraint() {
        let mut state = FilterState::new();
        state.set("status", FilterValue::value("done"));
        assert_eq!(state.len(), 1);
        state.set("status", FilterValue::All);
        assert!(state.is_empty());
        assert!(state.get("status").is_all());
    }

    #[test]
    fn test_blank_values_mean_no_constraint() {
        let mut state = FilterState::new();
        for blank in [
            FilterValue::value(""),
            FilterValue::value("  "),
            FilterValue::Value(FieldValue::Empty),
            FilterValue::Value(FieldValue::List(Vec::new())),
        ] {
            state.set("status", FilterValue::value("done"));
            state.set("status", blank);
            assert!(state.is_empty());
        }
        assert_eq!(run(&state, None), vec![0, 1, 2, 3, 4]);

        let range = FilterDefinition::new("due", "due_date", FilterKind::DateRange);
        assert!(check_value(&range, &FilterValue::value(""), None).is_ok());
    }

    #[test]
    fn test_scalar_equality() {
        let mut state = FilterState::new();
        state.set("status", FilterValue::value("done"));
        assert_eq!(run(&state, None), vec![1, 4]);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let mut state = FilterState::new();
        state.set("status", FilterValue::value("todo"));
        state.set("priority", FilterValue::value("high"));
        assert_eq!(run(&state, None), vec![0, 3]);
    }

    #[test]
    fn test_list_membership() {
        let mut state = FilterState::new();
        state.set("assignee", FilterValue::value("u1"));
        assert_eq!(run(&state, None), vec![0, 4]);
    }

    #[test]
    fn test_current_user_uses_injected_identity() {
        let mut state = FilterState::new();
        state.set("assignee", FilterValue::CurrentUser);
        assert_eq!(run(&state, Some("u2")), vec![0, 1]);
        assert!(run(&state, None).is_empty());
    }

    #[test]
    fn test_date_buckets() {
        let mut state = FilterState::new();

        state.set("due", FilterValue::Bucket(DateBucket::Today));
        assert_eq!(run(&state, None), vec![0]);

        state.set("due", FilterValue::Bucket(DateBucket::Week));
        assert_eq!(run(&state, None), vec![0, 1]);

        state.set("due", FilterValue::Bucket(DateBucket::Month));
        assert_eq!(run(&state, None), vec![0, 1, 2]);
    }

    #[test]
    fn test_bucket_respects_utc_offset() {
        // 23:59:59Z on the 14th is already the 15th at UTC+2
        let records = records();
        let mut state = FilterState::new();
        state.set("due", FilterValue::Bucket(DateBucket::Today));
        let ctx = FilterContext::new(None, now(), offset_from_minutes(120));
        let rows = filters().apply(&records, (0..records.len()).collect(), &state, &columns(), &ctx);
        assert_eq!(rows, vec![0, 4]);
    }

    #[test]
    fn test_month_window_is_calendar_month() {
        let start = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap().naive_utc();
        let (_, end) = DateBucket::Month.window(start);
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap().naive_utc());
    }

    #[test]
    fn test_check_value() {
        let equals = FilterDefinition::new("status", "status", FilterKind::Equals);
        let range = FilterDefinition::new("due", "due_date", FilterKind::DateRange);

        assert!(check_value(&equals, &FilterValue::value("x"), None).is_ok());
        assert!(check_value(&range, &FilterValue::Bucket(DateBucket::Week), None).is_ok());
        assert!(check_value(&range, &FilterValue::All, None).is_ok());
        assert!(matches!(
            check_value(&range, &FilterValue::value("x"), None),
            Err(ViewError::FilterColumnMismatch { .. })
        ));
        assert!(matches!(
            check_value(&equals, &FilterValue::Bucket(DateBucket::Today), None),
            Err(ViewError::FilterColumnMismatch { .. })
        ));
        assert!(matches!(
            check_value(&equals, &FilterValue::CurrentUser, None),
            Err(ViewError::MissingIdentity(_))
        ));
        assert!(check_value(&equals, &FilterValue::CurrentUser, Some("u1")).is_ok());
    }

    #[test]
    fn test_filter_value_json_shape() {
        let value: FilterValue = serde_json::from_str(r#"{"type": "value", "value": "done"}"#).unwrap();
        assert_eq!(value, FilterValue::value("done"));
        let value: FilterValue = serde_json::from_str(r#"{"type": "currentUser"}"#).unwrap();
        assert_eq!(value, FilterValue::CurrentUser);
        let value: FilterValue = serde_json::from_str(r#"{"type": "all"}"#).unwrap();
        assert!(value.is_all());

        let dated = FilterValue::value(now());
        let text = serde_json::to_string(&dated).unwrap();
        assert_eq!(serde_json::from_str::<FilterValue>(&text).unwrap(), dated);
    }
}
