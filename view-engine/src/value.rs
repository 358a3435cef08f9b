//! FILENAME: view-engine/src/value.rs
//! Field Values - the single normalized value representation.
//!
//! Records hand out `FieldValue`s and every stage of the pipeline works on them.
//! Missing fields, JSON nulls and `None` options all collapse to `FieldValue::Empty`,
//! so search, filter and sort each have exactly one null-handling rule.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Separator used when a multi-valued field is flattened to display text.
pub const LIST_DISPLAY_SEPARATOR: &str = ", ";

// ============================================================================
// FIELD VALUE
// ============================================================================

/// A resolved field value.
///
/// Untagged on the wire. `Date` is tried before `Text`, so strings holding an
/// RFC 3339 timestamp deserialize as dates; other strings stay text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Absent value (missing field, null, `None`).
    Empty,
    Bool(bool),
    Number(f64),
    Date(DateTime<Utc>),
    Text(String),
    /// A set of strings (tags, assignee ids).
    List(Vec<String>),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Empty
    }
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }

    /// True for empty values and for values with nothing to show
    /// (blank text, empty lists).
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Human readable form, used for CSV cells and facet labels.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Empty => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(LIST_DISPLAY_SEPARATOR),
            FieldValue::Date(d) => d.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Lowercased text contributed to a search haystack.
    /// List items are joined with `separator`; empty values contribute nothing.
    pub fn search_text(&self, separator: &str) -> String {
        match self {
            FieldValue::List(items) => items.join(separator).to_lowercase(),
            other => other.display().to_lowercase(),
        }
    }

    /// Milliseconds since the Unix epoch, for values that can be read as a point in time.
    pub fn timestamp_millis(&self) -> Option<i64> {
        match self {
            FieldValue::Date(d) => Some(d.timestamp_millis()),
            FieldValue::Text(s) => parse_datetime(s).map(|d| d.timestamp_millis()),
            FieldValue::Number(n) if n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }

    /// Reads the value as a date, parsing text when needed.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            FieldValue::Text(s) => parse_datetime(s),
            _ => None,
        }
    }

    /// Reads the value as a number. Booleans count as 0/1, dates as epoch millis.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            FieldValue::Date(d) => Some(d.timestamp_millis() as f64),
            _ => None,
        }
    }

    /// Equality used by field filters.
    ///
    /// A list matches when any element equals the wanted value. Values of
    /// different types compare by display text, so a filter loaded from JSON
    /// as `"3"` still matches a numeric field holding 3.
    pub fn matches(&self, wanted: &FieldValue) -> bool {
        match (self, wanted) {
            (FieldValue::Empty, FieldValue::Empty) => true,
            (FieldValue::Empty, _) | (_, FieldValue::Empty) => false,
            (FieldValue::List(items), FieldValue::List(wanted_items)) => {
                wanted_items.iter().all(|w| items.contains(w))
            }
            (FieldValue::List(items), other) => {
                let wanted = other.display();
                items.iter().any(|item| *item == wanted)
            }
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::Number(a), FieldValue::Number(b)) => a == b,
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::Date(a), FieldValue::Date(b)) => a == b,
            (FieldValue::Date(a), other) | (other, FieldValue::Date(a)) => {
                other.as_datetime().map(|d| d == *a).unwrap_or(false)
            }
            (a, b) => a.display() == b.display(),
        }
    }

    /// Converts a JSON value. Nested objects are kept as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Empty,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Empty),
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Array(items) => FieldValue::List(
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => FieldValue::from_json(other).display(),
                    })
                    .collect(),
            ),
            Value::Object(_) => FieldValue::Text(value.to_string()),
        }
    }

    /// Converts to a plain JSON value (null, bool, number, string, array).
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            FieldValue::Empty => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            FieldValue::Date(_) => Value::String(self.display()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Date(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Empty)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Whole numbers print without a fractional part.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

/// Parses RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC)
/// and plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
