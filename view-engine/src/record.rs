//! FILENAME: view-engine/src/record.rs
//! Records - the caller-defined rows a view displays.
//!
//! The engine never interprets a record beyond asking for its id and for
//! named field values. Typed domain structs implement `Record` by hand;
//! already-deserialized JSON objects work out of the box.

use crate::value::FieldValue;

/// Stable identifier of a record. Selection is tracked by id, never by position.
pub type RecordId = String;

/// Position of a record within the engine's source collection.
pub type RowIndex = usize;

/// A row in a tabular view.
pub trait Record {
    /// Unique id of this record within its collection.
    fn id(&self) -> RecordId;

    /// Value of the named field. Missing fields return `FieldValue::Empty`.
    fn field(&self, key: &str) -> FieldValue;
}

impl<T: Record + ?Sized> Record for Box<T> {
    fn id(&self) -> RecordId {
        (**self).id()
    }

    fn field(&self, key: &str) -> FieldValue {
        (**self).field(key)
    }
}

impl<T: Record + ?Sized> Record for std::sync::Arc<T> {
    fn id(&self) -> RecordId {
        (**self).id()
    }

    fn field(&self, key: &str) -> FieldValue {
        (**self).field(key)
    }
}

/// JSON objects are records keyed by their `"id"` member.
///
/// Field keys containing dots walk nested objects, so `"assignee.name"`
/// reads `{"assignee": {"name": ...}}`. A missing link anywhere yields `Empty`.
impl Record for serde_json::Value {
    fn id(&self) -> RecordId {
        match self.get("id") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => FieldValue::from_json(other).display(),
        }
    }

    fn field(&self, key: &str) -> FieldValue {
        if let Some(value) = self.get(key) {
            return FieldValue::from_json(value);
        }
        if !key.contains('.') {
            return FieldValue::Empty;
        }
        let mut current = self;
        for part in key.split('.') {
            match current.get(part) {
                Some(next) => current = next,
                None => return FieldValue::Empty,
            }
        }
        FieldValue::from_json(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_record_id() {
        assert_eq!(json!({"id": 7}).id(), "7");
        assert_eq!(json!({"id": "t-1"}).id(), "t-1");
        assert_eq!(json!({"title": "x"}).id(), "");
    }

    #[test]
    fn test_json_record_fields() {
        let record = json!({
            "title": "Urgent fix",
            "description": null,
            "assignee": {"name": "Dana"}
        });
        assert_eq!(record.field("title"), FieldValue::text("Urgent fix"));
        assert_eq!(record.field("description"), FieldValue::Empty);
        assert_eq!(record.field("missing"), FieldValue::Empty);
        assert_eq!(record.field("assignee.name"), FieldValue::text("Dana"));
        assert_eq!(record.field("assignee.email"), FieldValue::Empty);
    }

    #[test]
    fn test_non_object_record_has_no_fields() {
        let record = json!("just a string");
        assert_eq!(record.field("title"), FieldValue::Empty);
        assert_eq!(record.id(), "");
    }
}
