//! FILENAME: view-engine/src/action.rs
//! Row actions - edit/delete requests forwarded to the persistence layer.
//!
//! The engine never writes back to a data store. It checks that the target
//! record exists and hands the request to whatever handler the view registered.

use serde::{Deserialize, Serialize};

use crate::record::RecordId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowActionKind {
    Edit,
    Delete,
    /// View-specific action (e.g. "duplicate", "markShipped").
    Custom(String),
}

/// A request to act on one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowAction {
    pub record_id: RecordId,
    pub kind: RowActionKind,
    /// Opaque data for the handler (e.g. the edited fields).
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Receives row actions.
pub trait RowActionHandler {
    fn handle(&mut self, action: RowAction);
}

impl<F> RowActionHandler for F
where
    F: FnMut(RowAction),
{
    fn handle(&mut self, action: RowAction) {
        self(action)
    }
}
