//! FILENAME: view-engine/tests/common/mod.rs
//! Fixtures for tabular view engine integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, TimeZone, Utc};
use view_engine::{
    Clock, ColumnDefinition, ColumnKind, FieldValue, FilterDefinition, FilterKind, FixedClock,
    Record, RecordId, TabularViewEngine, ViewDefinition,
};

// ============================================================================
// TASK RECORDS
// ============================================================================

/// A task row as a list view would receive it from the fetch layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub assignees: Vec<String>,
    pub tags: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub amount: f64,
}

impl Record for Task {
    fn id(&self) -> RecordId {
        self.id.to_string()
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "title" => self.title.as_str().into(),
            "description" => self.description.clone().into(),
            "status" => self.status.as_str().into(),
            "priority" => self.priority.as_str().into(),
            "assignees" => self.assignees.clone().into(),
            "tags" => self.tags.clone().into(),
            "due_date" => self.due_date.into(),
            "amount" => self.amount.into(),
            _ => FieldValue::Empty,
        }
    }
}

pub struct TaskFixture;

impl TaskFixture {
    /// Twelve tasks. Due dates cluster around `now()` so every date bucket
    /// has members and two tasks are overdue (2 and 8).
    pub fn tasks() -> Vec<Task> {
        vec![
            task(1, "Urgent fix for login", None, "todo", "high", &["u1"], &["bug", "urgent"], Some(at(2024, 5, 15, 17)), 120.0),
            task(2, "Write release notes", Some("Draft for v2"), "done", "low", &["u2"], &["docs"], Some(at(2024, 5, 10, 0)), 40.0),
            task(3, "Review PR", None, "in_progress", "medium", &["u1", "u2"], &[], None, 0.0),
            task(4, "Ship order 1042", Some("Urgent shipment"), "todo", "high", &["u3"], &["shipping"], Some(at(2024, 5, 18, 0)), 560.0),
            task(5, "Paint cabinets", None, "todo", "low", &[], &["shop"], Some(at(2024, 6, 1, 0)), 300.0),
            task(6, "Quarterly taxes", Some("File before deadline"), "todo", "high", &["u2"], &["finance"], Some(at(2024, 6, 20, 0)), 0.0),
            task(7, "Order lumber", None, "done", "medium", &["u3"], &["shop", "purchasing"], Some(at(2024, 5, 16, 0)), 860.0),
            task(8, "Call supplier", Some("Ask about urgent delivery"), "in_progress", "low", &["u1"], &["purchasing"], Some(at(2024, 5, 15, 8)), 0.0),
            task(9, "Update website", None, "todo", "medium", &["u2"], &[], None, 75.0),
            task(10, "Inventory count", None, "done", "medium", &["u1", "u3"], &["shop"], Some(at(2024, 5, 22, 0)), 0.0),
            task(11, "Fix drawer slides", Some("urgent"), "todo", "high", &["u3"], &["shop", "bug"], Some(at(2024, 5, 21, 0)), 45.0),
            task(12, "Customer follow-up", None, "todo", "low", &["u1"], &["crm"], Some(at(2024, 7, 1, 0)), 0.0),
        ]
    }
}

#[allow(clippy::too_many_arguments)]
fn task(
    id: u32,
    title: &str,
    description: Option<&str>,
    status: &str,
    priority: &str,
    assignees: &[&str],
    tags: &[&str],
    due_date: Option<DateTime<Utc>>,
    amount: f64,
) -> Task {
    Task {
        id,
        title: title.to_string(),
        description: description.map(str::to_string),
        status: status.to_string(),
        priority: priority.to_string(),
        assignees: assignees.iter().map(|s| s.to_string()).collect(),
        tags: tags.iter().map(|s| s.to_string()).collect(),
        due_date,
        amount,
    }
}

// ============================================================================
// TIME
// ============================================================================

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

/// The instant every fixture engine runs at.
pub fn now() -> DateTime<Utc> {
    at(2024, 5, 15, 12)
}

/// A clock the test can move forward after the engine is built.
#[derive(Clone)]
pub struct ManualClock(pub Rc<Cell<DateTime<Utc>>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock(Rc::new(Cell::new(start)))
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.0.set(instant);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.get()
    }
}

// ============================================================================
// VIEW SETUP
// ============================================================================

pub fn task_definition() -> ViewDefinition {
    ViewDefinition::new(vec![
        ColumnDefinition::new("title", "Title", ColumnKind::Text).searchable(),
        ColumnDefinition::new("description", "Description", ColumnKind::Text).searchable(),
        ColumnDefinition::new("status", "Status", ColumnKind::Text).filterable(),
        ColumnDefinition::new("priority", "Priority", ColumnKind::Text).filterable(),
        ColumnDefinition::new("assignees", "Assignees", ColumnKind::List)
            .filterable()
            .unsortable(),
        ColumnDefinition::new("tags", "Tags", ColumnKind::List).searchable().filterable(),
        ColumnDefinition::new("due_date", "Due", ColumnKind::Temporal).filterable(),
        ColumnDefinition::new("amount", "Amount", ColumnKind::Number),
        ColumnDefinition::new("overdue", "Overdue", ColumnKind::Boolean).derived(),
    ])
    .with_filter(FilterDefinition::new("status", "status", FilterKind::Equals))
    .with_filter(FilterDefinition::new("priority", "priority", FilterKind::Equals))
    .with_filter(FilterDefinition::new("assignee", "assignees", FilterKind::Equals))
    .with_filter(FilterDefinition::new("tag", "tags", FilterKind::Equals))
    .with_filter(FilterDefinition::new("due", "due_date", FilterKind::DateRange))
    .with_page_size(5)
    .with_identity("u1")
}

pub fn is_overdue(task: &Task) -> FieldValue {
    FieldValue::Bool(task.due_date.map_or(false, |due| due < now()))
}

/// Engine over the fixture tasks with the overdue column attached.
pub fn task_engine() -> TabularViewEngine<Task> {
    engine_with(task_definition(), TaskFixture::tasks())
}

pub fn engine_with(definition: ViewDefinition, tasks: Vec<Task>) -> TabularViewEngine<Task> {
    TabularViewEngine::builder(definition)
        .records(tasks)
        .clock(FixedClock(now()))
        .derive("overdue", is_overdue)
        .build()
        .unwrap()
}

// ============================================================================
// ASSERTION HELPERS
// ============================================================================

pub fn ids<R: Record>(records: Vec<&R>) -> Vec<String> {
    records.into_iter().map(|r| r.id()).collect()
}

pub fn id_list(ids: &[u32]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}
