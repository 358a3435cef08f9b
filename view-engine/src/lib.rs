//! FILENAME: view-engine/src/lib.rs
//! Tabular view engine.
//!
//! Turns an in-memory collection of records into a searchable, filterable,
//! sortable, paginated and selectable list view. The engine owns no storage
//! and performs no IO; edits and deletes are forwarded to a host handler.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the view IS)
//! - `accessor`, `search`, `filter`, `sort`, `paginate`: the pipeline stages
//! - `selection`: selected record ids, independent of the pipeline
//! - `view`: Renderable summaries (WHAT we display)
//! - `engine`: Orchestration and stage caching (HOW we recompute)

pub mod accessor;
pub mod action;
pub mod clock;
pub mod definition;
pub mod engine;
pub mod error;
pub mod filter;
pub mod logging;
pub mod paginate;
pub mod record;
pub mod search;
pub mod selection;
pub mod sort;
pub mod value;
pub mod view;

pub use action::{RowAction, RowActionHandler, RowActionKind};
pub use clock::{Clock, FixedClock, SystemClock};
pub use definition::*;
pub use engine::{TabularViewEngine, ViewEngineBuilder};
pub use error::ViewError;
pub use filter::{DateBucket, FilterState, FilterValue};
pub use paginate::{Page, PageState, DEFAULT_PAGE_SIZE};
pub use record::{Record, RecordId, RowIndex};
pub use selection::SelectionModel;
pub use sort::{SortDirection, SortState};
pub use value::FieldValue;
pub use view::*;

#[doc(hidden)]
pub use log as __log;
