//! Core engine for reconstructing timesheets from session hook logs.
//!
//! The pipeline runs one way, each stage returning a new value:
//! - Store: reading daily JSONL logs into [`Event`]s
//! - Slicing: turning each session's events into attributed [`Slice`]s
//! - Filtering: project/ticket substring selection
//! - Aggregation: per-key session/prompt/active-time summaries and rollups

mod aggregate;
pub mod event;
pub mod event_type;
mod filter;
mod rollup;
mod slice;
pub mod store;
pub mod types;

pub use aggregate::{
    GroupBy, GroupStats, UNKNOWN_MODEL, UNKNOWN_PROJECT, UNTRACKED_TICKET, aggregate, totals,
};
pub use event::Event;
pub use event_type::EventKind;
pub use filter::{SliceFilter, filter_slices};
pub use rollup::{RollupNode, project_summary, rollup, timesheet};
pub use slice::{DayBoundary, Slice, SliceConfig, build_slices};
pub use store::{EventLog, StoreError, read_event_logs};
pub use types::{SessionId, ValidationError};
