//! Task list core: the ordered task collection, its persisted mirror, the
//! filter pipeline, and the list view, driven by a single event thread.
//!
//! Hosts own the clock and the key-value store. They feed [`app::Event`]s
//! into [`app::App::handle`] and call [`app::App::advance`] whenever
//! [`app::App::next_deadline`] passes.

pub mod app;
pub mod datetime;
pub mod filter;
pub mod ids;
pub mod reorder;
pub mod schedule;
pub mod storage;
pub mod store;
pub mod tags;
pub mod task;
pub mod view;

pub use app::{App, Event, Moment, Outcome, Timing};
pub use storage::{DEFAULT_TASKS_KEY, KeyValueStore, MemoryStore};
pub use store::TaskStore;
pub use task::{Priority, Task, TaskDraft, TaskId, ValidationError};
