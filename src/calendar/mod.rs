//! Recurring-event engine: the base event model, expansion of a series into
//! occurrences for a window, and "only this" / "this and future" edits.

pub mod event;
pub mod expand;
pub mod scope;
pub mod store;
pub mod wall_clock;

pub use event::{
    Category, Event, EventError, NewEvent, Occurrence, OccurrenceKey, OccurrencePatch, Repeat,
};
pub use expand::{Expansion, expand};
pub use scope::{Scope, SeriesChange, apply_delete_scope, apply_edit_scope};
pub use store::{EventStore, week_window};
