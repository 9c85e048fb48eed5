use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::event::{Event, EventError, NewEvent, Occurrence, OccurrenceKey, OccurrencePatch};
use super::expand::expand;
use super::scope::{Scope, SeriesChange, apply_delete_scope, apply_edit_scope};

/// `[Sunday 00:00, next Sunday 00:00)` around `day`, the span of one week view.
pub fn week_window(day: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let sunday = day - Days::new(u64::from(day.weekday().num_days_from_sunday()));
    let start = sunday.and_time(NaiveTime::MIN);
    (start, start + Days::new(7))
}

fn new_id() -> String {
    nanoid!(10)
}

/// The collection of base events a calendar view renders from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.events.iter().position(|e| e.id == id)
    }

    /// Validates `new`, assigns it an id and stores it.
    pub fn add(&mut self, new: NewEvent) -> Result<&Event, EventError> {
        let event = Event::create(new, new_id())?;
        debug!(id = %event.id, repeat = ?event.repeat, "event added");
        let index = self.events.len();
        self.events.push(event);
        Ok(&self.events[index])
    }

    /// Stores an already-built event, e.g. one loaded from disk.
    pub fn insert(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Swaps in `event` for the stored record with the same id.
    pub fn replace(&mut self, event: Event) -> bool {
        match self.position(&event.id) {
            Some(index) => {
                self.events[index] = event;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Event> {
        let index = self.position(id)?;
        debug!(id, "event removed");
        Some(self.events.remove(index))
    }

    /// Edits the occurrence `key` of series `id`. A split inserts the sibling before returning.
    pub fn edit_occurrence(
        &mut self,
        id: &str,
        key: OccurrenceKey,
        scope: Scope,
        patch: &OccurrencePatch,
    ) -> SeriesChange {
        let Some(index) = self.position(id) else {
            debug!(id, %key, "edit ignored, unknown series");
            return SeriesChange::Unchanged;
        };
        let change = apply_edit_scope(&mut self.events[index], key, scope, patch, new_id);
        match &change {
            SeriesChange::Split { sibling } => {
                debug!(id, %key, sibling = %sibling.id, "series split");
                self.events.push(sibling.clone());
            }
            SeriesChange::Updated => debug!(id, %key, ?scope, "series edited"),
            SeriesChange::Removed | SeriesChange::Unchanged => {}
        }
        change
    }

    /// Deletes the occurrence `key` of series `id`, or the whole record if it does not repeat.
    pub fn delete_occurrence(
        &mut self,
        id: &str,
        key: OccurrenceKey,
        scope: Scope,
    ) -> SeriesChange {
        let Some(index) = self.position(id) else {
            debug!(id, %key, "delete ignored, unknown series");
            return SeriesChange::Unchanged;
        };
        let change = apply_delete_scope(&mut self.events[index], key, scope);
        match &change {
            SeriesChange::Removed => {
                self.events.remove(index);
                debug!(id, "event removed");
            }
            SeriesChange::Updated => debug!(id, %key, ?scope, "occurrence deleted"),
            SeriesChange::Split { .. } | SeriesChange::Unchanged => {}
        }
        change
    }

    /// Every occurrence of every series inside the window, ordered for rendering.
    pub fn occurrences(
        &self,
        range_start: NaiveDateTime,
        range_end: NaiveDateTime,
    ) -> Vec<Occurrence> {
        let mut all: Vec<Occurrence> = self
            .events
            .iter()
            .flat_map(|event| expand(event, range_start, range_end))
            .collect();
        all.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| a.series_id.cmp(&b.series_id))
        });
        all
    }

    pub fn week_occurrences(&self, day: NaiveDate) -> Vec<Occurrence> {
        let (start, end) = week_window(day);
        self.occurrences(start, end)
    }
}
