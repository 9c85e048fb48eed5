use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

use super::wall_clock;

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("end ({end}) must be after start ({start})")]
    InvalidInterval {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    #[default]
    None,
    Daily,
    Weekly,
    MonthlyDay,
    MonthlyNthWeekday,
    Yearly,
}

impl Repeat {
    pub fn is_repeating(self) -> bool {
        self != Repeat::None
    }

    /// Human label for the rule anchored at `start`, e.g. "Monthly on the 3rd Tuesday".
    pub fn label(self, start: NaiveDateTime) -> Option<String> {
        let weekday = WEEKDAYS[start.weekday().num_days_from_monday() as usize];
        let day = start.day();
        let label = match self {
            Repeat::None => return None,
            Repeat::Daily => "Daily".to_string(),
            Repeat::Weekly => format!("Weekly on {weekday}"),
            Repeat::MonthlyDay => format!("Monthly on the {}", ordinal(day)),
            Repeat::MonthlyNthWeekday => {
                format!("Monthly on the {} {weekday}", ordinal(nth_of_month(day)))
            }
            Repeat::Yearly => format!(
                "Yearly on {} {}",
                MONTHS[start.month0() as usize],
                ordinal(day)
            ),
        };
        Some(label)
    }
}

/// Which week of the month (1..=5) a day-of-month falls in.
pub(crate) fn nth_of_month(day: u32) -> u32 {
    (day - 1) / 7 + 1
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    #[serde(alias = "School")]
    School,
    #[serde(alias = "Activities")]
    Activities,
    #[serde(alias = "Personal")]
    Personal,
}

/// Identity of one occurrence within a series: the start the recurrence rule
/// computes for it from the series' original `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OccurrenceKey(pub NaiveDateTime);

impl OccurrenceKey {
    pub fn at(self) -> NaiveDateTime {
        self.0
    }
}

impl From<NaiveDateTime> for OccurrenceKey {
    fn from(at: NaiveDateTime) -> Self {
        OccurrenceKey(at)
    }
}

impl fmt::Display for OccurrenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&wall_clock::format(&self.0))
    }
}

impl Serialize for OccurrenceKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        wall_clock::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for OccurrenceKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        wall_clock::parse(&raw)
            .map(OccurrenceKey)
            .map_err(|e| de::Error::custom(format!("invalid occurrence key: {e}")))
    }
}

/// Fields overriding a single occurrence. Unset fields fall through to the series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OccurrencePatch {
    #[serde(
        default,
        with = "wall_clock::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start: Option<NaiveDateTime>,
    #[serde(
        default,
        with = "wall_clock::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl OccurrencePatch {
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && self.title.is_none()
            && self.category.is_none()
    }

    /// Layers `newer` over `self`, keeping any field `newer` leaves unset.
    pub fn merge(&self, newer: &OccurrencePatch) -> OccurrencePatch {
        OccurrencePatch {
            start: newer.start.or(self.start),
            end: newer.end.or(self.end),
            title: newer.title.clone().or_else(|| self.title.clone()),
            category: newer.category.or(self.category),
        }
    }

    fn apply_to(&self, occurrence: &mut Occurrence) {
        if let Some(start) = self.start {
            occurrence.start = start;
        }
        if let Some(end) = self.end {
            occurrence.end = end;
        }
        if let Some(title) = &self.title {
            occurrence.title.clone_from(title);
        }
        if let Some(category) = self.category {
            occurrence.category = category;
        }
    }
}

/// Fields a user submits to create an event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewEvent {
    pub title: String,
    #[serde(default)]
    pub category: Category,
    #[serde(with = "wall_clock")]
    pub start: NaiveDateTime,
    #[serde(with = "wall_clock")]
    pub end: NaiveDateTime,
    #[serde(default)]
    pub repeat: Repeat,
}

/// A user-authored event. For repeating events `start`/`end` describe the first occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Category,
    #[serde(with = "wall_clock")]
    pub start: NaiveDateTime,
    #[serde(with = "wall_clock")]
    pub end: NaiveDateTime,
    #[serde(default)]
    pub repeat: Repeat,
    #[serde(
        default,
        with = "wall_clock::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub until: Option<NaiveDateTime>,
    #[serde(default)]
    pub ex_dates: BTreeSet<OccurrenceKey>,
    #[serde(default)]
    pub overrides: BTreeMap<OccurrenceKey, OccurrencePatch>,
}

impl Event {
    pub fn create(new: NewEvent, id: String) -> Result<Event, EventError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(EventError::EmptyTitle);
        }
        if new.end <= new.start {
            return Err(EventError::InvalidInterval {
                start: new.start,
                end: new.end,
            });
        }
        Ok(Event {
            id,
            title: title.to_string(),
            category: new.category,
            start: new.start,
            end: new.end,
            repeat: new.repeat,
            until: None,
            ex_dates: BTreeSet::new(),
            overrides: BTreeMap::new(),
        })
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat.is_repeating()
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Rewrites the base record itself; used for events that do not repeat.
    pub fn apply_patch(&mut self, patch: &OccurrencePatch) {
        if let Some(start) = patch.start {
            self.start = start;
        }
        if let Some(end) = patch.end {
            self.end = end;
        }
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
    }

    /// Materializes the occurrence at `key`, with its override applied.
    pub(crate) fn occurrence(&self, key: OccurrenceKey, duration: TimeDelta) -> Occurrence {
        let mut occurrence = Occurrence {
            start: key.0,
            end: key
                .0
                .checked_add_signed(duration)
                .unwrap_or(NaiveDateTime::MAX),
            title: self.title.clone(),
            category: self.category,
            series_id: self.id.clone(),
            occurrence_key: key,
            repeat: self.repeat,
        };
        if let Some(patch) = self.overrides.get(&key) {
            patch.apply_to(&mut occurrence);
        }
        occurrence
    }
}

/// One concrete instance of an event inside a requested window. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    #[serde(with = "wall_clock")]
    pub start: NaiveDateTime,
    #[serde(with = "wall_clock")]
    pub end: NaiveDateTime,
    pub title: String,
    pub category: Category,
    pub series_id: String,
    pub occurrence_key: OccurrenceKey,
    pub repeat: Repeat,
}
