use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// A dated calendar entry as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CalendarEntry {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub category: String,
    #[serde(skip_serializing)]
    pub created_at: NaiveDateTime,
}
