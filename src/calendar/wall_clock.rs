//! Naive local wall-clock timestamps as they travel through JSON.
//!
//! Values are written as `YYYY-MM-DDTHH:MM:SS`, with a fractional second only
//! when one is present. Reading also accepts the `YYYY-MM-DDTHH:MM` form
//! produced by `datetime-local` inputs. Timestamps carrying a UTC offset or a
//! trailing `Z` are rejected, since they name an instant rather than a wall clock.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serializer, de};
use thiserror::Error;

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const SECOND_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("'{0}' has a UTC offset, expected a local wall-clock timestamp")]
    Offset(String),
    #[error("invalid timestamp '{raw}': {source}")]
    Invalid {
        raw: String,
        source: chrono::ParseError,
    },
}

fn has_offset(s: &str) -> bool {
    s.ends_with(['Z', 'z'])
        || s
            .split_once('T')
            .is_some_and(|(_, time)| time.contains(['+', '-']))
}

pub fn parse(s: &str) -> Result<NaiveDateTime, TimestampError> {
    if has_offset(s) {
        return Err(TimestampError::Offset(s.to_string()));
    }
    NaiveDateTime::parse_from_str(s, SECOND_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, FORMAT))
        .or_else(|_| NaiveDateTime::parse_from_str(s, MINUTE_FORMAT))
        .map_err(|source| TimestampError::Invalid {
            raw: s.to_string(),
            source,
        })
}

pub fn format(dt: &NaiveDateTime) -> String {
    dt.format(FORMAT).to_string()
}

pub fn serialize<S>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(dt))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(de::Error::custom)
}

pub mod option {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S>(dt: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match dt {
            Some(dt) => super::serialize(dt, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.is_empty() => super::parse(&raw).map(Some).map_err(de::Error::custom),
            _ => Ok(None),
        }
    }
}
