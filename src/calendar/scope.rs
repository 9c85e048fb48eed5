//! Scoped edits and deletes of a single occurrence of a series.

use serde::{Deserialize, Serialize};

use super::event::{Event, OccurrenceKey, OccurrencePatch};

/// How far a change to one occurrence reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Only the chosen occurrence.
    Single,
    /// The chosen occurrence and every later one.
    Future,
    Cancel,
}

/// What happened to a series, so its owner can update its collection.
///
/// Edits return `Unchanged`, `Updated` or `Split`; only deletes return `Removed`.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesChange {
    Unchanged,
    Updated,
    /// The series was truncated and `sibling` continues it from the chosen occurrence.
    Split { sibling: Event },
    /// The record should be dropped from its collection.
    Removed,
}

/// Applies `patch` to the occurrence `key`. A patch that would leave the edited
/// occurrence ending at or before its start is ignored.
pub fn apply_edit_scope(
    event: &mut Event,
    key: OccurrenceKey,
    scope: Scope,
    patch: &OccurrencePatch,
    sibling_id: impl FnOnce() -> String,
) -> SeriesChange {
    if scope == Scope::Cancel || patch.is_empty() {
        return SeriesChange::Unchanged;
    }
    if !event.is_repeating() {
        let start = patch.start.unwrap_or(event.start);
        let end = patch.end.unwrap_or(event.end);
        if end <= start {
            return SeriesChange::Unchanged;
        }
        event.apply_patch(patch);
        return SeriesChange::Updated;
    }
    if !event.has_occurrence(key) {
        return SeriesChange::Unchanged;
    }

    match scope {
        Scope::Single => {
            let merged = event
                .overrides
                .get(&key)
                .map_or_else(|| patch.clone(), |existing| existing.merge(patch));
            let start = merged.start.unwrap_or(key.at());
            let end = merged.end.unwrap_or_else(|| key.at() + event.duration());
            if end <= start {
                return SeriesChange::Unchanged;
            }
            event.overrides.insert(key, merged);
            SeriesChange::Updated
        }
        Scope::Future => {
            let start = patch.start.unwrap_or(key.at());
            let end = patch.end.unwrap_or_else(|| start + event.duration());
            if end <= start {
                return SeriesChange::Unchanged;
            }
            let sibling = Event {
                id: sibling_id(),
                title: patch.title.clone().unwrap_or_else(|| event.title.clone()),
                category: patch.category.unwrap_or(event.category),
                start,
                end,
                repeat: event.repeat,
                until: event.until,
                ex_dates: Default::default(),
                overrides: Default::default(),
            };
            event.until = Some(key.at());
            SeriesChange::Split { sibling }
        }
        Scope::Cancel => SeriesChange::Unchanged,
    }
}

pub fn apply_delete_scope(event: &mut Event, key: OccurrenceKey, scope: Scope) -> SeriesChange {
    if scope == Scope::Cancel {
        return SeriesChange::Unchanged;
    }
    if !event.is_repeating() {
        return SeriesChange::Removed;
    }
    if !event.has_occurrence(key) {
        return SeriesChange::Unchanged;
    }

    match scope {
        Scope::Single => {
            event.ex_dates.insert(key);
            event.overrides.remove(&key);
        }
        Scope::Future => event.until = Some(key.at()),
        Scope::Cancel => return SeriesChange::Unchanged,
    }
    SeriesChange::Updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::event::{Category, Repeat};
    use crate::calendar::expand::expand;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::collections::{BTreeMap, BTreeSet};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn weekly() -> Event {
        Event {
            id: "base".to_string(),
            title: "Tutoring".to_string(),
            category: Category::School,
            start: at(2025, 1, 6, 9, 0),
            end: at(2025, 1, 6, 10, 0),
            repeat: Repeat::Weekly,
            until: None,
            ex_dates: BTreeSet::new(),
            overrides: BTreeMap::new(),
        }
    }

    fn titled(title: &str) -> OccurrencePatch {
        OccurrencePatch {
            title: Some(title.to_string()),
            ..OccurrencePatch::default()
        }
    }

    fn key(y: i32, m: u32, d: u32) -> OccurrenceKey {
        OccurrenceKey(at(y, m, d, 9, 0))
    }

    #[test]
    fn cancel_never_mutates() {
        let mut event = weekly();
        let before = event.clone();
        let k = key(2025, 1, 13);
        let change = apply_edit_scope(&mut event, k, Scope::Cancel, &titled("x"), || {
            unreachable!()
        });
        assert_eq!(change, SeriesChange::Unchanged);
        assert_eq!(
            apply_delete_scope(&mut event, k, Scope::Cancel),
            SeriesChange::Unchanged
        );
        assert_eq!(event, before);
    }

    #[test]
    fn single_edit_stores_merged_override() {
        let mut event = weekly();
        let k = key(2025, 1, 13);
        apply_edit_scope(&mut event, k, Scope::Single, &titled("Exam review"), || unreachable!());
        let moved = OccurrencePatch {
            start: Some(at(2025, 1, 13, 14, 0)),
            end: Some(at(2025, 1, 13, 15, 0)),
            ..OccurrencePatch::default()
        };
        let change = apply_edit_scope(&mut event, k, Scope::Single, &moved, || unreachable!());
        assert_eq!(change, SeriesChange::Updated);

        let patch = &event.overrides[&k];
        assert_eq!(patch.title.as_deref(), Some("Exam review"));
        assert_eq!(patch.start, Some(at(2025, 1, 13, 14, 0)));
        assert!(event.ex_dates.is_empty());
        assert!(event.until.is_none());
    }

    #[test]
    fn future_edit_truncates_and_spawns_sibling() {
        let mut event = weekly();
        let k = key(2025, 3, 3);
        let change = apply_edit_scope(&mut event, k, Scope::Future, &titled("New"), || {
            "sib".to_string()
        });
        let SeriesChange::Split { sibling } = change else {
            panic!("expected a split, got {change:?}");
        };
        assert_eq!(event.until, Some(k.at()));
        assert_eq!(sibling.id, "sib");
        assert_eq!(sibling.title, "New");
        assert_eq!(sibling.start, k.at());
        assert_eq!(sibling.end, at(2025, 3, 3, 10, 0));
        assert_eq!(sibling.repeat, Repeat::Weekly);
        assert!(sibling.until.is_none());
    }

    #[test]
    fn future_edit_with_moved_start_keeps_duration() {
        let mut event = weekly();
        let patch = OccurrencePatch {
            start: Some(at(2025, 3, 4, 16, 0)),
            ..OccurrencePatch::default()
        };
        let change = apply_edit_scope(&mut event, key(2025, 3, 3), Scope::Future, &patch, || {
            "sib".to_string()
        });
        let SeriesChange::Split { sibling } = change else {
            panic!("expected a split");
        };
        assert_eq!(sibling.start, at(2025, 3, 4, 16, 0));
        assert_eq!(sibling.end, at(2025, 3, 4, 17, 0));
        assert_eq!(sibling.title, "Tutoring");
    }

    #[test]
    fn future_edit_on_truncated_series_carries_until_forward() {
        let mut event = weekly();
        event.until = Some(at(2025, 4, 7, 9, 0));
        let SeriesChange::Split { sibling } =
            apply_edit_scope(&mut event, key(2025, 3, 3), Scope::Future, &titled("New"), || {
                "sib".to_string()
            })
        else {
            panic!("expected a split");
        };
        assert_eq!(event.until, Some(at(2025, 3, 3, 9, 0)));
        assert_eq!(sibling.until, Some(at(2025, 4, 7, 9, 0)));
    }

    #[test]
    fn stale_key_is_a_no_op() {
        let mut event = weekly();
        let before = event.clone();
        let off_rule = OccurrenceKey(at(2025, 1, 14, 9, 0));
        assert_eq!(
            apply_edit_scope(&mut event, off_rule, Scope::Future, &titled("x"), || unreachable!()),
            SeriesChange::Unchanged
        );
        assert_eq!(
            apply_delete_scope(&mut event, off_rule, Scope::Single),
            SeriesChange::Unchanged
        );
        assert_eq!(event, before);
    }

    #[test]
    fn single_delete_suppresses_and_drops_override() {
        let mut event = weekly();
        let k = key(2025, 1, 20);
        event.overrides.insert(k, titled("Moved"));
        assert_eq!(apply_delete_scope(&mut event, k, Scope::Single), SeriesChange::Updated);
        assert!(event.ex_dates.contains(&k));
        assert!(!event.overrides.contains_key(&k));

        // Deleting again is idempotent.
        assert_eq!(apply_delete_scope(&mut event, k, Scope::Single), SeriesChange::Unchanged);
        assert_eq!(event.ex_dates.len(), 1);
    }

    #[test]
    fn future_delete_sets_until() {
        let mut event = weekly();
        apply_delete_scope(&mut event, key(2025, 2, 3), Scope::Future);
        assert_eq!(event.until, Some(at(2025, 2, 3, 9, 0)));
        let last = expand(&event, at(2025, 1, 1, 0, 0), at(2025, 12, 31, 0, 0)).last().unwrap();
        assert_eq!(last.start, at(2025, 1, 27, 9, 0));
    }

    #[test]
    fn non_repeating_edit_rewrites_base_and_delete_removes() {
        let mut event = weekly();
        event.repeat = Repeat::None;
        let patch = OccurrencePatch {
            start: Some(at(2025, 1, 7, 9, 0)),
            end: Some(at(2025, 1, 7, 11, 0)),
            title: Some("Study hall".to_string()),
            category: Some(Category::Personal),
        };
        let change = apply_edit_scope(&mut event, key(2025, 1, 6), Scope::Single, &patch, || {
            unreachable!()
        });
        assert_eq!(change, SeriesChange::Updated);
        assert_eq!(event.start, at(2025, 1, 7, 9, 0));
        assert_eq!(event.end, at(2025, 1, 7, 11, 0));
        assert_eq!(event.title, "Study hall");
        assert_eq!(event.category, Category::Personal);
        assert!(event.overrides.is_empty());

        assert_eq!(
            apply_delete_scope(&mut event, key(2025, 1, 7), Scope::Future),
            SeriesChange::Removed
        );
    }

    #[test]
    fn inverted_interval_is_ignored() {
        let ends_first = OccurrencePatch {
            start: Some(at(2025, 3, 3, 11, 0)),
            end: Some(at(2025, 3, 3, 10, 0)),
            ..OccurrencePatch::default()
        };

        let mut series = weekly();
        let before = series.clone();
        for scope in [Scope::Single, Scope::Future] {
            let change = apply_edit_scope(&mut series, key(2025, 3, 3), scope, &ends_first, || {
                "sib".to_string()
            });
            assert_eq!(change, SeriesChange::Unchanged, "{scope:?}");
        }
        // Moving only the start past the natural end is just as empty.
        let late_start = OccurrencePatch {
            start: Some(at(2025, 3, 3, 10, 30)),
            ..OccurrencePatch::default()
        };
        let change = apply_edit_scope(&mut series, key(2025, 3, 3), Scope::Single, &late_start, || {
            unreachable!()
        });
        assert_eq!(change, SeriesChange::Unchanged);
        assert_eq!(series, before);

        let mut single = weekly();
        single.repeat = Repeat::None;
        let before = single.clone();
        let end_only = OccurrencePatch {
            end: Some(at(2025, 1, 6, 8, 0)),
            ..OccurrencePatch::default()
        };
        let change = apply_edit_scope(&mut single, key(2025, 1, 6), Scope::Single, &end_only, || {
            unreachable!()
        });
        assert_eq!(change, SeriesChange::Unchanged);
        assert_eq!(single, before);
    }
}
