//! Expansion of a base event into the occurrences that touch a window.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, TimeDelta};

use super::event::{Event, Occurrence, OccurrenceKey, Repeat, nth_of_month};

/// The natural start of the n-th period of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Hit(NaiveDateTime),
    /// The period has no matching date; carries the earliest moment of that period.
    Miss(NaiveDateTime),
    Exhausted,
}

fn slot(event: &Event, index: u32) -> Slot {
    let start = event.start;
    let hit = |at: Option<NaiveDateTime>| at.map_or(Slot::Exhausted, Slot::Hit);
    match event.repeat {
        Repeat::None if index == 0 => Slot::Hit(start),
        Repeat::None => Slot::Exhausted,
        Repeat::Daily => hit(start.checked_add_days(Days::new(u64::from(index)))),
        Repeat::Weekly => hit(start.checked_add_days(Days::new(u64::from(index) * 7))),
        // checked_add_months clamps to the month's last day, so Feb 29 lands on Feb 28.
        Repeat::Yearly => hit(
            index
                .checked_mul(12)
                .and_then(|months| start.checked_add_months(Months::new(months))),
        ),
        Repeat::MonthlyDay => {
            let Some(first) = month_start(start, index) else {
                return Slot::Exhausted;
            };
            match first.date().with_day(start.day()) {
                Some(day) => Slot::Hit(day.and_time(start.time())),
                None => Slot::Miss(first),
            }
        }
        Repeat::MonthlyNthWeekday => {
            let Some(first) = month_start(start, index) else {
                return Slot::Exhausted;
            };
            let nth = nth_of_month(start.day()) as u8;
            match NaiveDate::from_weekday_of_month_opt(
                first.year(),
                first.month(),
                start.weekday(),
                nth,
            ) {
                Some(day) => Slot::Hit(day.and_time(start.time())),
                None => Slot::Miss(first),
            }
        }
    }
}

/// Day 1 of the month `months` after `start`'s month, at `start`'s time of day.
fn month_start(start: NaiveDateTime, months: u32) -> Option<NaiveDateTime> {
    start
        .date()
        .with_day(1)?
        .checked_add_months(Months::new(months))
        .map(|day| day.and_time(start.time()))
}

fn month_span(from: NaiveDate, to: NaiveDate) -> i64 {
    i64::from(to.year() - from.year()) * 12 + i64::from(to.month0()) - i64::from(from.month0())
}

/// Lowest period index whose natural start can be at or after `floor`.
/// Every earlier index starts strictly before `floor`.
fn first_index(event: &Event, floor: NaiveDateTime) -> u32 {
    if floor <= event.start {
        return 0;
    }
    let index = match event.repeat {
        Repeat::None => 0,
        Repeat::Daily => (floor - event.start).num_days(),
        Repeat::Weekly => (floor - event.start).num_days() / 7,
        Repeat::MonthlyDay | Repeat::MonthlyNthWeekday => {
            month_span(event.start.date(), floor.date())
        }
        Repeat::Yearly => month_span(event.start.date(), floor.date()) / 12,
    };
    u32::try_from(index.max(0)).unwrap_or(u32::MAX)
}

impl Event {
    /// Whether `key` names an occurrence this series still produces.
    pub fn has_occurrence(&self, key: OccurrenceKey) -> bool {
        let at = key.at();
        if at < self.start
            || self.until.is_some_and(|until| at >= until)
            || self.ex_dates.contains(&key)
        {
            return false;
        }
        let mut index = first_index(self, at);
        loop {
            match slot(self, index) {
                Slot::Hit(start) if start == at => return true,
                Slot::Hit(start) | Slot::Miss(start) if start > at => return false,
                Slot::Exhausted => return false,
                _ => {}
            }
            let Some(next) = index.checked_add(1) else {
                return false;
            };
            index = next;
        }
    }
}

/// Occurrences of `event` whose interval intersects `[range_start, range_end)`,
/// in ascending key order.
pub fn expand(
    event: &Event,
    range_start: NaiveDateTime,
    range_end: NaiveDateTime,
) -> Expansion<'_> {
    let duration = event.duration();
    let valid = duration > TimeDelta::zero() && range_start < range_end;
    let index = range_start
        .checked_sub_signed(duration)
        .map_or(0, |floor| first_index(event, floor));
    Expansion {
        event,
        range_start,
        range_end,
        duration,
        index,
        done: !valid,
    }
}

/// Lazy iterator returned by [`expand`]. Call [`expand`] again to restart.
#[derive(Debug, Clone)]
pub struct Expansion<'a> {
    event: &'a Event,
    range_start: NaiveDateTime,
    range_end: NaiveDateTime,
    duration: TimeDelta,
    index: u32,
    done: bool,
}

impl Expansion<'_> {
    fn beyond(&self, at: NaiveDateTime) -> bool {
        at >= self.range_end || self.event.until.is_some_and(|until| at >= until)
    }
}

impl Iterator for Expansion<'_> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        while !self.done {
            let current = slot(self.event, self.index);
            match self.index.checked_add(1) {
                Some(next) => self.index = next,
                None => self.done = true,
            }

            let at = match current {
                Slot::Hit(at) => at,
                Slot::Miss(floor) => {
                    if self.beyond(floor) {
                        self.done = true;
                    }
                    continue;
                }
                Slot::Exhausted => {
                    self.done = true;
                    continue;
                }
            };
            if self.beyond(at) {
                self.done = true;
                continue;
            }

            let key = OccurrenceKey(at);
            if self.event.ex_dates.contains(&key) {
                continue;
            }
            let occurrence = self.event.occurrence(key, self.duration);
            if occurrence.end > self.range_start && occurrence.start < self.range_end {
                return Some(occurrence);
            }
        }
        None
    }
}
