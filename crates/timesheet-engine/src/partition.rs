//! Split events that cross midnight into one fragment per calendar day.
//!
//! A day's last slot ends one rounding unit before midnight (23:30 for a
//! 30-minute unit) so a fragment never touches the next day's 00:00.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::ids::IdGenerator;
use crate::model::{Event, TimeRange};

/// Last unit-aligned instant of `day`: 24:00 minus one unit.
pub fn day_end(day: NaiveDate, unit: u32) -> NaiveDateTime {
    day_start(day) + Duration::minutes(24 * 60 - i64::from(unit))
}

pub fn day_start(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

/// Re-file `events_by_day` so no event extends past its filing day.
///
/// An event filed under `day` whose end lies on a later day `last` is cut at
/// [`day_end`] of `day`. Every later day up to and including `last` receives a
/// fragment from 00:00 to that day's end, except `last`, whose fragment ends at
/// the original end. Fragments get fresh ids and no recurrence; the first piece
/// keeps the original identity. Events without an end, or ending on their
/// filing day, pass through unchanged.
pub fn split(
    events_by_day: &BTreeMap<NaiveDate, Vec<Event>>,
    ids: &dyn IdGenerator,
    unit: u32,
) -> BTreeMap<NaiveDate, Vec<Event>> {
    let mut result: BTreeMap<NaiveDate, Vec<Event>> = BTreeMap::new();

    for (day, events) in events_by_day {
        for event in events {
            let end = match event.end() {
                Some(end) if end.date() != *day => end,
                _ => {
                    result.entry(*day).or_default().push(event.clone());
                    continue;
                }
            };

            let first = TimeRange::new(event.start(), day_end(*day, unit));
            result
                .entry(*day)
                .or_default()
                .push(event.rescheduled(first));

            let last = end.date();
            let mut next = day.succ_opt();
            while let Some(current) = next.filter(|d| *d <= last) {
                let piece_end = if current == last {
                    end
                } else {
                    day_end(current, unit)
                };
                let piece = event.fragment(TimeRange::new(day_start(current), piece_end), ids);
                result.entry(current).or_default().push(piece);
                next = current.succ_opt();
            }

            debug!(
                "split {} into {} day(s)",
                event,
                (last - *day).num_days() + 1
            );
        }
    }

    result
}
