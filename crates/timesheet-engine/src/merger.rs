//! Merge working-hours events with ordinary calendar events, day by day.
//!
//! The earliest working-hours event of a day marks the start of work and the
//! latest marks its end. Calendar events entirely outside that span are
//! dropped. A calendar event overlapping a marker absorbs it: the event is
//! stretched to the marker's outer edge and the marker is not emitted.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::model::{Event, TimeRange};
use crate::overlap;

/// Merge per-day working-hours events with per-day calendar events.
///
/// Only days present in `schedule_events_by_day` appear in the result; a day
/// with fewer than two working-hours events is skipped with a warning.
pub fn merge(
    schedule_events_by_day: &BTreeMap<NaiveDate, Vec<Event>>,
    events_by_day: &BTreeMap<NaiveDate, Vec<Event>>,
) -> BTreeMap<NaiveDate, Vec<Event>> {
    merge_with_dropped(schedule_events_by_day, events_by_day).0
}

/// Like [`merge`], also returning the calendar events dropped for lying
/// outside working hours.
pub fn merge_with_dropped(
    schedule_events_by_day: &BTreeMap<NaiveDate, Vec<Event>>,
    events_by_day: &BTreeMap<NaiveDate, Vec<Event>>,
) -> (BTreeMap<NaiveDate, Vec<Event>>, Vec<Event>) {
    let mut merged = BTreeMap::new();
    let mut dropped = Vec::new();

    for (day, schedule_events) in schedule_events_by_day {
        if schedule_events.len() < 2 {
            warn!(
                "skipping {}: {} working-hours event(s), need a start and an end",
                day,
                schedule_events.len()
            );
            continue;
        }

        let day_events = events_by_day.get(day).map(Vec::as_slice).unwrap_or(&[]);
        let (events, outside) = merge_day(schedule_events, day_events);
        debug!(
            "{}: {} merged event(s), {} outside working hours",
            day,
            events.len(),
            outside.len()
        );
        dropped.extend(outside);
        merged.insert(*day, events);
    }

    (merged, dropped)
}

fn merge_day(schedule_events: &[Event], day_events: &[Event]) -> (Vec<Event>, Vec<Event>) {
    let mut sorted = schedule_events.to_vec();
    sorted.sort_by_key(Event::start);

    // `merge_with_dropped` guarantees at least two entries.
    let start_item = sorted.remove(0);
    let end_item = sorted.pop().unwrap_or_else(|| start_item.clone());
    let middles = sorted;

    if day_events.is_empty() {
        let mut result = Vec::with_capacity(middles.len() + 2);
        result.push(start_item);
        result.extend(middles);
        result.push(end_item);
        return (result, Vec::new());
    }

    let work_start = start_item.start();
    let work_end = end_item.end();

    let mut result = Vec::with_capacity(day_events.len() + middles.len() + 2);
    let mut outside = Vec::new();
    let mut start_absorbed = false;
    let mut end_absorbed = false;

    for event in day_events {
        let (Some(event_end), Some(work_end)) = (event.end(), work_end) else {
            outside.push(event.clone());
            continue;
        };
        if event_end <= work_start || event.start() >= work_end {
            outside.push(event.clone());
            continue;
        }

        let mut event = event.clone();
        if overlap::overlaps(&start_item.schedule, &event.schedule) {
            start_absorbed = true;
            event = event.rescheduled(TimeRange::new(work_start, event_end));
        }
        if overlap::overlaps(&end_item.schedule, &event.schedule) {
            end_absorbed = true;
            event = event.rescheduled(TimeRange::new(event.start(), work_end));
        }
        result.push(event);
    }

    if !start_absorbed {
        result.push(start_item);
    }
    if !end_absorbed {
        result.push(end_item);
    }
    result.extend(middles);
    result.sort_by_key(Event::start);

    (result, outside)
}
