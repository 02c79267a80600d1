//! Final sanity filter over a day's events.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::Event;

/// Longest event accepted on a timesheet.
pub const MAX_EVENT_HOURS: i64 = 6;
/// Events that ended longer ago than this are stale.
pub const MAX_AGE_DAYS: i64 = 30;

/// Why an event failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    TooLong,
    Future,
    Stale,
    MissingEnd,
    ZeroLength,
    TooShort,
}

/// Check one event against `now`. `None` means the event is acceptable.
pub fn check(event: &Event, now: NaiveDateTime, unit: u32) -> Option<Rejection> {
    let duration = event.schedule.duration();

    if duration.is_some_and(|d| d > Duration::hours(MAX_EVENT_HOURS)) {
        return Some(Rejection::TooLong);
    }
    if event.start() > now {
        return Some(Rejection::Future);
    }
    let Some(end) = event.end() else {
        return Some(Rejection::MissingEnd);
    };
    if end < now - Duration::days(MAX_AGE_DAYS) {
        return Some(Rejection::Stale);
    }
    if event.start() == end {
        return Some(Rejection::ZeroLength);
    }
    if end - event.start() < Duration::minutes(i64::from(unit)) {
        return Some(Rejection::TooShort);
    }
    None
}

/// Keep the acceptable events, in order.
pub fn filter(events: &[Event], now: NaiveDateTime, unit: u32) -> Vec<Event> {
    partition(events, now, unit).0
}

/// Split `events` into accepted events and rejected events with their reason.
/// Both sides keep the input order.
pub fn partition(
    events: &[Event],
    now: NaiveDateTime,
    unit: u32,
) -> (Vec<Event>, Vec<(Event, Rejection)>) {
    let mut accepted = Vec::with_capacity(events.len());
    let mut rejected = Vec::new();

    for event in events {
        match check(event, now, unit) {
            None => accepted.push(event.clone()),
            Some(reason) => {
                info!("event rejected ({:?}): {}", reason, event);
                rejected.push((event.clone(), reason));
            }
        }
    }

    (accepted, rejected)
}
