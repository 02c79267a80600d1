//! Resolve a day's overlapping events into a non-overlapping sequence.
//!
//! The resolver walks the day left to right. At each step it looks only at
//! events ending after the previously chosen one, trims whatever still overlaps
//! that choice, and picks the earliest remaining event. When that pick
//! conflicts with an event the [`Priority`] favours, the pick is cut short at
//! the favoured event's start so the favoured event can be chosen next.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Event, TimeRange};
use crate::overlap;

/// Which event survives at a conflict point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Keep the shortest event; yields a finer-grained timesheet.
    #[default]
    Small,
    /// Keep the longest event.
    Large,
}

impl Priority {
    /// Orders `a` before `b` when `a`'s duration is preferred.
    fn prefer(self, a: &Event, b: &Event) -> Ordering {
        match self {
            Priority::Small => a.duration().cmp(&b.duration()),
            Priority::Large => b.duration().cmp(&a.duration()),
        }
    }
}

/// Pick the event that follows `current` in the resolved sequence.
///
/// Returns `None` once no candidate ends after `current`.
pub fn find_next(
    current: Option<&Event>,
    candidates: &[Event],
    priority: Priority,
) -> Option<Event> {
    find_next_indexed(current, candidates, priority).map(|(_, event)| event)
}

/// Like [`find_next`], also returning the index of the candidate the pick was
/// derived from.
fn find_next_indexed(
    current: Option<&Event>,
    candidates: &[Event],
    priority: Priority,
) -> Option<(usize, Event)> {
    let current_end = match current {
        Some(event) => Some(event.end()?),
        None => None,
    };

    let mut pool: Vec<(usize, Event)> = Vec::with_capacity(candidates.len());
    for (index, candidate) in candidates.iter().enumerate() {
        let Some(end) = candidate.end() else {
            continue;
        };
        let (Some(current), Some(current_end)) = (current, current_end) else {
            pool.push((index, candidate.clone()));
            continue;
        };
        if end <= current_end {
            continue;
        }
        if overlap::overlaps(&current.schedule, &candidate.schedule) {
            // end > current_end here, so the trimmed range is never empty.
            pool.push((index, candidate.rescheduled(TimeRange::new(current_end, end))));
        } else {
            pool.push((index, candidate.clone()));
        }
    }

    pool.sort_by(|(_, a), (_, b)| {
        a.start()
            .cmp(&b.start())
            .then_with(|| priority.prefer(a, b))
    });

    let (index, winner) = pool.first()?.clone();

    let rival = pool
        .iter()
        .map(|(_, event)| event)
        .filter(|event| overlap::overlaps(&event.schedule, &winner.schedule))
        .min_by(|a, b| priority.prefer(a, b));

    match rival {
        Some(rival) if winner.duration() > rival.duration() => {
            let clipped = winner.rescheduled(TimeRange::new(winner.start(), rival.start()));
            Some((index, clipped))
        }
        _ => Some((index, winner)),
    }
}

/// Resolve one day's events into a time-ordered, non-overlapping sequence.
pub fn resolve_day(events: &[Event], priority: Priority) -> Vec<Event> {
    resolve_day_with_dropped(events, priority).0
}

/// Resolve one day's events, also returning the inputs that lost every
/// conflict and contributed nothing to the result.
///
/// Each input contributes at most one piece, so the result never holds more
/// events than the input and the loop always terminates.
pub fn resolve_day_with_dropped(
    events: &[Event],
    priority: Priority,
) -> (Vec<Event>, Vec<Event>) {
    let mut remaining = events.to_vec();
    let mut resolved: Vec<Event> = Vec::with_capacity(events.len());

    while let Some((index, next)) = find_next_indexed(resolved.last(), &remaining, priority) {
        remaining.remove(index);
        resolved.push(next);
    }

    debug!(
        "resolved {} event(s) into {}, {} dropped",
        events.len(),
        resolved.len(),
        remaining.len()
    );

    (resolved, remaining)
}
