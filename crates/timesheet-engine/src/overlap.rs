//! Detect overlapping time ranges.
//!
//! Ranges are compared as open intervals: two ranges overlap when
//! `a.start < b.end && b.start < a.end`. Adjacent ranges (one ends exactly when
//! the other starts) do NOT overlap, and an open-ended range overlaps nothing.
//!
//! Collision scans are pairwise, which is fine at the tens-of-events-per-day
//! scale the engine works at.

use crate::model::{Event, TimeRange};

/// True when `a` and `b` intersect as open intervals.
pub fn overlaps(a: &TimeRange, b: &TimeRange) -> bool {
    match (a.end, b.end) {
        (Some(a_end), Some(b_end)) => a.start < b_end && b.start < a_end,
        _ => false,
    }
}

/// True when `range` overlaps any event in `context`.
///
/// Events whose id equals `exclude_id` are skipped, so an event can be tested
/// against a set that contains itself.
pub fn collides(range: &TimeRange, context: &[Event], exclude_id: Option<&str>) -> bool {
    context
        .iter()
        .filter(|event| exclude_id != Some(event.id.as_str()))
        .any(|event| overlaps(range, &event.schedule))
}

/// True when any two events in `events` overlap.
pub fn any_overlap(events: &[Event]) -> bool {
    events.iter().enumerate().any(|(i, a)| {
        events[i + 1..]
            .iter()
            .any(|b| overlaps(&a.schedule, &b.schedule))
    })
}
