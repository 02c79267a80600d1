//! Turn a declared working-hours window into working-hours events.
//!
//! Depending on [`StartEndType`] a window yields a `start` marker anchored at
//! its start, an `end` marker anchored at its end, and in `fill` mode `middle`
//! events covering every free unit-sized slot in between. Markers and slots
//! that would collide with an existing calendar event are left out.

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::config::{ScheduleConfig, StartEndType};
use crate::error::{EngineError, Result};
use crate::ids::IdGenerator;
use crate::model::{Event, Schedule, TimeRange, WorkingEventType};
use crate::overlap;
use crate::partition::{day_end, day_start};
use crate::rounding::{self, RoundingPolicy};

/// Organizer recorded on every synthesized working-hours event.
pub const AUTOMATIC_ORGANIZER: &str = "Automatic";

pub const START_EVENT_NAME: &str = "Work start";
pub const MIDDLE_EVENT_NAME: &str = "Working";
pub const END_EVENT_NAME: &str = "Work end";

/// Convert one working-hours window into start, middle and end events.
///
/// `context` holds the (already rounded) calendar events the working-hours
/// events must not collide with. The result is ordered start, middles in time
/// order, end, and may be empty.
///
/// # Errors
/// Returns `EngineError::Conversion` for a holiday, a schedule carrying an
/// error message, or a schedule without an end.
pub fn convert(
    schedule: &Schedule,
    config: &ScheduleConfig,
    context: &[Event],
    unit: u32,
    ids: &dyn IdGenerator,
) -> Result<Vec<Event>> {
    let window_end = match schedule.range.end {
        Some(end) if !schedule.is_holiday && !schedule.is_error() => end,
        _ => {
            return Err(EngineError::Conversion(format!(
                "not convertible: holiday or error: {}",
                schedule
            )))
        }
    };
    let window_start = schedule.range.start;

    let length = Duration::minutes(i64::from(config.start_end_time));
    let policy = RoundingPolicy::from(config.rounding_policy);

    // A zero marker length yields no markers, and without them no fill.
    let marked = config.start_end_time > 0;

    let start_marker = (marked && config.start_end_type.has_start())
        .then(|| {
            rounding::round_range(
                &TimeRange::new(window_start, window_start + length),
                policy,
                context,
                unit,
            )
        })
        .flatten()
        .map(|range| match range.end {
            Some(end) if end - range.start > length => {
                TimeRange::new(range.start, range.start + length)
            }
            _ => range,
        });

    let end_marker = (marked && config.start_end_type.has_end())
        .then(|| {
            rounding::round_range(
                &TimeRange::new(window_end - length, window_end),
                policy,
                context,
                unit,
            )
        })
        .flatten()
        .map(|range| match range.end {
            Some(end) if end - range.start > length => TimeRange::new(end - length, end),
            _ => range,
        });

    let mut result = Vec::new();

    if let Some(range) = start_marker.filter(|r| !overlap::collides(r, context, None)) {
        result.push(working_event(START_EVENT_NAME, range, WorkingEventType::Start, ids));
    }

    if config.start_end_type == StartEndType::Fill {
        if let (Some(after), Some(before)) = (
            start_marker.and_then(|r| r.end),
            end_marker.map(|r| r.start),
        ) {
            result.extend(fill_runs(after, before, context, unit).into_iter().map(|range| {
                working_event(MIDDLE_EVENT_NAME, range, WorkingEventType::Middle, ids)
            }));
        }
    }

    if let Some(range) = end_marker.filter(|r| !overlap::collides(r, context, None)) {
        result.push(working_event(END_EVENT_NAME, range, WorkingEventType::End, ids));
    }

    debug!(
        "schedule {} ({}) -> {} working event(s)",
        schedule,
        config.start_end_type,
        result.len()
    );

    Ok(result)
}

/// Free unit-sized slots between `after` and `before`, merged into runs.
///
/// The first day starts at `after`, the last day stops at `before`, and days
/// in between cover 00:00 to [`day_end`]. Runs never span a day boundary.
fn fill_runs(
    after: NaiveDateTime,
    before: NaiveDateTime,
    context: &[Event],
    unit: u32,
) -> Vec<TimeRange> {
    let step = Duration::minutes(i64::from(unit));
    let first_day = after.date();
    let last_day = before.date();

    let mut runs = Vec::new();
    let mut day = first_day;
    while day <= last_day {
        let from = if day == first_day { after } else { day_start(day) };
        let to = if day == last_day { before } else { day_end(day, unit) };

        let mut day_runs: Vec<TimeRange> = Vec::new();
        let mut slot_start = from;
        while slot_start + step <= to {
            let slot = TimeRange::new(slot_start, slot_start + step);
            if !overlap::collides(&slot, context, None) {
                match day_runs.last_mut() {
                    Some(run) if run.end == Some(slot.start) => run.end = slot.end,
                    _ => day_runs.push(slot),
                }
            }
            slot_start += step;
        }
        runs.extend(day_runs);

        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    runs
}

fn working_event(
    name: &str,
    range: TimeRange,
    kind: WorkingEventType,
    ids: &dyn IdGenerator,
) -> Event {
    Event::new(ids.next_id(), name, range)
        .with_organizer(AUTOMATIC_ORGANIZER)
        .with_working_type(kind)
}
