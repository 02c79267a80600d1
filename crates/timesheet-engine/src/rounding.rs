//! Time quantization and range rounding.
//!
//! Every boundary the engine emits is aligned to the rounding unit, counted in
//! minutes from the top of the hour. [`round_time`] moves a single timestamp
//! onto the grid; [`round_range`] applies one of the [`RoundingPolicy`] rules
//! to both ends of a range and discards ranges that end up degenerate.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EngineError;
use crate::model::{Event, TimeRange};
use crate::overlap;

/// Minutes per rounding quantum.
pub const ROUNDING_UNIT_MINUTES: u32 = 30;

/// How a range's boundaries are moved onto the rounding grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// Both boundaries round up.
    Backward,
    /// Both boundaries round down.
    Forward,
    /// Nearest grid point; exactly half a unit rounds up.
    Round,
    /// Same rule as [`RoundingPolicy::Round`].
    Half,
    /// Start rounds down, end rounds up; the range only grows.
    Stretch,
    /// Grow like `Stretch` unless that collides with another event, in which
    /// case that boundary rounds the other way.
    #[default]
    #[serde(rename = "nonduplicate", alias = "non_duplicate")]
    NonDuplicate,
}

impl RoundingPolicy {
    pub const ALL: [RoundingPolicy; 6] = [
        RoundingPolicy::Backward,
        RoundingPolicy::Forward,
        RoundingPolicy::Round,
        RoundingPolicy::Half,
        RoundingPolicy::Stretch,
        RoundingPolicy::NonDuplicate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundingPolicy::Backward => "backward",
            RoundingPolicy::Forward => "forward",
            RoundingPolicy::Round => "round",
            RoundingPolicy::Half => "half",
            RoundingPolicy::Stretch => "stretch",
            RoundingPolicy::NonDuplicate => "nonduplicate",
        }
    }
}

impl fmt::Display for RoundingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundingPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoundingPolicy::ALL
            .into_iter()
            .find(|policy| policy.as_str() == s)
            .ok_or_else(|| {
                EngineError::Configuration(format!(
                    "unknown rounding policy '{}'; expected one of \
                     backward, forward, round, half, stretch, nonduplicate",
                    s
                ))
            })
    }
}

/// The policies allowed for working-hours windows. Collision-aware rounding
/// makes no sense for the window itself, so `NonDuplicate` is excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleRoundingPolicy {
    Backward,
    Forward,
    Round,
    #[default]
    Half,
    Stretch,
}

impl From<ScheduleRoundingPolicy> for RoundingPolicy {
    fn from(policy: ScheduleRoundingPolicy) -> Self {
        match policy {
            ScheduleRoundingPolicy::Backward => RoundingPolicy::Backward,
            ScheduleRoundingPolicy::Forward => RoundingPolicy::Forward,
            ScheduleRoundingPolicy::Round => RoundingPolicy::Round,
            ScheduleRoundingPolicy::Half => RoundingPolicy::Half,
            ScheduleRoundingPolicy::Stretch => RoundingPolicy::Stretch,
        }
    }
}

/// Move `time` onto the `unit`-minute grid.
///
/// An already aligned minute is returned untouched. Otherwise seconds and
/// sub-seconds are dropped and the minute moves up (`round_up`) or down to the
/// nearest multiple of `unit`; rounding up may roll into the next hour or day.
pub fn round_time(time: NaiveDateTime, round_up: bool, unit: u32) -> NaiveDateTime {
    let rem = time.minute() % unit;
    if rem == 0 {
        return time;
    }

    let floor = time
        - Duration::seconds(i64::from(time.second()))
        - Duration::nanoseconds(i64::from(time.nanosecond()));

    if round_up {
        floor + Duration::minutes(i64::from(unit - rem))
    } else {
        floor - Duration::minutes(i64::from(rem))
    }
}

/// Round both boundaries of `range` according to `policy`.
///
/// `context` is only consulted by [`RoundingPolicy::NonDuplicate`]; an empty
/// context never collides. Returns `None` for an open range, and for any range
/// that after rounding is empty, inverted, or shorter than one unit.
pub fn round_range(
    range: &TimeRange,
    policy: RoundingPolicy,
    context: &[Event],
    unit: u32,
) -> Option<TimeRange> {
    round_range_excluding(range, policy, context, None, unit)
}

/// Round an event's range, ignoring the event itself when checking for
/// collisions. The rounded event keeps its identity.
pub fn round_event(
    event: &Event,
    policy: RoundingPolicy,
    context: &[Event],
    unit: u32,
) -> Option<Event> {
    round_range_excluding(&event.schedule, policy, context, Some(&event.id), unit)
        .map(|range| event.rescheduled(range))
}

fn round_range_excluding(
    range: &TimeRange,
    policy: RoundingPolicy,
    context: &[Event],
    exclude_id: Option<&str>,
    unit: u32,
) -> Option<TimeRange> {
    let original_end = range.end?;

    let start_rem = range.start.minute() % unit;
    let end_rem = original_end.minute() % unit;

    let mut start = range.start;
    let mut end = original_end;

    if start_rem != 0 {
        start = match policy {
            RoundingPolicy::Backward => round_time(start, true, unit),
            RoundingPolicy::Forward | RoundingPolicy::Stretch => round_time(start, false, unit),
            RoundingPolicy::Round | RoundingPolicy::Half => {
                round_time(start, start_rem * 2 >= unit, unit)
            }
            RoundingPolicy::NonDuplicate => {
                let down = round_time(start, false, unit);
                let probe = TimeRange::new(down, original_end);
                if overlap::collides(&probe, context, exclude_id) {
                    round_time(start, true, unit)
                } else {
                    down
                }
            }
        };
    }

    if end_rem != 0 {
        end = match policy {
            RoundingPolicy::Backward | RoundingPolicy::Stretch => round_time(end, true, unit),
            RoundingPolicy::Forward => round_time(end, false, unit),
            RoundingPolicy::Round | RoundingPolicy::Half => {
                round_time(end, end_rem * 2 >= unit, unit)
            }
            RoundingPolicy::NonDuplicate => {
                let up = round_time(end, true, unit);
                let probe = TimeRange::new(range.start, up);
                if overlap::collides(&probe, context, exclude_id) {
                    round_time(end, false, unit)
                } else {
                    up
                }
            }
        };
    }

    if start >= end || end - start < Duration::minutes(i64::from(unit)) {
        info!(
            "range dropped by {} rounding: {} -> {} - {}",
            policy,
            range,
            start.format("%H:%M"),
            end.format("%H:%M")
        );
        return None;
    }

    Some(TimeRange::new(start, end))
}
