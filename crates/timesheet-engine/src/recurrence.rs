//! Recurring events.
//!
//! [`expand`] projects an event onto the dates of its recurrence list.
//! [`recurrence_dates`] produces such a list from an RFC 5545 RRULE, wrapping
//! the `rrule` crate with `chrono-tz` timezone validation, for collaborators
//! that build [`Event`] records from calendar feeds.

use chrono::{NaiveDate, NaiveDateTime};
use rrule::RRuleSet;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::ids::IdGenerator;
use crate::model::{Event, TimeRange};

/// Upper bound on the number of occurrences [`recurrence_dates`] will expand.
const MAX_OCCURRENCES: u16 = 500;

/// One event per recurrence date other than the event's own base date.
///
/// Each instance keeps the original time of day (and the original day offset
/// between start and end), gets a fresh id, and carries no recurrence of its
/// own. An event without recurrence yields nothing.
pub fn expand(event: &Event, ids: &dyn IdGenerator) -> Vec<Event> {
    let Some(dates) = &event.recurrence else {
        return Vec::new();
    };

    let base_date = event.base_date();
    let instances: Vec<Event> = dates
        .iter()
        .filter(|date| **date != base_date)
        .map(|date| {
            let start = date.and_time(event.schedule.start.time());
            let end = event
                .schedule
                .end
                .map(|end| (*date + (end.date() - base_date)).and_time(end.time()));
            event.fragment(TimeRange { start, end }, ids)
        })
        .collect();

    debug!(
        "recurrence of {}: {} instance(s)",
        event,
        instances.len()
    );

    instances
}

/// Expand an RRULE into the calendar dates of its occurrences.
///
/// # Arguments
/// - `rrule` -- RFC 5545 RRULE string (e.g., "FREQ=WEEKLY;BYDAY=TU,TH")
/// - `dtstart` -- Local start of the first occurrence
/// - `timezone` -- IANA timezone the local times are expressed in
/// - `until` -- Optional last instant to include (local time). Calendar feeds
///   pass "now" here so only occurrences that already happened are listed.
///
/// # Errors
/// Returns `EngineError::InvalidRule` if the RRULE string is empty or unparseable.
/// Returns `EngineError::InvalidTimezone` if the timezone is not a valid IANA identifier.
pub fn recurrence_dates(
    rrule: &str,
    dtstart: NaiveDateTime,
    timezone: &str,
    until: Option<NaiveDateTime>,
) -> Result<Vec<NaiveDate>> {
    if rrule.is_empty() {
        return Err(EngineError::InvalidRule("empty RRULE string".to_string()));
    }

    let _tz: chrono_tz::Tz = timezone
        .parse()
        .map_err(|_| EngineError::InvalidTimezone(timezone.to_string()))?;

    let dtstart_ical = dtstart.format("%Y%m%dT%H%M%S").to_string();

    // The rrule crate requires UNTIL and DTSTART to share the same timezone.
    // For UTC, UNTIL must end with "Z"; for other timezones, use bare local time.
    let mut rrule_str = rrule.to_string();
    if let Some(until) = until {
        if !rrule_str.to_uppercase().contains("UNTIL=") {
            let mut until_ical = until.format("%Y%m%dT%H%M%S").to_string();
            if timezone == "UTC" {
                until_ical.push('Z');
            }
            rrule_str = format!("{};UNTIL={}", rrule_str, until_ical);
        }
    }

    let rrule_text = format!(
        "DTSTART;TZID={}:{}\nRRULE:{}",
        timezone, dtstart_ical, rrule_str
    );

    let rrule_set: RRuleSet = rrule_text
        .parse()
        .map_err(|e| EngineError::InvalidRule(format!("{}", e)))?;

    let mut dates: Vec<NaiveDate> = rrule_set
        .all(MAX_OCCURRENCES)
        .dates
        .into_iter()
        .map(|dt| dt.date_naive())
        .collect();
    dates.dedup();

    Ok(dates)
}
