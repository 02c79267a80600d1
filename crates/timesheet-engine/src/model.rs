//! Records exchanged with the engine: time ranges, working-hours schedules,
//! calendar events and the per-day output.
//!
//! All timestamps are local wall-clock times. The calendar day a range belongs
//! to (its *base date*) is the date of its start.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::ids::IdGenerator;

const DAY_FORMAT: &str = "%Y/%m/%d (%a)";
const TIME_FORMAT: &str = "%H:%M";

/// A start timestamp with an optional end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    #[serde(default)]
    pub end: Option<NaiveDateTime>,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// A range whose end is not known.
    pub fn open(start: NaiveDateTime) -> Self {
        Self { start, end: None }
    }

    /// `end - start`, or `None` for an open range.
    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end - self.start)
    }

    pub fn base_date(&self) -> NaiveDate {
        self.start.date()
    }

    /// True when the end falls on a later calendar day than the start.
    pub fn is_multi_day(&self) -> bool {
        self.end.is_some_and(|end| end.date() != self.start.date())
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = self.base_date();
        write!(
            f,
            "{} {} - ",
            base.format(DAY_FORMAT),
            self.start.format(TIME_FORMAT)
        )?;
        match self.end {
            Some(end) if end.date() > base => write!(
                f,
                "{} {}",
                end.date().format(DAY_FORMAT),
                end.format(TIME_FORMAT)
            ),
            Some(end) => write!(f, "{}", end.format(TIME_FORMAT)),
            None => f.write_str("(no end)"),
        }
    }
}

/// One day's declared working-hours window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(flatten)]
    pub range: TimeRange,
    #[serde(default)]
    pub is_holiday: bool,
    #[serde(default)]
    pub is_paid_leave: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl Schedule {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            range: TimeRange::new(start, end),
            is_holiday: false,
            is_paid_leave: false,
            error_message: None,
        }
    }

    /// A day off. Paid leave is always also a holiday.
    pub fn holiday(start: NaiveDateTime, end: Option<NaiveDateTime>, paid_leave: bool) -> Self {
        Self {
            range: TimeRange { start, end },
            is_holiday: true,
            is_paid_leave: paid_leave,
            error_message: None,
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn base_date(&self) -> NaiveDate {
        self.range.base_date()
    }

    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_paid_leave {
            f.write_str("<paid leave> ")?;
        } else if self.is_holiday {
            f.write_str("[holiday] ")?;
        }
        write!(f, "{}", self.range)?;
        if let Some(message) = &self.error_message {
            write!(f, " ※{message}")?;
        }
        Ok(())
    }
}

/// Role of a synthesized working-hours event inside the declared window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkingEventType {
    Start,
    Middle,
    End,
}

/// A calendar event, or a working-hours event synthesized by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub organizer: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default)]
    pub location: String,
    pub schedule: TimeRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Vec<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_event_type: Option<WorkingEventType>,
    /// Ids of other events this one is known to duplicate, as supplied by the
    /// caller. Carried through unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_ids: Option<Vec<String>>,
}

impl Event {
    pub fn new(id: impl Into<String>, name: impl Into<String>, schedule: TimeRange) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            organizer: String::new(),
            is_private: false,
            is_cancelled: false,
            location: String::new(),
            schedule,
            recurrence: None,
            working_event_type: None,
            duplicate_ids: None,
        }
    }

    pub fn with_organizer(mut self, organizer: impl Into<String>) -> Self {
        self.organizer = organizer.into();
        self
    }

    pub fn with_recurrence(mut self, dates: Vec<NaiveDate>) -> Self {
        self.recurrence = Some(dates);
        self
    }

    pub fn with_working_type(mut self, kind: WorkingEventType) -> Self {
        self.working_event_type = Some(kind);
        self
    }

    pub fn start(&self) -> NaiveDateTime {
        self.schedule.start
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.schedule.end
    }

    /// Duration of the event; an open-ended event counts as zero.
    pub fn duration(&self) -> Duration {
        self.schedule.duration().unwrap_or_else(Duration::zero)
    }

    pub fn base_date(&self) -> NaiveDate {
        self.schedule.base_date()
    }

    pub fn is_working(&self) -> bool {
        self.working_event_type.is_some()
    }

    /// The same event re-timed to `schedule`. Identity is kept.
    pub fn rescheduled(&self, schedule: TimeRange) -> Self {
        Self {
            schedule,
            ..self.clone()
        }
    }

    /// A new slice of this event with its own id and no recurrence.
    pub fn fragment(&self, schedule: TimeRange, ids: &dyn IdGenerator) -> Self {
        Self {
            id: ids.next_id(),
            schedule,
            recurrence: None,
            ..self.clone()
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_private {
            f.write_str("[private] ")?;
        }
        if self.is_cancelled {
            f.write_str("[cancelled] ")?;
        }
        f.write_str(&self.name)?;
        if !self.organizer.is_empty() {
            write!(f, " ({})", self.organizer)?;
        }
        match &self.recurrence {
            Some(dates) if !dates.is_empty() => {
                write!(f, " {} - ", self.schedule.start.format(TIME_FORMAT))?;
                match self.schedule.end {
                    Some(end) => write!(f, "{}", end.format(TIME_FORMAT))?,
                    None => f.write_str("(no end)")?,
                }
                let days: Vec<String> =
                    dates.iter().map(|d| d.format("%m/%d").to_string()).collect();
                write!(f, " [{}]", days.join(","))
            }
            _ => write!(f, " {}", self.schedule),
        }
    }
}

/// Opaque reference to the project a timesheet is filed against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub project_code: String,
}

/// The reconciled events of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTask {
    pub base_date: NaiveDate,
    pub project: ProjectRef,
    /// Ordinary calendar events (no working-hours tag).
    pub events: Vec<Event>,
    /// Synthesized working-hours events.
    pub schedule_events: Vec<Event>,
}
