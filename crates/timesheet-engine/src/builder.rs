//! The reconciliation pipeline.
//!
//! [`DayTaskBuilder::build`] takes raw calendar events and working-hours
//! schedules and produces one [`DayTask`] per day:
//!
//! 1. bucket events by day, adding an instance per recurrence date
//! 2. drop days outside the schedules' date range
//! 3. split multi-day events per day
//! 4. round every event with the event policy
//! 5. synthesize working-hours events from each schedule
//! 6. merge working-hours events with calendar events
//! 7. resolve remaining overlaps per day
//! 8. validate and emit

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{EngineConfig, EventRoundingConfig, ScheduleConfig};
use crate::converter;
use crate::error::{EngineError, Result};
use crate::ids::{FreshIds, IdGenerator, SequentialIds};
use crate::merger;
use crate::model::{DayTask, Event, ProjectRef, Schedule};
use crate::overlap;
use crate::partition;
use crate::recurrence;
use crate::resolver;
use crate::rounding::{self, ROUNDING_UNIT_MINUTES};
use crate::validator::{self, Rejection};

/// Why an input event (or a piece of it) is missing from the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum ExclusionReason {
    /// Its day lies outside the range of declared working days.
    OutsideScheduleRange,
    /// Rounding left nothing of it.
    RoundedAway,
    /// It lies entirely outside the day's working hours.
    OutsideWorkingHours,
    /// Another event won every conflict it was part of.
    Overlapped,
    /// It failed final validation.
    Rejected(Rejection),
}

/// An event left out of the result, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Excluded {
    pub event: Event,
    pub reason: ExclusionReason,
}

/// The per-day result plus everything that was left out along the way.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BuildReport {
    pub day_tasks: Vec<DayTask>,
    pub excluded: Vec<Excluded>,
}

type DayMap = BTreeMap<NaiveDate, Vec<Event>>;

/// Orchestrates the whole reconciliation for one project.
pub struct DayTaskBuilder {
    project: ProjectRef,
    event_config: EventRoundingConfig,
    schedule_config: ScheduleConfig,
    unit: u32,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
}

impl DayTaskBuilder {
    /// # Errors
    /// Returns `EngineError::Configuration` when `schedule_config` is missing
    /// or its start/end time is not a multiple of the rounding unit.
    pub fn new(
        project: ProjectRef,
        event_config: EventRoundingConfig,
        schedule_config: Option<ScheduleConfig>,
    ) -> Result<Self> {
        let schedule_config = schedule_config.ok_or_else(|| {
            EngineError::Configuration("working-hours configuration is missing".to_string())
        })?;
        schedule_config.validate(ROUNDING_UNIT_MINUTES)?;

        info!(
            "engine configured: unit={}min, event policy={}, priority={:?}, schedule={}/{}min",
            ROUNDING_UNIT_MINUTES,
            event_config.rounding_policy,
            event_config.duplicate_priority,
            schedule_config.start_end_type,
            schedule_config.start_end_time
        );

        Ok(Self {
            project,
            event_config,
            schedule_config,
            unit: ROUNDING_UNIT_MINUTES,
            clock: Box::new(SystemClock),
            ids: Box::new(SequentialIds::default()),
        })
    }

    pub fn from_config(config: EngineConfig) -> Result<Self> {
        Self::new(config.project, config.event, config.schedule)
    }

    /// Use `clock` as the source of "now" for validation.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Use `ids` for every event the engine mints.
    ///
    /// The generator is reset at the start of every build, and ids that
    /// collide with an input event's id are skipped.
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn project(&self) -> &ProjectRef {
        &self.project
    }

    /// Reconcile `events` against `schedules` into one [`DayTask`] per day.
    pub fn build(&self, events: &[Event], schedules: &[Schedule]) -> Vec<DayTask> {
        self.build_report(events, schedules).day_tasks
    }

    /// Like [`DayTaskBuilder::build`], also reporting every excluded event.
    pub fn build_report(&self, events: &[Event], schedules: &[Schedule]) -> BuildReport {
        info!(
            "building day tasks: {} event(s), {} schedule(s)",
            events.len(),
            schedules.len()
        );
        if events.is_empty() {
            warn!("no events to reconcile");
        }
        if schedules.is_empty() {
            warn!("no working-hours schedules given");
        }

        self.ids.reset();
        let taken: HashSet<String> = events.iter().map(|event| event.id.clone()).collect();
        let fresh = FreshIds::new(self.ids.as_ref(), taken);
        let ids: &dyn IdGenerator = &fresh;
        let mut excluded = Vec::new();

        let mut day_map = bucket_by_day(events, ids);
        self.retain_schedule_range(&mut day_map, schedules, &mut excluded);
        let day_map = partition::split(&day_map, ids, self.unit);

        // Rounding sees every event of every day so collision checks can
        // look across day boundaries.
        let all_events: Vec<Event> = day_map.values().flatten().cloned().collect();
        let mut rounded: DayMap = BTreeMap::new();
        for (day, day_events) in &day_map {
            let bucket = rounded.entry(*day).or_default();
            for event in day_events {
                match rounding::round_event(
                    event,
                    self.event_config.rounding_policy,
                    &all_events,
                    self.unit,
                ) {
                    Some(event) => bucket.push(event),
                    None => excluded.push(Excluded {
                        event: event.clone(),
                        reason: ExclusionReason::RoundedAway,
                    }),
                }
            }
        }

        let all_rounded: Vec<Event> = rounded.values().flatten().cloned().collect();
        let mut schedule_events: DayMap = BTreeMap::new();
        for schedule in schedules {
            match converter::convert(
                schedule,
                &self.schedule_config,
                &all_rounded,
                self.unit,
                ids,
            ) {
                Ok(generated) => {
                    for event in generated {
                        schedule_events.entry(event.base_date()).or_default().push(event);
                    }
                }
                Err(e) => warn!("skipping schedule: {}", e),
            }
        }

        let (mut merged, outside) = merger::merge_with_dropped(&schedule_events, &rounded);
        excluded.extend(outside.into_iter().map(|event| Excluded {
            event,
            reason: ExclusionReason::OutsideWorkingHours,
        }));
        for (day, day_events) in rounded {
            merged.entry(day).or_insert(day_events);
        }

        let now = self.clock.now();
        let mut day_tasks = Vec::with_capacity(merged.len());
        for (day, day_events) in merged {
            if day_events.is_empty() {
                debug!("{}: nothing left to resolve", day);
                continue;
            }

            let (resolved, overlapped) = resolver::resolve_day_with_dropped(
                &day_events,
                self.event_config.duplicate_priority,
            );
            debug_assert!(!overlap::any_overlap(&resolved));
            excluded.extend(overlapped.into_iter().map(|event| Excluded {
                event,
                reason: ExclusionReason::Overlapped,
            }));

            let (accepted, rejected) = validator::partition(&resolved, now, self.unit);
            excluded.extend(rejected.into_iter().map(|(event, rejection)| Excluded {
                event,
                reason: ExclusionReason::Rejected(rejection),
            }));

            let (schedule_events, events): (Vec<Event>, Vec<Event>) =
                accepted.into_iter().partition(Event::is_working);
            day_tasks.push(DayTask {
                base_date: day,
                project: self.project.clone(),
                events,
                schedule_events,
            });
        }

        info!(
            "built {} day task(s), {} exclusion(s)",
            day_tasks.len(),
            excluded.len()
        );
        for task in &day_tasks {
            debug!(
                "{} -> {} event(s), {} working-hours event(s)",
                task.base_date,
                task.events.len(),
                task.schedule_events.len()
            );
        }

        BuildReport {
            day_tasks,
            excluded,
        }
    }

    /// Drop days before the first or after the last scheduled working day.
    fn retain_schedule_range(
        &self,
        day_map: &mut DayMap,
        schedules: &[Schedule],
        excluded: &mut Vec<Excluded>,
    ) {
        let (Some(first), Some(last)) = (
            schedules.iter().map(Schedule::base_date).min(),
            schedules.iter().map(Schedule::base_date).max(),
        ) else {
            return;
        };

        let outside: Vec<NaiveDate> = day_map
            .keys()
            .filter(|day| **day < first || **day > last)
            .copied()
            .collect();
        for day in outside {
            if let Some(events) = day_map.remove(&day) {
                excluded.extend(events.into_iter().map(|event| Excluded {
                    event,
                    reason: ExclusionReason::OutsideScheduleRange,
                }));
            }
        }
    }
}

/// Group events by base date, adding one instance per recurrence date.
fn bucket_by_day(events: &[Event], ids: &dyn IdGenerator) -> DayMap {
    let mut sorted = events.to_vec();
    sorted.sort_by_key(Event::base_date);

    let mut day_map: DayMap = BTreeMap::new();
    for event in sorted {
        let instances = recurrence::expand(&event, ids);
        day_map.entry(event.base_date()).or_default().push(event);
        for instance in instances {
            day_map.entry(instance.base_date()).or_default().push(instance);
        }
    }
    day_map
}
