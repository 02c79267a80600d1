//! End-to-end tests for the day task pipeline.

use chrono::{NaiveDate, NaiveDateTime};
use timesheet_engine::model::{DayTask, Event, ProjectRef, Schedule, TimeRange, WorkingEventType};
use timesheet_engine::validator::Rejection;
use timesheet_engine::{
    DayTaskBuilder, EngineConfig, EngineError, EventRoundingConfig, ExclusionReason, FixedClock,
    Priority, ScheduleConfig, SequentialIds,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

fn at(d: u32, hour: u32, min: u32) -> NaiveDateTime {
    day(d).and_hms_opt(hour, min, 0).unwrap()
}

fn event(id: &str, d: u32, start: (u32, u32), end: (u32, u32)) -> Event {
    Event::new(
        id,
        id,
        TimeRange::new(at(d, start.0, start.1), at(d, end.0, end.1)),
    )
}

fn project() -> ProjectRef {
    ProjectRef {
        id: "task-7".to_string(),
        name: "Implementation".to_string(),
        project_id: "p-1".to_string(),
        project_name: "Billing".to_string(),
        project_code: "BIL".to_string(),
    }
}

fn builder(priority: Priority, now: NaiveDateTime) -> DayTaskBuilder {
    let event_config = EventRoundingConfig {
        duplicate_priority: priority,
        ..EventRoundingConfig::default()
    };
    DayTaskBuilder::new(project(), event_config, Some(ScheduleConfig::default()))
        .expect("default configuration is valid")
        .with_clock(FixedClock(now))
        .with_id_generator(SequentialIds::new("id"))
}

/// A Monday/Tuesday with working hours 09:00-18:00.
fn schedules() -> Vec<Schedule> {
    vec![
        Schedule::new(at(2, 9, 0), at(2, 18, 0)),
        Schedule::new(at(3, 9, 0), at(3, 18, 0)),
    ]
}

fn calendar() -> Vec<Event> {
    let old = Event::new(
        "old",
        "old",
        TimeRange::new(
            NaiveDate::from_ymd_opt(2026, 2, 20).unwrap().and_hms_opt(10, 0, 0).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 20).unwrap().and_hms_opt(11, 0, 0).unwrap(),
        ),
    );
    vec![
        event("short", 3, (14, 0), (14, 30)),
        event("standup", 2, (9, 30), (9, 45)).with_recurrence(vec![day(2), day(3)]),
        event("design", 2, (10, 0), (11, 50)),
        event("dinner", 2, (19, 0), (20, 0)),
        event("long", 3, (13, 0), (15, 0)),
        old,
    ]
}

/// Helper: (name, start, end) triples for compact assertions.
fn summary(events: &[Event]) -> Vec<(String, NaiveDateTime, NaiveDateTime)> {
    events
        .iter()
        .map(|e| (e.name.clone(), e.start(), e.end().unwrap()))
        .collect()
}

fn task_for(tasks: &[DayTask], d: u32) -> &DayTask {
    tasks
        .iter()
        .find(|t| t.base_date == day(d))
        .unwrap_or_else(|| panic!("no day task for 2026-03-{d:02}"))
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn missing_schedule_configuration_is_rejected() {
    let result = DayTaskBuilder::new(project(), EventRoundingConfig::default(), None);
    assert!(matches!(result, Err(EngineError::Configuration(_))));

    let result = DayTaskBuilder::from_config(EngineConfig::default());
    assert!(matches!(result, Err(EngineError::Configuration(_))));
}

#[test]
fn marker_length_must_be_a_multiple_of_the_unit() {
    let schedule = ScheduleConfig {
        start_end_time: 45,
        ..ScheduleConfig::default()
    };
    let result = DayTaskBuilder::new(project(), EventRoundingConfig::default(), Some(schedule));
    assert!(matches!(result, Err(EngineError::Configuration(_))));

    let schedule = ScheduleConfig {
        start_end_time: 60,
        ..ScheduleConfig::default()
    };
    assert!(DayTaskBuilder::new(project(), EventRoundingConfig::default(), Some(schedule)).is_ok());
}

#[test]
fn zero_marker_length_is_accepted_and_turns_markers_off() {
    let schedule = ScheduleConfig {
        start_end_time: 0,
        ..ScheduleConfig::default()
    };
    let builder = DayTaskBuilder::new(project(), EventRoundingConfig::default(), Some(schedule))
        .expect("zero is a multiple of the unit")
        .with_clock(FixedClock(at(5, 12, 0)));

    let tasks = builder.build(&[event("design", 2, (10, 0), (11, 0))], &schedules()[..1]);

    let monday = task_for(&tasks, 2);
    assert_eq!(monday.events.len(), 1);
    assert!(monday.schedule_events.is_empty());
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[test]
fn builds_one_task_per_working_day() {
    let builder = builder(Priority::Small, at(5, 12, 0));

    let tasks = builder.build(&calendar(), &schedules());

    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|t| t.project == project()));

    let monday = task_for(&tasks, 2);
    assert_eq!(
        summary(&monday.events),
        vec![
            ("standup".to_string(), at(2, 9, 30), at(2, 10, 0)),
            ("design".to_string(), at(2, 10, 0), at(2, 12, 0)),
        ]
    );
    let kinds: Vec<Option<WorkingEventType>> = monday
        .schedule_events
        .iter()
        .map(|e| e.working_event_type)
        .collect();
    assert_eq!(
        kinds,
        vec![Some(WorkingEventType::Start), Some(WorkingEventType::End)]
    );
    assert_eq!(monday.schedule_events[0].schedule, TimeRange::new(at(2, 9, 0), at(2, 9, 30)));
    assert_eq!(monday.schedule_events[1].schedule, TimeRange::new(at(2, 17, 30), at(2, 18, 0)));

    // The recurring standup repeats on Tuesday; the long event is cut short
    // where the shorter one begins.
    let tuesday = task_for(&tasks, 3);
    assert_eq!(
        summary(&tuesday.events),
        vec![
            ("standup".to_string(), at(3, 9, 30), at(3, 10, 0)),
            ("long".to_string(), at(3, 13, 0), at(3, 14, 0)),
            ("short".to_string(), at(3, 14, 0), at(3, 14, 30)),
        ]
    );
    assert_eq!(tuesday.schedule_events.len(), 2);
    assert_ne!(tuesday.events[0].id, "standup", "recurrence instance gets its own id");
}

#[test]
fn report_explains_every_exclusion() {
    let builder = builder(Priority::Small, at(5, 12, 0));

    let report = builder.build_report(&calendar(), &schedules());

    let excluded: Vec<(&str, ExclusionReason)> = report
        .excluded
        .iter()
        .map(|x| (x.event.id.as_str(), x.reason))
        .collect();
    assert_eq!(
        excluded,
        vec![
            ("old", ExclusionReason::OutsideScheduleRange),
            ("dinner", ExclusionReason::OutsideWorkingHours),
        ]
    );
    let fresh = self::builder(Priority::Small, at(5, 12, 0));
    assert_eq!(report.day_tasks, fresh.build(&calendar(), &schedules()));
}

#[test]
fn large_priority_keeps_the_long_event_and_reports_the_loser() {
    let builder = builder(Priority::Large, at(5, 12, 0));

    let report = builder.build_report(&calendar(), &schedules());

    let tuesday = task_for(&report.day_tasks, 3);
    assert_eq!(
        summary(&tuesday.events),
        vec![
            ("standup".to_string(), at(3, 9, 30), at(3, 10, 0)),
            ("long".to_string(), at(3, 13, 0), at(3, 15, 0)),
        ]
    );
    assert!(report
        .excluded
        .iter()
        .any(|x| x.event.id == "short" && x.reason == ExclusionReason::Overlapped));
}

#[test]
fn events_after_now_are_rejected() {
    let builder = builder(Priority::Small, at(2, 12, 0));
    let schedules = vec![Schedule::new(at(2, 9, 0), at(2, 18, 0))];
    let events = vec![event("design", 2, (10, 0), (11, 0))];

    let report = builder.build_report(&events, &schedules);

    let monday = task_for(&report.day_tasks, 2);
    assert_eq!(monday.events.len(), 1);
    assert_eq!(monday.schedule_events.len(), 1, "end marker lies in the future");
    assert!(report.excluded.iter().any(|x| {
        x.event.working_event_type == Some(WorkingEventType::End)
            && x.reason == ExclusionReason::Rejected(Rejection::Future)
    }));
}

#[test]
fn holiday_days_carry_their_events_through_unmerged() {
    let builder = builder(Priority::Small, at(5, 12, 0));
    let schedules = vec![
        Schedule::new(at(2, 9, 0), at(2, 18, 0)),
        Schedule::holiday(at(3, 0, 0), None, true),
    ];
    let events = vec![event("hotfix", 3, (20, 0), (21, 0))];

    let tasks = builder.build(&events, &schedules);

    let tuesday = task_for(&tasks, 3);
    assert_eq!(
        summary(&tuesday.events),
        vec![("hotfix".to_string(), at(3, 20, 0), at(3, 21, 0))]
    );
    assert!(tuesday.schedule_events.is_empty());
}

#[test]
fn overnight_events_are_split_across_days() {
    let builder = builder(Priority::Small, at(5, 12, 0));
    let schedules = vec![
        Schedule::holiday(at(2, 0, 0), None, false),
        Schedule::holiday(at(3, 0, 0), None, false),
    ];
    let events = vec![Event::new(
        "release",
        "release",
        TimeRange::new(at(2, 22, 0), at(3, 1, 0)),
    )];

    let tasks = builder.build(&events, &schedules);

    assert_eq!(
        summary(&task_for(&tasks, 2).events),
        vec![("release".to_string(), at(2, 22, 0), at(2, 23, 30))]
    );
    assert_eq!(
        summary(&task_for(&tasks, 3).events),
        vec![("release".to_string(), at(3, 0, 0), at(3, 1, 0))]
    );
}

#[test]
fn no_input_means_no_output() {
    let builder = builder(Priority::Small, at(5, 12, 0));
    assert!(builder.build(&[], &[]).is_empty());
}

#[test]
fn exclusion_reasons_serialize_with_a_kind_tag() {
    let json = serde_json::to_value(ExclusionReason::Rejected(Rejection::TooShort)).unwrap();
    assert_eq!(json, serde_json::json!({"kind": "rejected", "detail": "too_short"}));

    let json = serde_json::to_value(ExclusionReason::OutsideWorkingHours).unwrap();
    assert_eq!(json, serde_json::json!({"kind": "outside_working_hours"}));
}

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

fn all_ids(tasks: &[DayTask]) -> Vec<String> {
    tasks
        .iter()
        .flat_map(|t| t.events.iter().chain(&t.schedule_events))
        .map(|e| e.id.clone())
        .collect()
}

#[test]
fn building_twice_gives_identical_results() {
    let builder = builder(Priority::Small, at(5, 12, 0));
    let events = vec![
        event("a", 2, (10, 0), (11, 0)).with_recurrence(vec![day(2), day(3)]),
    ];

    let first = builder.build(&events, &schedules());
    let second = builder.build(&events, &schedules());

    assert_eq!(all_ids(&first), all_ids(&second));
    assert_eq!(first, second);
}

#[test]
fn minted_ids_never_reuse_an_input_id() {
    let builder = DayTaskBuilder::new(
        project(),
        EventRoundingConfig::default(),
        Some(ScheduleConfig::default()),
    )
    .unwrap()
    .with_clock(FixedClock(at(5, 12, 0)));
    let events = vec![
        event("gen-1", 2, (10, 0), (11, 0)),
        event("gen-2", 3, (10, 0), (11, 0)),
    ];

    let tasks = builder.build(&events, &schedules());

    let ids = all_ids(&tasks);
    assert_eq!(ids.len(), 6);
    assert_eq!(ids.iter().filter(|id| id.as_str() == "gen-1").count(), 1);
    assert_eq!(ids.iter().filter(|id| id.as_str() == "gen-2").count(), 1);
    let schedule_ids: Vec<&str> = tasks
        .iter()
        .flat_map(|t| &t.schedule_events)
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(schedule_ids, vec!["gen-3", "gen-4", "gen-5", "gen-6"]);
}
