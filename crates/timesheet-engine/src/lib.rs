//! # timesheet-engine
//!
//! Reconciles calendar events against declared working hours and produces a
//! conflict-free, per-day partition of time suitable for timesheet entry.
//!
//! The engine is a pure, synchronous data transformation: it never touches the
//! filesystem or the network. The only ambient inputs, the wall clock and the
//! id source for synthesized events, are injected through [`clock::Clock`] and
//! [`ids::IdGenerator`].
//!
//! ## Modules
//!
//! - [`model`] - Event, Schedule, TimeRange and DayTask records
//! - [`rounding`] - Time quantization and the six range rounding policies
//! - [`overlap`] - Open-interval overlap predicate and collision scans
//! - [`recurrence`] - Recurrence date projection and RRULE date expansion
//! - [`validator`] - Drops stale, future, degenerate or over-long events
//! - [`partition`] - Splits multi-day events into one fragment per day
//! - [`resolver`] - Resolves overlapping events into a non-overlapping sequence
//! - [`converter`] - Turns a working-hours window into start/middle/end events
//! - [`merger`] - Merges working-hours events with ordinary calendar events
//! - [`builder`] - The top-level pipeline producing [`model::DayTask`]s
//! - [`config`] - Engine configuration records and defaults
//! - [`error`] - Error types

pub mod builder;
pub mod clock;
pub mod config;
pub mod converter;
pub mod error;
pub mod ids;
pub mod merger;
pub mod model;
pub mod overlap;
pub mod partition;
pub mod recurrence;
pub mod resolver;
pub mod rounding;
pub mod validator;

pub use builder::{BuildReport, DayTaskBuilder, Excluded, ExclusionReason};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{EngineConfig, EventRoundingConfig, ScheduleConfig, StartEndType};
pub use error::EngineError;
pub use ids::{IdGenerator, SequentialIds};
pub use model::{DayTask, Event, ProjectRef, Schedule, TimeRange, WorkingEventType};
pub use resolver::Priority;
pub use rounding::{RoundingPolicy, ScheduleRoundingPolicy, ROUNDING_UNIT_MINUTES};
