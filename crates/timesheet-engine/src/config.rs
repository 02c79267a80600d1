//! Engine configuration.
//!
//! Defaults mirror the settings a fresh timesheet installation starts with:
//! collision-aware rounding with the shortest event winning conflicts, and
//! half-rounded 30-minute start/end markers for working hours.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::ProjectRef;
use crate::resolver::Priority;
use crate::rounding::{RoundingPolicy, ScheduleRoundingPolicy, ROUNDING_UNIT_MINUTES};

/// How calendar events are rounded and which one wins an overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventRoundingConfig {
    #[serde(default)]
    pub duplicate_priority: Priority,
    #[serde(default)]
    pub rounding_policy: RoundingPolicy,
}

/// Which working-hours markers are synthesized from a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartEndType {
    /// Only a marker at the start of the window.
    Start,
    /// Only a marker at the end of the window.
    End,
    /// Markers at both ends.
    #[default]
    Both,
    /// Both markers, plus `middle` events covering every free slot between them.
    Fill,
}

impl StartEndType {
    pub fn has_start(self) -> bool {
        self != StartEndType::End
    }

    pub fn has_end(self) -> bool {
        self != StartEndType::Start
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StartEndType::Start => "start",
            StartEndType::End => "end",
            StartEndType::Both => "both",
            StartEndType::Fill => "fill",
        }
    }
}

impl fmt::Display for StartEndType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StartEndType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(StartEndType::Start),
            "end" => Ok(StartEndType::End),
            "both" => Ok(StartEndType::Both),
            "fill" => Ok(StartEndType::Fill),
            other => Err(EngineError::Configuration(format!(
                "unknown start/end type '{}'; expected one of start, end, both, fill",
                other
            ))),
        }
    }
}

/// How working-hours windows become events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub rounding_policy: ScheduleRoundingPolicy,
    #[serde(default)]
    pub start_end_type: StartEndType,
    /// Length of the start and end markers, in minutes.
    #[serde(default = "default_start_end_time")]
    pub start_end_time: u32,
}

fn default_start_end_time() -> u32 {
    ROUNDING_UNIT_MINUTES
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            rounding_policy: ScheduleRoundingPolicy::default(),
            start_end_type: StartEndType::default(),
            start_end_time: default_start_end_time(),
        }
    }
}

impl ScheduleConfig {
    /// Marker length must be a whole number of rounding units. Zero is
    /// allowed and turns the markers off.
    pub fn validate(&self, unit: u32) -> Result<(), EngineError> {
        if self.start_end_time % unit != 0 {
            return Err(EngineError::Configuration(format!(
                "start/end time must be a multiple of {} minutes, got {}",
                unit, self.start_end_time
            )));
        }
        Ok(())
    }
}

/// Everything [`crate::DayTaskBuilder::from_config`] needs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub project: ProjectRef,
    #[serde(default)]
    pub event: EventRoundingConfig,
    /// Required; left optional so a missing section is reported as a
    /// configuration error rather than a parse error.
    #[serde(default)]
    pub schedule: Option<ScheduleConfig>,
}
