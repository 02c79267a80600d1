//! Error types for timesheet-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine was constructed with an unusable configuration.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A working-hours window cannot be turned into events.
    #[error("Schedule not convertible: {0}")]
    Conversion(String),

    #[error("Invalid RRULE: {0}")]
    InvalidRule(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
