//! `timesheet` CLI: reconcile calendar events into per-day timesheets from
//! the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Build day tasks from a JSON request (stdin → stdout)
//! cat request.json | timesheet build
//!
//! # From file to file, validating against a fixed "now"
//! timesheet build -i request.json -o report.json --now 2026-03-05T12:00:00
//!
//! # Try a rounding policy on a single range
//! timesheet round --start 2026-03-02T09:15:00 --end 2026-03-02T10:25:00 --policy stretch
//! ```
//!
//! A build request is `{"config": EngineConfig, "events": [Event],
//! "schedules": [Schedule]}`; the output is the pretty-printed build report
//! (`day_tasks` and `excluded`).
//!
//! ## Environment
//!
//! - `RUST_LOG`: log filter for stderr output (default: warn)

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::io::{self, Read};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use timesheet_engine::model::{Event, Schedule, TimeRange};
use timesheet_engine::rounding::round_range;
use timesheet_engine::{
    DayTaskBuilder, EngineConfig, FixedClock, RoundingPolicy, ROUNDING_UNIT_MINUTES,
};

#[derive(Parser)]
#[command(
    name = "timesheet",
    version,
    about = "Reconcile calendar events against working hours into per-day timesheets",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build day tasks from a JSON request
    Build {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Local time to validate against instead of the system clock
        /// (e.g., 2026-03-05T12:00:00)
        #[arg(long)]
        now: Option<NaiveDateTime>,
    },
    /// Round a single time range and print the result
    Round {
        /// Local start time (e.g., 2026-03-02T09:15:00)
        #[arg(long)]
        start: NaiveDateTime,
        /// Local end time
        #[arg(long)]
        end: NaiveDateTime,
        /// Rounding policy: backward, forward, round, half, stretch, nonduplicate
        #[arg(long, default_value = "stretch")]
        policy: RoundingPolicy,
    },
}

/// Body of a `build` request.
#[derive(Deserialize)]
struct BuildRequest {
    #[serde(default)]
    config: EngineConfig,
    #[serde(default)]
    events: Vec<Event>,
    #[serde(default)]
    schedules: Vec<Schedule>,
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, now } => {
            let raw = read_input(input.as_deref())?;
            let request: BuildRequest =
                serde_json::from_str(&raw).context("Failed to parse build request")?;

            let mut builder = DayTaskBuilder::from_config(request.config)
                .context("Failed to configure the engine")?;
            if let Some(now) = now {
                builder = builder.with_clock(FixedClock(now));
            }

            let report = builder.build_report(&request.events, &request.schedules);
            info!(
                "{} day task(s), {} excluded event(s)",
                report.day_tasks.len(),
                report.excluded.len()
            );

            let mut pretty = serde_json::to_string_pretty(&report)?;
            pretty.push('\n');
            write_output(output.as_deref(), &pretty)?;
        }
        Commands::Round { start, end, policy } => {
            let range = TimeRange::new(start, end);
            match round_range(&range, policy, &[], ROUNDING_UNIT_MINUTES) {
                Some(rounded) => println!("{}", rounded),
                None => println!("dropped"),
            }
        }
    }

    Ok(())
}

fn init_logging() {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
