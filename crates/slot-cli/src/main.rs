//! `slot` CLI — place TODO tasks from a JSON task file into weekly availability.
//!
//! ## Usage
//!
//! ```sh
//! # Re-plan every todo in tasks.json, rewriting the file in place
//! slot schedule --tasks tasks.json --request request.json
//!
//! # Reproducible run at a fixed time
//! slot schedule --tasks tasks.json --request request.json --now 2026-03-02T08:00
//!
//! # "now" in a specific time zone
//! slot schedule --tasks tasks.json --request request.json --tz Europe/Berlin
//!
//! # Free slots on a date
//! slot free --tasks tasks.json --request request.json --date 2026-03-02
//!
//! # Report overlapping placements (exit code 1 when any exist)
//! slot check --tasks tasks.json
//! ```
//!
//! `request.json` holds the availability and weights of a run:
//!
//! ```json
//! {
//!   "availability": { "0": [{ "start": "09:00", "end": "17:00" }] },
//!   "weights": { "priority": 1.0, "deadline": 100.0 }
//! }
//! ```

mod store;

use std::process;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use slot_engine::{
    busy_intervals_for, find_conflicts, free_slots, AvailabilityConfig, EngineConfig, Scheduler,
    Weights,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::store::FileStore;

#[derive(Parser)]
#[command(name = "slot", version, about = "Deadline-aware TODO scheduler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log placement decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-plan every todo and write the placements back to the task file
    Schedule {
        /// JSON task file (read, then rewritten after every placement)
        #[arg(short, long)]
        tasks: String,
        /// JSON file with availability and weights
        #[arg(short, long)]
        request: String,
        /// Fixed "now" as YYYY-MM-DDTHH:MM[:SS] (defaults to the current time)
        #[arg(long)]
        now: Option<String>,
        /// IANA time zone for the current time (ignored with --now)
        #[arg(long)]
        tz: Option<String>,
        /// Days the deadline phase scans before deferring a task to overflow
        #[arg(long, default_value_t = EngineConfig::default().max_scan_days)]
        max_scan_days: u32,
    },
    /// Show free slots on a date
    Free {
        #[arg(short, long)]
        tasks: String,
        #[arg(short, long)]
        request: String,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: String,
    },
    /// Report overlapping placed tasks
    Check {
        #[arg(short, long)]
        tasks: String,
    },
}

/// Availability and weights of a run, as supplied by the caller.
#[derive(Debug, Deserialize)]
struct ScheduleRequest {
    availability: AvailabilityConfig,
    #[serde(default)]
    weights: Weights,
}

#[derive(Serialize)]
struct SlotOut {
    start: NaiveDateTime,
    end: NaiveDateTime,
    duration_minutes: i64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Schedule {
            tasks,
            request,
            now,
            tz,
            max_scan_days,
        } => {
            let request = read_request(&request)?;
            let now = resolve_now(now.as_deref(), tz.as_deref())?;
            let mut store = FileStore::open(&tasks)?;

            let report = Scheduler::new(request.availability, request.weights)
                .with_config(EngineConfig { max_scan_days })
                .run(&mut store, now)
                .context("Scheduling run aborted")?;

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Free {
            tasks,
            request,
            date,
        } => {
            let request = read_request(&request)?;
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {}", date))?;
            let store = FileStore::open(&tasks)?;

            let windows = request.availability.windows_for_date(date);
            let busy = busy_intervals_for(&store, date)?;
            let slots: Vec<SlotOut> = free_slots(&windows, &busy)
                .into_iter()
                .map(|iv| SlotOut {
                    start: iv.start,
                    end: iv.end,
                    duration_minutes: iv.duration_minutes(),
                })
                .collect();

            println!("{}", serde_json::to_string_pretty(&slots)?);
        }
        Commands::Check { tasks } => {
            let store = FileStore::open(&tasks)?;
            let conflicts = find_conflicts(store.tasks());
            println!("{}", serde_json::to_string_pretty(&conflicts)?);
            if !conflicts.is_empty() {
                process::exit(1);
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays valid JSON. `--verbose` forces debug level; otherwise
/// `RUST_LOG` applies, defaulting to warnings only.
fn init_tracing(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(env_filter),
        )
        .init();
}

fn read_request(path: &str) -> Result<ScheduleRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path))?;
    let request: ScheduleRequest = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse request from: {}", path))?;
    request
        .availability
        .validate()
        .with_context(|| format!("Invalid availability in: {}", path))?;
    Ok(request)
}

/// `--now` wins; otherwise the current wall-clock time in `--tz`, or local time.
fn resolve_now(now: Option<&str>, tz: Option<&str>) -> Result<NaiveDateTime> {
    if let Some(raw) = now {
        return NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
            .with_context(|| format!("Invalid --now (expected YYYY-MM-DDTHH:MM[:SS]): {}", raw));
    }
    match tz {
        Some(name) => {
            let tz: Tz = name
                .parse()
                .map_err(|_| anyhow::anyhow!("Unknown time zone: '{}'", name))?;
            Ok(Utc::now().with_timezone(&tz).naive_local())
        }
        None => Ok(Local::now().naive_local()),
    }
}
