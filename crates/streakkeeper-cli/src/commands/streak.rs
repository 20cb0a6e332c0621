use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone};
use clap::Subcommand;
use serde::Serialize;
use streakkeeper_core::{Config, Database, RecordOutcome, StreakStatus, StreakTracker};

#[derive(Subcommand)]
pub enum StreakAction {
    /// Show the current streak (a lapsed streak is reset)
    Status {
        /// Evaluate as of this date (RFC 3339 or YYYY-MM-DD), default now
        #[arg(long, value_parser = parse_date)]
        as_of: Option<DateTime<FixedOffset>>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record activity
    Record {
        /// When the activity happened (RFC 3339 or YYYY-MM-DD), default now
        #[arg(long, value_parser = parse_date)]
        at: Option<DateTime<FixedOffset>>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the last day activity was recorded
    Last,
    /// List the days of the running streak
    Days {
        /// Evaluate as of this date (RFC 3339 or YYYY-MM-DD), default now
        #[arg(long, value_parser = parse_date)]
        as_of: Option<DateTime<FixedOffset>>,
    },
    /// Dump the stored streak state as JSON
    Show,
}

#[derive(Serialize)]
struct StatusReport {
    current_streak: u32,
    status: StreakStatus,
    last_active_date: Option<DateTime<FixedOffset>>,
    streak_days: Vec<NaiveDate>,
}

#[derive(Serialize)]
struct RecordReport {
    outcome: RecordOutcome,
    changed: bool,
    current_streak: u32,
}

pub fn run(action: StreakAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open(&config.storage.database_file)?;
    tracing::debug!(
        database = %config.storage.database_file,
        backfill_policy = ?config.streak.backfill_policy,
        "streak store ready"
    );
    let mut tracker = StreakTracker::new(db).with_backfill_policy(config.streak.backfill_policy);

    match action {
        StreakAction::Status { as_of, json } => {
            let as_of = as_of.unwrap_or_else(now);
            tracing::debug!(%as_of, "evaluating streak");
            // Status is taken before the read collapses a lapsed streak.
            let status = tracker.status(as_of);
            let current_streak = tracker.current_streak(as_of);
            if json {
                let report = StatusReport {
                    current_streak,
                    status,
                    last_active_date: tracker.last_active_date(),
                    streak_days: tracker.streak_days(as_of),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{current_streak}");
            }
        }
        StreakAction::Record { at, json } => {
            let at = at.unwrap_or_else(now);
            let outcome = tracker.record_activity(at);
            let current_streak = tracker.current_streak(at);
            tracing::debug!(%at, ?outcome, current_streak, "recorded activity");
            if json {
                let report = RecordReport {
                    outcome,
                    changed: outcome.changed_state(),
                    current_streak,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", record_line(outcome, current_streak));
            }
        }
        StreakAction::Last => match tracker.last_active_date() {
            Some(date) => println!("{}", date.to_rfc3339()),
            None => println!("never"),
        },
        StreakAction::Days { as_of } => {
            let as_of = as_of.unwrap_or_else(now);
            for day in tracker.streak_days(as_of) {
                println!("{day}");
            }
        }
        StreakAction::Show => {
            println!("{}", serde_json::to_string_pretty(&tracker.snapshot())?);
        }
    }
    Ok(())
}

fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

fn outcome_label(outcome: RecordOutcome) -> &'static str {
    match outcome {
        RecordOutcome::Started => "started",
        RecordOutcome::Extended => "extended",
        RecordOutcome::AlreadyRecorded => "already recorded today",
        RecordOutcome::IgnoredBackfill => "ignored (before last visit)",
    }
}

/// The new count is only shown when the record changed the stored streak.
fn record_line(outcome: RecordOutcome, current_streak: u32) -> String {
    if outcome.changed_state() {
        format!("{}: streak {current_streak}", outcome_label(outcome))
    } else {
        outcome_label(outcome).to_string()
    }
}

/// Accepts a full RFC 3339 timestamp or a bare `YYYY-MM-DD`, which is taken
/// as local midnight.
fn parse_date(s: &str) -> Result<DateTime<FixedOffset>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Ok(at);
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{s}': expected RFC 3339 or YYYY-MM-DD"))?;
    Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|at| at.fixed_offset())
        .ok_or_else(|| format!("local midnight does not exist on {date}"))
}
