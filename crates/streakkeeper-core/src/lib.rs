//! # Streakkeeper Core Library
//!
//! This library provides the daily-streak logic behind the streakkeeper
//! planner tools. All operations are available through the standalone
//! `streakkeeper` CLI, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Streak tracker**: a small state machine over three persisted keys that
//!   decides the current consecutive-day streak. Decay is applied lazily when
//!   the streak is read; there is no background timer.
//! - **Storage**: a key-value capability trait with an in-memory store and a
//!   SQLite-backed store, plus TOML-based configuration
//!
//! ## Key Components
//!
//! - [`StreakTracker`]: Streak state machine over a [`KeyValueStore`]
//! - [`SharedStreakTracker`]: Mutex-serialized tracker for concurrent callers
//! - [`Database`]: SQLite key-value persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod storage;
pub mod streak;

pub use error::{ConfigError, CoreError, DatabaseError};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
pub use streak::{
    BackfillPolicy, RecordOutcome, SharedStreakTracker, StreakState, StreakStatus, StreakTracker,
};
