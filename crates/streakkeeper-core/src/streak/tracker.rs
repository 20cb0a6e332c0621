//! Daily streak tracker.
//!
//! Decides the user's consecutive-day streak from the persisted
//! [`StreakState`] and a stream of "active at" timestamps. The lapse of a
//! streak is not observed by a timer: it is applied lazily whenever the
//! streak is read with [`StreakTracker::current_streak`], so the stored count
//! stays stale until that read happens.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::day::day_in;
use super::state::{StreakState, StreakStatus, CURRENT_STREAK_KEY, MAX_STREAK_DAYS};
use crate::storage::KeyValueStore;

/// What to do with activity dated before the last recorded visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackfillPolicy {
    /// Leave the state untouched.
    #[default]
    Ignore,
    /// Start a new streak of 1 at the earlier day, moving the last visit back.
    Restart,
}

/// Result of [`StreakTracker::record_activity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    /// A new streak of 1 was started.
    Started,
    /// The day directly followed the last visit; the streak grew by one.
    Extended,
    /// Activity was already recorded for this calendar day.
    AlreadyRecorded,
    /// The day lies before the last visit and the policy is `Ignore`.
    IgnoredBackfill,
}

impl RecordOutcome {
    /// Whether the persisted state was written.
    pub fn changed_state(self) -> bool {
        matches!(self, RecordOutcome::Started | RecordOutcome::Extended)
    }
}

/// Streak state machine over a key-value store.
///
/// The tracker never fails: unreadable stored values fall back to the
/// "never recorded" state.
pub struct StreakTracker<S> {
    store: S,
    backfill_policy: BackfillPolicy,
}

impl<S: KeyValueStore> StreakTracker<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            backfill_policy: BackfillPolicy::default(),
        }
    }

    pub fn with_backfill_policy(mut self, policy: BackfillPolicy) -> Self {
        self.backfill_policy = policy;
        self
    }

    pub fn backfill_policy(&self) -> BackfillPolicy {
        self.backfill_policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The streak as of `as_of`.
    ///
    /// Returns the stored count while the last visit is today or yesterday in
    /// `as_of`'s calendar. When nothing was ever recorded, or more than one
    /// day has passed, the stored count is reset to 0 and 0 is returned.
    pub fn current_streak(&mut self, as_of: DateTime<FixedOffset>) -> u32 {
        let state = self.snapshot();
        if state.needs_decay(&as_of) {
            if state.current_streak != 0 {
                tracing::debug!(
                    previous = state.current_streak,
                    last_visit = ?state.last_visit_date,
                    as_of = %as_of,
                    "streak lapsed"
                );
            }
            self.store.set(CURRENT_STREAK_KEY, "0");
            return 0;
        }
        state.current_streak
    }

    /// Register that the user was active at `at`.
    ///
    /// Repeated activity on the same calendar day is counted once. Activity
    /// on the day after the last visit extends the streak; anything else
    /// starts a new streak of 1, except days before the last visit, which
    /// follow the configured [`BackfillPolicy`].
    pub fn record_activity(&mut self, at: DateTime<FixedOffset>) -> RecordOutcome {
        let state = self.snapshot();
        let offset = *at.offset();
        let day = at.date_naive();

        let already_recorded = [state.last_updated_date, state.last_visit_date]
            .iter()
            .flatten()
            .any(|recorded| day_in(recorded, &offset) == day);
        if already_recorded {
            return RecordOutcome::AlreadyRecorded;
        }

        let last_day = state
            .last_visit_date
            .as_ref()
            .map(|last| day_in(last, &offset));

        if let Some(last_day) = last_day.filter(|last_day| day < *last_day) {
            match self.backfill_policy {
                BackfillPolicy::Ignore => {
                    tracing::debug!(%day, %last_day, "ignoring activity before last visit");
                    return RecordOutcome::IgnoredBackfill;
                }
                BackfillPolicy::Restart => {
                    tracing::warn!(
                        %day,
                        %last_day,
                        previous = state.current_streak,
                        "activity before last visit, restarting streak"
                    );
                }
            }
        }

        let (current_streak, outcome) = match last_day {
            Some(last_day) if last_day.succ_opt() == Some(day) => (
                state.current_streak.saturating_add(1).min(MAX_STREAK_DAYS),
                RecordOutcome::Extended,
            ),
            _ => (1, RecordOutcome::Started),
        };

        StreakState {
            last_visit_date: Some(at),
            current_streak,
            last_updated_date: Some(at),
        }
        .store(&mut self.store);

        tracing::debug!(%day, current_streak, ?outcome, "recorded activity");
        outcome
    }

    /// The last recorded visit, exactly as stored. No lapse is applied.
    pub fn last_active_date(&self) -> Option<DateTime<FixedOffset>> {
        self.snapshot().last_visit_date
    }

    /// The persisted triple as currently stored.
    pub fn snapshot(&self) -> StreakState {
        StreakState::load(&self.store)
    }

    /// Overwrite the persisted triple, e.g. when restoring an exported snapshot.
    pub fn restore(&mut self, state: &StreakState) {
        state.store(&mut self.store);
    }

    /// Logical state at `as_of`, without persisting anything.
    pub fn status(&self, as_of: DateTime<FixedOffset>) -> StreakStatus {
        self.snapshot().status(&as_of)
    }

    /// Calendar days covered by the streak live at `as_of`, oldest first.
    pub fn streak_days(&self, as_of: DateTime<FixedOffset>) -> Vec<NaiveDate> {
        self.snapshot().streak_days(&as_of)
    }

    pub fn is_streak_day(&self, day: NaiveDate, as_of: DateTime<FixedOffset>) -> bool {
        self.snapshot().covers_day(day, &as_of)
    }
}
