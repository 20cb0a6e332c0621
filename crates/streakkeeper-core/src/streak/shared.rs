use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, FixedOffset, NaiveDate};

use super::state::{StreakState, StreakStatus};
use super::tracker::{RecordOutcome, StreakTracker};
use crate::storage::KeyValueStore;

/// A [`StreakTracker`] that can be used from several threads.
///
/// Every operation holds the lock for its whole read-modify-write, so two
/// activity records for the same day can never both observe the old state.
/// Calls are applied in the order they acquire the lock.
pub struct SharedStreakTracker<S> {
    inner: Arc<Mutex<StreakTracker<S>>>,
}

impl<S> Clone for SharedStreakTracker<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore> SharedStreakTracker<S> {
    pub fn new(tracker: StreakTracker<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tracker)),
        }
    }

    // Poisoning is ignored: every call re-reads its state from the store.
    fn lock(&self) -> MutexGuard<'_, StreakTracker<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the tracker.
    pub fn with<R>(&self, f: impl FnOnce(&mut StreakTracker<S>) -> R) -> R {
        let mut guard = self.lock();
        f(&mut *guard)
    }

    pub fn current_streak(&self, as_of: DateTime<FixedOffset>) -> u32 {
        self.lock().current_streak(as_of)
    }

    pub fn record_activity(&self, at: DateTime<FixedOffset>) -> RecordOutcome {
        self.lock().record_activity(at)
    }

    pub fn last_active_date(&self) -> Option<DateTime<FixedOffset>> {
        self.lock().last_active_date()
    }

    pub fn snapshot(&self) -> StreakState {
        self.lock().snapshot()
    }

    pub fn status(&self, as_of: DateTime<FixedOffset>) -> StreakStatus {
        self.lock().status(as_of)
    }

    pub fn streak_days(&self, as_of: DateTime<FixedOffset>) -> Vec<NaiveDate> {
        self.lock().streak_days(as_of)
    }
}

impl<S: KeyValueStore> From<StreakTracker<S>> for SharedStreakTracker<S> {
    fn from(tracker: StreakTracker<S>) -> Self {
        Self::new(tracker)
    }
}
