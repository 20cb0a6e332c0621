use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::day::{day_in, days_between, decode_timestamp, encode_timestamp};
use crate::storage::KeyValueStore;

pub const LAST_VISIT_DATE_KEY: &str = "lastVisitDate";
pub const CURRENT_STREAK_KEY: &str = "currentStreak";
pub const LAST_UPDATED_DATE_KEY: &str = "lastUpdatedDate";

/// Longest count accepted from a store. Anything larger is a corrupt value,
/// not a streak anyone kept.
pub const MAX_STREAK_DAYS: u32 = 36_525;

/// The persisted streak triple.
///
/// `current_streak` counts consecutive active days ending at
/// `last_visit_date`. The stored count is only brought up to date when it is
/// read through [`crate::StreakTracker::current_streak`], so a snapshot may
/// still carry a count for a streak that has already lapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakState {
    pub last_visit_date: Option<DateTime<FixedOffset>>,
    pub current_streak: u32,
    pub last_updated_date: Option<DateTime<FixedOffset>>,
}

/// Logical state of a streak relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakStatus {
    /// No live streak and nothing stale to collapse.
    Empty,
    /// Count of at least one, last visit today or yesterday.
    Active,
    /// A count is still stored but more than one day has passed since the
    /// last visit. The next streak read collapses it to `Empty`.
    Lapsed,
}

impl StreakState {
    /// Read the triple from a store.
    ///
    /// Absent keys mean "never recorded". Values that fail to parse are
    /// treated the same way.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        Self {
            last_visit_date: read_timestamp(store, LAST_VISIT_DATE_KEY),
            current_streak: read_count(store),
            last_updated_date: read_timestamp(store, LAST_UPDATED_DATE_KEY),
        }
    }

    /// Write the full triple as one batch. Absent timestamps remove their key.
    pub fn store<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        let last_visit = self.last_visit_date.as_ref().map(encode_timestamp);
        let count = self.current_streak.to_string();
        let last_updated = self.last_updated_date.as_ref().map(encode_timestamp);
        store.write_batch(&[
            (LAST_VISIT_DATE_KEY, last_visit.as_deref()),
            (CURRENT_STREAK_KEY, Some(count.as_str())),
            (LAST_UPDATED_DATE_KEY, last_updated.as_deref()),
        ]);
    }

    /// Calendar days from the last visit to `as_of`, in `as_of`'s calendar.
    pub fn gap_days(&self, as_of: &DateTime<FixedOffset>) -> Option<i64> {
        let last = self.last_visit_date.as_ref()?;
        Some(days_between(day_in(last, as_of.offset()), as_of.date_naive()))
    }

    /// The streak as observable at `as_of`: the stored count while the last
    /// visit is no more than one day back, zero otherwise.
    pub fn live_streak(&self, as_of: &DateTime<FixedOffset>) -> u32 {
        match self.gap_days(as_of) {
            Some(gap) if gap <= 1 => self.current_streak,
            _ => 0,
        }
    }

    /// Whether reading the streak at `as_of` has to persist a reset.
    pub fn needs_decay(&self, as_of: &DateTime<FixedOffset>) -> bool {
        match self.gap_days(as_of) {
            None => true,
            Some(gap) => gap > 1,
        }
    }

    pub fn status(&self, as_of: &DateTime<FixedOffset>) -> StreakStatus {
        if self.current_streak == 0 {
            StreakStatus::Empty
        } else if self.live_streak(as_of) == 0 {
            StreakStatus::Lapsed
        } else {
            StreakStatus::Active
        }
    }

    /// First and last calendar day of the streak live at `as_of`.
    pub fn streak_range(&self, as_of: &DateTime<FixedOffset>) -> Option<(NaiveDate, NaiveDate)> {
        let live = self.live_streak(as_of).min(MAX_STREAK_DAYS);
        if live == 0 {
            return None;
        }
        let last_day = day_in(self.last_visit_date.as_ref()?, as_of.offset());
        let first_day = last_day
            .checked_sub_days(Days::new(u64::from(live - 1)))
            .unwrap_or(NaiveDate::MIN);
        Some((first_day, last_day))
    }

    /// Calendar days covered by the streak live at `as_of`, oldest first.
    pub fn streak_days(&self, as_of: &DateTime<FixedOffset>) -> Vec<NaiveDate> {
        match self.streak_range(as_of) {
            Some((first, last)) => first
                .iter_days()
                .take_while(|day| *day <= last)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn covers_day(&self, day: NaiveDate, as_of: &DateTime<FixedOffset>) -> bool {
        self.streak_range(as_of)
            .is_some_and(|(first, last)| first <= day && day <= last)
    }
}

fn read_timestamp<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Option<DateTime<FixedOffset>> {
    let raw = store.get(key)?;
    let parsed = decode_timestamp(&raw);
    if parsed.is_none() && !raw.is_empty() {
        tracing::warn!(key, value = %raw, "unparseable stored date, treating as never recorded");
    }
    parsed
}

fn read_count<S: KeyValueStore + ?Sized>(store: &S) -> u32 {
    let Some(raw) = store.get(CURRENT_STREAK_KEY) else {
        return 0;
    };
    match raw.trim().parse::<u32>() {
        Ok(count) if count <= MAX_STREAK_DAYS => count,
        Ok(_) => {
            tracing::warn!(value = %raw, "implausible stored streak count, treating as 0");
            0
        }
        Err(_) => {
            tracing::warn!(value = %raw, "unparseable stored streak count, treating as 0");
            0
        }
    }
}
