pub mod day;
mod shared;
mod state;
mod tracker;

pub use shared::SharedStreakTracker;
pub use state::{
    StreakState, StreakStatus, CURRENT_STREAK_KEY, LAST_UPDATED_DATE_KEY, LAST_VISIT_DATE_KEY,
    MAX_STREAK_DAYS,
};
pub use tracker::{BackfillPolicy, RecordOutcome, StreakTracker};
