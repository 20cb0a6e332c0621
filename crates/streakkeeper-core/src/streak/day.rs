//! Calendar-day arithmetic and timestamp encoding.
//!
//! Activity timestamps carry the UTC offset of the user's calendar at the
//! moment they were taken. When two timestamps are compared, the stored one is
//! projected into the offset of the timestamp being evaluated, and only the
//! resulting calendar dates are compared.

use chrono::{DateTime, FixedOffset, NaiveDate};

/// Calendar date of `at` as seen from a calendar running at `offset`.
pub fn day_in(at: &DateTime<FixedOffset>, offset: &FixedOffset) -> NaiveDate {
    at.with_timezone(offset).date_naive()
}

/// Signed number of calendar days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

/// Encode a timestamp for the key-value store (RFC 3339, offset preserved).
pub fn encode_timestamp(at: &DateTime<FixedOffset>) -> String {
    at.to_rfc3339()
}

/// Decode a stored timestamp. Accepts any RFC 3339 string, including the
/// `Z`-suffixed UTC form.
pub fn decode_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw.trim()).ok()
}
