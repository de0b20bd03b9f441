use chrono::{Duration, NaiveDateTime, Utc};
use rand::Rng;

/// Epoch seconds for "now minus 1..=max_days_back whole days". Used whenever
/// a record has no usable update time.
pub fn random_recent_epoch(rng: &mut impl Rng, max_days_back: i64) -> i64 {
    let days = rng.gen_range(1..=max_days_back.max(1));
    (Utc::now() - Duration::days(days)).timestamp()
}

/// Convert an upstream ISO-8601 timestamp ("2024-01-01T00:00:00.000Z") to
/// epoch seconds. Any parse failure falls back to the current time; a bad
/// timestamp must never take the whole record down.
pub fn iso_to_epoch(raw: &str) -> i64 {
    match NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(dt) => dt.and_utc().timestamp(),
        Err(_) => Utc::now().timestamp(),
    }
}
