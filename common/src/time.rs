use chrono::Utc;

pub const SECOND_MS: u64 = 1_000;
pub const HOUR_MS: u64 = 60 * 60 * SECOND_MS;
pub const DAY_MS: u64 = 24 * HOUR_MS;

/// Wall-clock time as epoch milliseconds.
///
/// Clamped at zero so a badly skewed clock cannot produce a wrapped `u64`.
pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
