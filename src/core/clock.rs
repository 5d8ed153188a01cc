//! Process-wide monotonic timestamps.
//!
//! Declared-at and last-modified stamps are compared against each other, so
//! two stamps taken in sequence inside one process must never be equal.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_STAMP_MICROS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Current UTC time at microsecond precision, strictly greater than any
/// value previously returned in this process.
pub fn now() -> DateTime<Utc> {
    let wall = Utc::now().timestamp_micros();
    let mut prev = LAST_STAMP_MICROS.load(Ordering::Acquire);
    loop {
        let next = if wall > prev { wall } else { prev + 1 };
        match LAST_STAMP_MICROS.compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => return DateTime::from_timestamp_micros(next).unwrap_or_else(Utc::now),
            Err(actual) => prev = actual,
        }
    }
}
