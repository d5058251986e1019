//! Common time helpers for fbc_core.

use std::time::Duration;

/// Default control tick in milliseconds.
pub const DEFAULT_TICK_MS: u64 = 20;

/// Tick duration from a millisecond setting, clamped to at least 1 ms.
#[inline]
pub fn tick_duration(ms: u64) -> Duration {
    Duration::from_millis(ms.max(1))
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
#[inline]
pub fn as_millis_u64(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_never_zero() {
        assert_eq!(tick_duration(0), Duration::from_millis(1));
        assert_eq!(tick_duration(25), Duration::from_millis(25));
        assert_eq!(as_millis_u64(Duration::from_secs(2)), 2000);
    }
}
