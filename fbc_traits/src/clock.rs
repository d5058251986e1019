use std::thread;
use std::time::{Duration, Instant};

/// Monotonic clock abstraction for control and timing across the stack.
///
/// - now(): returns a monotonic Instant
/// - sleep(): sleeps for the provided duration (implementations may simulate)
/// - delay_until(): fixed-rate pacing on top of sleep()
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Milliseconds elapsed since `epoch`, saturating at 0 on underflow.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        dur.as_millis().min(u128::from(u64::MAX)) as u64
    }

    /// Advance `wake` by `period` and sleep until that instant.
    ///
    /// The schedule is anchored on `wake`, not on the time of the call, so a
    /// loop paced with this keeps a fixed rate even when its body runs long.
    /// When the new wake time is already in the past no sleep happens.
    fn delay_until(&self, wake: &mut Instant, period: Duration) {
        *wake += period;
        let now = self.now();
        if *wake > now {
            self.sleep(*wake - now);
        }
    }
}

/// Default, real-time monotonic clock backed by std::time::Instant.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

#[cfg(any(test, feature = "test-clock"))]
pub mod test_clock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Deterministic test clock whose time can be advanced manually.
    ///
    /// now() = origin + offset
    /// sleep(d) advances internal time by d without actually sleeping.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        offset: Arc<Mutex<Duration>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset: Arc::new(Mutex::new(Duration::ZERO)),
            }
        }

        /// Advance the clock by the given duration.
        pub fn advance(&self, d: Duration) {
            if let Ok(mut off) = self.offset.lock() {
                *off = off.saturating_add(d);
            }
        }

        /// Time elapsed since the clock was created.
        pub fn elapsed(&self) -> Duration {
            self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO)
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.origin + self.elapsed()
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_clock::TestClock;
    use super::*;

    #[test]
    fn delay_until_keeps_fixed_rate() {
        let clock = TestClock::new();
        let mut wake = clock.now();
        let start = wake;

        // Body overruns by 3 ms; the next wake still lands on the 10 ms grid.
        clock.advance(Duration::from_millis(3));
        clock.delay_until(&mut wake, Duration::from_millis(10));
        assert_eq!(clock.now() - start, Duration::from_millis(10));
        assert_eq!(wake - start, Duration::from_millis(10));
    }

    #[test]
    fn delay_until_does_not_sleep_when_behind() {
        let clock = TestClock::new();
        let mut wake = clock.now();
        let start = wake;

        clock.advance(Duration::from_millis(25));
        clock.delay_until(&mut wake, Duration::from_millis(10));
        assert_eq!(wake - start, Duration::from_millis(10));
        assert_eq!(clock.elapsed(), Duration::from_millis(25));
    }

    #[test]
    fn ms_since_saturates() {
        let clock = TestClock::new();
        let epoch = clock.now();
        clock.advance(Duration::from_millis(1500));
        assert_eq!(clock.ms_since(epoch), 1500);
    }
}
