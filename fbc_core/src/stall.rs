//! Stall detection: "is the actuator being commanded but not moving?"

use crate::config::Deadband;

/// Everything a detector may look at on one tick.
#[derive(Debug, Clone, Copy)]
pub struct StallProbe {
    /// Position sensed for this check.
    pub sensed: i32,
    /// Output most recently produced by `generate_output`.
    pub last_output: i32,
    pub deadband: Deadband,
    pub tolerance: u32,
    pub acceptable_confidence: u32,
}

pub trait StallDetector {
    fn is_stalled(&mut self, probe: &StallProbe) -> bool;

    /// Forget accumulated history. Called from `Controller::reset`.
    fn reset(&mut self) {}
}

impl<T: StallDetector + ?Sized> StallDetector for Box<T> {
    fn is_stalled(&mut self, probe: &StallProbe) -> bool {
        (**self).is_stalled(probe)
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}

/// Counts consecutive checks in which the position barely moved.
///
/// Outputs sitting exactly on a deadband edge are the minimum the actuator
/// can be asked for, so those checks never count toward a stall.
#[derive(Debug, Clone, Default)]
pub struct DefaultStallDetector {
    prev: i32,
    count: u32,
}

impl DefaultStallDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest position change that counts as movement.
    #[inline]
    pub fn min_stuck(tolerance: u32) -> u32 {
        (tolerance >> 3).max(1)
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl StallDetector for DefaultStallDetector {
    fn is_stalled(&mut self, probe: &StallProbe) -> bool {
        if probe.deadband.is_edge(probe.last_output) {
            self.count = 0;
            return false;
        }

        if probe.sensed.abs_diff(self.prev) < Self::min_stuck(probe.tolerance) {
            self.count = self.count.saturating_add(1);
        } else {
            self.count = 0;
        }
        self.prev = probe.sensed;

        if self.count > probe.acceptable_confidence {
            self.count = 0;
            self.prev = 0;
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.prev = 0;
        self.count = 0;
    }
}

/// Closure adapter for custom stall heuristics.
pub struct StallFn<F>(pub F);

impl<F> StallDetector for StallFn<F>
where
    F: FnMut(&StallProbe) -> bool,
{
    fn is_stalled(&mut self, probe: &StallProbe) -> bool {
        (self.0)(probe)
    }
}

impl<F> core::fmt::Debug for StallFn<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("StallFn")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(sensed: i32, last_output: i32) -> StallProbe {
        StallProbe {
            sensed,
            last_output,
            deadband: Deadband::new(-20, 20),
            tolerance: 16,
            acceptable_confidence: 2,
        }
    }

    #[test]
    fn min_stuck_floor_is_one() {
        assert_eq!(DefaultStallDetector::min_stuck(0), 1);
        assert_eq!(DefaultStallDetector::min_stuck(7), 1);
        assert_eq!(DefaultStallDetector::min_stuck(16), 2);
        assert_eq!(DefaultStallDetector::min_stuck(80), 10);
    }

    #[test]
    fn stalls_after_threshold_plus_one_static_checks() {
        let mut d = DefaultStallDetector::new();
        // prev starts at 0, so a static 0 reading counts right away.
        assert!(!d.is_stalled(&probe(0, 60)));
        assert!(!d.is_stalled(&probe(1, 60)));
        assert!(d.is_stalled(&probe(1, 60)));
        // History is cleared after reporting.
        assert_eq!(d.count(), 0);
    }

    #[test]
    fn movement_resets_the_count() {
        let mut d = DefaultStallDetector::new();
        d.is_stalled(&probe(0, 60));
        d.is_stalled(&probe(0, 60));
        assert!(!d.is_stalled(&probe(5, 60)));
        assert_eq!(d.count(), 0);
    }

    #[test]
    fn deadband_edge_output_resets_without_touching_prev() {
        let mut d = DefaultStallDetector::new();
        d.is_stalled(&probe(100, 60));
        d.is_stalled(&probe(100, 60));
        assert!(!d.is_stalled(&probe(500, 20)));
        assert_eq!(d.count(), 0);
        // prev is still 100: a reading of 100 counts as not moving.
        d.is_stalled(&probe(100, -60));
        assert_eq!(d.count(), 1);
    }

    #[test]
    fn boxed_closure_detector() {
        let mut d: Box<dyn StallDetector + Send> =
            Box::new(StallFn(|p: &StallProbe| p.sensed == 7));
        assert!(d.is_stalled(&probe(7, 0)));
        assert!(!d.is_stalled(&probe(8, 0)));
    }
}
