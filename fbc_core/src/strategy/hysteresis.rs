//! Bang-bang output with separate engage and release thresholds.

use super::{ComputeStrategy, ControllerView, sgn};

#[derive(Debug, Clone, Default)]
pub struct Hysteresis {
    /// Output magnitude while engaged.
    pub output: i32,
    /// Engage when `|error| > enter`.
    pub enter: u32,
    /// Release when `|error| <= exit`. Expected `exit <= enter`.
    pub exit: u32,
    engaged: bool,
}

impl Hysteresis {
    pub fn new(output: i32, enter: u32, exit: u32) -> Self {
        Self {
            output,
            enter,
            exit,
            engaged: false,
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }
}

impl ComputeStrategy for Hysteresis {
    fn compute(&mut self, _view: &ControllerView, error: i32) -> i32 {
        let mag = error.unsigned_abs();
        if self.engaged {
            if mag <= self.exit {
                self.engaged = false;
            }
        } else if mag > self.enter {
            self.engaged = true;
        }

        if self.engaged {
            sgn(error).saturating_mul(self.output)
        } else {
            0
        }
    }

    fn reset(&mut self) {
        self.engaged = false;
    }
}

#[cfg(test)]
mod tests {
    use super::super::view_at;
    use super::*;
    use rstest::rstest;
    use std::time::Instant;

    #[rstest]
    #[case(&[50, 20, 9, 5, 3], &[80, 80, 80, 0, 0])]
    #[case(&[5, 9, 11, 6, 4], &[0, 0, 80, 80, 0])]
    #[case(&[-30, -10, 12], &[-80, -80, 80])]
    fn band_transitions(#[case] errors: &[i32], #[case] expected: &[i32]) {
        let t0 = Instant::now();
        let v = view_at(0, t0, t0);
        let mut h = Hysteresis::new(80, 10, 5);
        let got: Vec<i32> = errors.iter().map(|&e| h.compute(&v, e)).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn reset_releases() {
        let t0 = Instant::now();
        let mut h = Hysteresis::new(40, 10, 2);
        h.compute(&view_at(0, t0, t0), 100);
        assert!(h.is_engaged());
        h.reset();
        assert!(!h.is_engaged());
    }
}
