//! Modified PID with integral halving on zero crossings and a goal feed-forward term.

use super::{ComputeStrategy, ControllerView, sgn, to_output};

#[derive(Debug, Clone, Default)]
pub struct PidMod {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Feed-forward gain applied to the goal.
    pub kf: f64,
    integral: i64,
    prev_error: i32,
}

impl PidMod {
    pub fn new(kp: f64, ki: f64, kd: f64, kf: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            kf,
            integral: 0,
            prev_error: 0,
        }
    }

    pub fn integral(&self) -> i64 {
        self.integral
    }
}

impl ComputeStrategy for PidMod {
    fn compute(&mut self, view: &ControllerView, error: i32) -> i32 {
        // A zero crossing means we overshot; bleed off half the wind-up
        // instead of dumping it.
        if sgn(error) != sgn(self.prev_error) {
            self.integral /= 2;
        } else {
            self.integral = self.integral.saturating_add(i64::from(error));
        }

        let dt_ms = view.ms_since_prev();
        let derivative = if dt_ms == 0 {
            0.0
        } else {
            (f64::from(error) - f64::from(self.prev_error)) / dt_ms as f64
        };
        self.prev_error = error;

        to_output(
            self.kp * f64::from(error)
                + self.ki * self.integral as f64
                + self.kd * derivative
                + self.kf * f64::from(view.goal),
        )
    }

    fn reset(&mut self) {
        self.integral = 0;
        self.prev_error = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::super::view_at;
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn proportional_only() {
        let t0 = Instant::now();
        let mut p = PidMod::new(2.0, 0.0, 0.0, 0.0);
        assert_eq!(p.compute(&view_at(100, t0, t0), 50), 100);
        assert_eq!(p.compute(&view_at(100, t0, t0), -3), -6);
    }

    #[test]
    fn integral_halves_on_sign_change() {
        let t0 = Instant::now();
        let mut p = PidMod::new(0.0, 1.0, 0.0, 0.0);
        // First positive error after reset counts as a sign change from 0.
        p.compute(&view_at(0, t0, t0), 10);
        assert_eq!(p.integral(), 0);
        p.compute(&view_at(0, t0, t0), 10);
        p.compute(&view_at(0, t0, t0), 10);
        assert_eq!(p.integral(), 20);
        p.compute(&view_at(0, t0, t0), -4);
        assert_eq!(p.integral(), 10);
    }

    #[test]
    fn halving_an_odd_integral_truncates_toward_zero() {
        let t0 = Instant::now();
        let mut p = PidMod::new(0.0, 2.0, 0.0, 0.0);
        for e in [5, 5, 5, 5] {
            p.compute(&view_at(0, t0, t0), e);
        }
        assert_eq!(p.integral(), 15);
        assert_eq!(p.compute(&view_at(0, t0, t0), -1), 14);
        assert_eq!(p.integral(), 7);

        let mut n = PidMod::new(0.0, 1.0, 0.0, 0.0);
        for e in [-3, -3, -3, -3] {
            n.compute(&view_at(0, t0, t0), e);
        }
        assert_eq!(n.integral(), -9);
        n.compute(&view_at(0, t0, t0), 2);
        assert_eq!(n.integral(), -4);
    }

    #[test]
    fn derivative_uses_elapsed_ms_and_survives_zero_dt() {
        let t0 = Instant::now();
        let mut p = PidMod::new(0.0, 0.0, 10.0, 0.0);
        assert_eq!(p.compute(&view_at(0, t0, t0), 40), 0);
        let later = t0 + Duration::from_millis(20);
        // (20 - 40) / 20ms * 10
        assert_eq!(p.compute(&view_at(0, later, t0), 20), -10);
    }

    #[test]
    fn feed_forward_scales_goal_and_reset_clears_state() {
        let t0 = Instant::now();
        let mut p = PidMod::new(0.0, 1.0, 0.0, 0.5);
        assert_eq!(p.compute(&view_at(80, t0, t0), 0), 40);
        p.compute(&view_at(80, t0, t0), 5);
        p.compute(&view_at(80, t0, t0), 5);
        assert!(p.integral() > 0);
        p.reset();
        assert_eq!(p.integral(), 0);
    }
}
