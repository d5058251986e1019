//! Clegg integrator: a pure integrator that dumps its state on zero crossings.

use super::{ComputeStrategy, ControllerView, sgn, to_output};

#[derive(Debug, Clone, Default)]
pub struct Clegg {
    pub gain: f64,
    /// Output magnitude applied on the first tick after a goal change.
    pub initial_output: i32,
    integral: i64,
    prev_error: i32,
    prev_goal: i32,
}

impl Clegg {
    pub fn new(gain: f64, initial_output: i32) -> Self {
        Self {
            gain,
            initial_output,
            ..Self::default()
        }
    }
}

impl ComputeStrategy for Clegg {
    fn compute(&mut self, view: &ControllerView, error: i32) -> i32 {
        self.integral = self.integral.saturating_add(i64::from(error));

        let out = if view.goal != self.prev_goal {
            self.integral = 0;
            sgn(view.goal).saturating_mul(self.initial_output)
        } else if sgn(error) != sgn(self.prev_error) {
            self.integral = 0;
            0
        } else {
            to_output(self.gain * self.integral as f64)
        };

        self.prev_goal = view.goal;
        self.prev_error = error;
        out
    }

    fn reset(&mut self) {
        self.integral = 0;
        self.prev_error = 0;
        self.prev_goal = 0;
    }
}
