//! Pluggable error-to-output transforms.
//!
//! A [`ComputeStrategy`] turns the signed error of one tick into a raw output.
//! The controller clamps that output into the deadband afterwards, so
//! strategies never need to know about the actuator's dead zone.

mod clegg;
mod hysteresis;
mod pidmod;

pub use clegg::Clegg;
pub use hysteresis::Hysteresis;
pub use pidmod::PidMod;

use std::time::Instant;

/// Read-only snapshot of the controller handed to a strategy on every tick.
///
/// Tolerance and confidence threshold are copied in, so a strategy can read
/// them but has no way to change them.
#[derive(Debug, Clone, Copy)]
pub struct ControllerView {
    pub goal: i32,
    pub now: Instant,
    /// Last goal change or output generation, whichever came later.
    pub prev_execution: Instant,
    pub tolerance: u32,
    pub acceptable_confidence: u32,
    pub confidence: u32,
}

impl ControllerView {
    /// Milliseconds between the previous execution and this tick.
    pub fn ms_since_prev(&self) -> u64 {
        let dur = self.now.saturating_duration_since(self.prev_execution);
        dur.as_millis().min(u128::from(u64::MAX)) as u64
    }
}

pub trait ComputeStrategy {
    /// Map the current error to a raw (unclamped) output.
    fn compute(&mut self, view: &ControllerView, error: i32) -> i32;

    /// Clear accumulators. Called from `Controller::reset`.
    fn reset(&mut self) {}
}

impl<T: ComputeStrategy + ?Sized> ComputeStrategy for Box<T> {
    fn compute(&mut self, view: &ControllerView, error: i32) -> i32 {
        (**self).compute(view, error)
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}

/// Closure adapter for one-off transforms (tests, quick experiments).
pub struct FnStrategy<F>(pub F);

impl<F> ComputeStrategy for FnStrategy<F>
where
    F: FnMut(&ControllerView, i32) -> i32,
{
    fn compute(&mut self, view: &ControllerView, error: i32) -> i32 {
        (self.0)(view, error)
    }
}

impl<F> core::fmt::Debug for FnStrategy<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("FnStrategy")
    }
}

/// Proportional-only strategy: `output = error * gain`.
pub fn proportional(gain: i32) -> FnStrategy<impl FnMut(&ControllerView, i32) -> i32 + Send> {
    FnStrategy(move |_: &ControllerView, e: i32| e.saturating_mul(gain))
}

#[inline]
pub(crate) fn sgn(x: i32) -> i32 {
    x.signum()
}

/// Float to output conversion used by the gain-based strategies.
///
/// Truncates toward zero and saturates at the `i32` range (`as` semantics).
#[inline]
pub(crate) fn to_output(v: f64) -> i32 {
    v as i32
}

#[cfg(test)]
pub(crate) fn view_at(goal: i32, now: Instant, prev_execution: Instant) -> ControllerView {
    ControllerView {
        goal,
        now,
        prev_execution,
        tolerance: 5,
        acceptable_confidence: 3,
        confidence: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn ms_since_prev_saturates_backwards() {
        let t0 = Instant::now();
        let v = view_at(0, t0, t0 + Duration::from_millis(5));
        assert_eq!(v.ms_since_prev(), 0);
        let v = view_at(0, t0 + Duration::from_millis(40), t0);
        assert_eq!(v.ms_since_prev(), 40);
    }

    #[test]
    fn boxed_and_closure_strategies_delegate() {
        let t0 = Instant::now();
        let mut s: Box<dyn ComputeStrategy + Send> = Box::new(proportional(3));
        assert_eq!(s.compute(&view_at(0, t0, t0), -7), -21);
        s.reset();

        let mut goal_echo = FnStrategy(|v: &ControllerView, _e: i32| v.goal);
        assert_eq!(goal_echo.compute(&view_at(42, t0, t0), 0), 42);
    }
}
