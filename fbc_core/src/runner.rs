//! Blocking run-to-completion driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use fbc_traits::{Actuator, Sensor};

use crate::core::Controller;
use crate::error::Result;
use crate::status::Confidence;
use crate::util::as_millis_u64;

/// Deadline check for `run_completion`.
///
/// The check is made against the scheduled wake time of the tick that just
/// ran, not the instant the tick finished. A zero timeout never expires.
#[inline]
fn within_deadline(start: Instant, timeout: Duration, wake: Instant) -> bool {
    timeout.is_zero() || start.checked_add(timeout).is_none_or(|deadline| deadline >= wake)
}

/// Outcome of a completed blocking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// False when the run stopped because the deadline passed.
    pub completed: bool,
    /// True when the cancel flag ended the run early.
    pub cancelled: bool,
    pub status: Confidence,
    pub ticks: u64,
    pub elapsed_ms: u64,
    pub last_output: i32,
    pub last_error: i32,
}

impl<A: Actuator, S: Sensor> Controller<A, S> {
    /// Tick on the caller's thread until confident, stalled or timed out.
    ///
    /// Ticks are paced with fixed-rate `delay_until` at the controller's tick
    /// interval. Returns `true` when the loop ended inside the deadline and
    /// `false` on timeout. Because the deadline is compared with the wake
    /// time of the last tick, one tick past the nominal deadline can run.
    pub fn run_completion(&mut self, timeout: Duration) -> Result<bool> {
        self.run_completion_until(timeout, &AtomicBool::new(false))
    }

    /// `run_completion` that also stops after any tick where `cancel` is set.
    ///
    /// A cancelled run that ended inside the deadline still returns `true`;
    /// callers that care read `cancel` afterwards.
    pub fn run_completion_until(
        &mut self,
        timeout: Duration,
        cancel: &AtomicBool,
    ) -> Result<bool> {
        let start = self.clock.now();
        let mut wake = start;
        tracing::info!(
            goal = self.goal,
            timeout_ms = as_millis_u64(timeout),
            "run to completion"
        );

        loop {
            let status = self.run_continuous()?;
            if status.is_terminal() || !within_deadline(start, timeout, wake) {
                break;
            }
            if cancel.load(Ordering::Relaxed) {
                tracing::info!(ticks = self.ticks, "run cancelled");
                break;
            }
            self.clock.delay_until(&mut wake, self.tick);
        }

        let completed = within_deadline(start, timeout, wake);
        tracing::info!(
            completed,
            status = %self.last_status,
            ticks = self.ticks,
            "run finished"
        );
        Ok(completed)
    }

    /// `run_completion` plus a snapshot of where the controller ended up.
    pub fn run_to_summary(&mut self, timeout: Duration) -> Result<RunSummary> {
        self.run_to_summary_until(timeout, &AtomicBool::new(false))
    }

    /// `run_completion_until` plus a snapshot of where the controller ended up.
    pub fn run_to_summary_until(
        &mut self,
        timeout: Duration,
        cancel: &AtomicBool,
    ) -> Result<RunSummary> {
        let start = self.clock.now();
        let ticks_before = self.ticks;
        let completed = self.run_completion_until(timeout, cancel)?;
        Ok(RunSummary {
            completed,
            cancelled: cancel.load(Ordering::Relaxed) && !self.last_status.is_terminal(),
            status: self.last_status,
            ticks: self.ticks.saturating_sub(ticks_before),
            elapsed_ms: self.clock.ms_since(start),
            last_output: self.last_output,
            last_error: self.last_error,
        })
    }
}
