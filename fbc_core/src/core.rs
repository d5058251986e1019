//! The per-tick control primitive (`Controller`).
//!
//! One tick reads the sensor, asks the compute strategy for a raw output,
//! clamps it into the non-blocking deadband and updates the consecutive
//! on-target counter. `run_continuous` adds the actuator drive and the
//! confidence / stall evaluation on top.

use std::sync::Arc;
use std::time::{Duration, Instant};

use eyre::WrapErr;
use fbc_traits::clock::Clock;
use fbc_traits::{Actuator, Sensor};

use crate::config::{ControllerCfg, Deadband};
use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::stall::{StallDetector, StallProbe};
use crate::status::Confidence;
use crate::strategy::{ComputeStrategy, ControllerView};

/// Closed-loop controller for one actuator/sensor pair.
pub struct Controller<A: Actuator, S: Sensor> {
    pub(crate) actuator: A,
    pub(crate) sensor: S,
    pub(crate) strategy: Box<dyn ComputeStrategy + Send>,
    pub(crate) stall_detector: Option<Box<dyn StallDetector + Send>>,
    pub(crate) deadband: Deadband,
    pub(crate) tolerance: u32,
    pub(crate) acceptable_confidence: u32,
    pub(crate) tick: Duration,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,

    pub(crate) goal: i32,
    pub(crate) confidence: u32,
    pub(crate) prev_execution: Instant,
    pub(crate) last_output: i32,
    pub(crate) last_error: i32,
    pub(crate) last_sensed: i32,
    pub(crate) last_status: Confidence,
    pub(crate) ticks: u64,
}

impl<A: Actuator, S: Sensor> core::fmt::Debug for Controller<A, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("goal", &self.goal)
            .field("confidence", &self.confidence)
            .field("last_output", &self.last_output)
            .field("last_error", &self.last_error)
            .field("deadband", &self.deadband)
            .field("stall_detect", &self.stall_detector.is_some())
            .finish()
    }
}

impl<A: Actuator, S: Sensor> Controller<A, S> {
    /// Bind capabilities and constants. Callers go through the builder or
    /// `build_controller`, which validate first and then `reset`.
    pub(crate) fn new(
        actuator: A,
        sensor: S,
        strategy: Box<dyn ComputeStrategy + Send>,
        stall_detector: Option<Box<dyn StallDetector + Send>>,
        cfg: &ControllerCfg,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let now = clock.now();
        Self {
            actuator,
            sensor,
            strategy,
            stall_detector,
            deadband: cfg.deadband,
            tolerance: cfg.tolerance,
            acceptable_confidence: cfg.confidence,
            tick: cfg.tick,
            clock,
            goal: 0,
            confidence: 0,
            prev_execution: now,
            last_output: 0,
            last_error: 0,
            last_sensed: 0,
            last_status: Confidence::NotYet,
            ticks: 0,
        }
    }

    pub fn goal(&self) -> i32 {
        self.goal
    }

    /// Consecutive on-target ticks so far.
    pub fn confidence(&self) -> u32 {
        self.confidence
    }

    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    pub fn acceptable_confidence(&self) -> u32 {
        self.acceptable_confidence
    }

    pub fn deadband(&self) -> Deadband {
        self.deadband
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Last clamped output produced by `generate_output`.
    pub fn last_output(&self) -> i32 {
        self.last_output
    }

    pub fn last_error(&self) -> i32 {
        self.last_error
    }

    pub fn last_sensed(&self) -> i32 {
        self.last_sensed
    }

    /// Result of the most recent `run_continuous`.
    pub fn last_status(&self) -> Confidence {
        self.last_status
    }

    /// Number of `run_continuous` ticks since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn prev_execution(&self) -> Instant {
        self.prev_execution
    }

    pub fn has_stall_detector(&self) -> bool {
        self.stall_detector.is_some()
    }

    /// Clear confidence, zero the sensor, clear strategy and stall history,
    /// and return the goal to 0.
    ///
    /// Every step runs even if the sensor reset fails; that failure is
    /// reported afterwards.
    pub fn reset(&mut self) -> Result<()> {
        self.confidence = 0;
        let sensor_reset = self.sensor.reset();
        self.strategy.reset();
        if let Some(d) = self.stall_detector.as_mut() {
            d.reset();
        }
        self.goal = 0;
        self.last_status = Confidence::NotYet;
        tracing::debug!("controller reset");

        sensor_reset
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("reset sense")
    }

    /// Change the target. Re-setting the current goal is a no-op.
    ///
    /// Confidence is kept across goal changes; a new goal that is off target
    /// clears it on the next tick anyway.
    pub fn set_goal(&mut self, goal: i32) {
        if goal == self.goal {
            return;
        }
        tracing::debug!(from = self.goal, to = goal, "goal changed");
        self.goal = goal;
        self.prev_execution = self.clock.now();
    }

    fn sense(&mut self) -> Result<i32> {
        let v = self
            .sensor
            .sense()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("sense")?;
        self.last_sensed = v;
        Ok(v)
    }

    fn drive(&mut self, output: i32) -> Result<()> {
        self.actuator
            .drive(output)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("drive")
    }

    /// Compute the clamped output for this tick without driving it.
    pub fn generate_output(&mut self) -> Result<i32> {
        let sensed = self.sense()?;
        let error = self.goal.saturating_sub(sensed);
        let now = self.clock.now();

        let view = ControllerView {
            goal: self.goal,
            now,
            prev_execution: self.prev_execution,
            tolerance: self.tolerance,
            acceptable_confidence: self.acceptable_confidence,
            confidence: self.confidence,
        };
        let raw = self.strategy.compute(&view, error);
        let output = self.deadband.clamp(raw);

        if error.unsigned_abs() < self.tolerance {
            self.confidence = self.confidence.saturating_add(1);
        } else {
            self.confidence = 0;
        }

        self.prev_execution = now;
        self.last_output = output;
        self.last_error = error;
        tracing::trace!(
            sensed,
            error,
            raw,
            output,
            confidence = self.confidence,
            "tick"
        );
        Ok(output)
    }

    /// Report whether the goal has been held long enough, or the actuator
    /// has stalled. A bound stall detector is consulted on every call and
    /// its verdict wins.
    pub fn is_confident(&mut self) -> Result<Confidence> {
        let mut status = if self.confidence >= self.acceptable_confidence {
            Confidence::Confident
        } else {
            Confidence::NotYet
        };

        if self.stall_detector.is_some() {
            let sensed = self.sense()?;
            let probe = StallProbe {
                sensed,
                last_output: self.last_output,
                deadband: self.deadband,
                tolerance: self.tolerance,
                acceptable_confidence: self.acceptable_confidence,
            };
            let stalled = self
                .stall_detector
                .as_mut()
                .is_some_and(|d| d.is_stalled(&probe));
            if stalled {
                tracing::warn!(
                    goal = self.goal,
                    sensed,
                    output = self.last_output,
                    "stall detected"
                );
                status = Confidence::Stalled;
            }
        }
        Ok(status)
    }

    /// One full tick: generate, drive, then evaluate confidence.
    pub fn run_continuous(&mut self) -> Result<Confidence> {
        let output = self.generate_output()?;
        self.drive(output)?;
        let status = self.is_confident()?;
        self.ticks = self.ticks.saturating_add(1);
        self.last_status = status;
        Ok(status)
    }

    /// Command zero output (best-effort at the end of a run).
    pub fn stop_actuator(&mut self) -> Result<()> {
        self.drive(0)
    }

    /// Give the capabilities back, dropping the controller state.
    pub fn into_parts(self) -> (A, S) {
        (self.actuator, self.sensor)
    }
}
