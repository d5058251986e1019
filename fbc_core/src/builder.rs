//! Type-state builder for `Controller` and generic `build_controller` constructor.
//!
//! The builder enforces at compile time that an actuator, a sensor and a
//! compute strategy are provided before `build()` is available. `try_build()`
//! is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use fbc_traits::clock::{Clock, MonotonicClock};
use fbc_traits::{Actuator, Sensor};

use crate::config::{ControllerCfg, Deadband};
use crate::core::Controller;
use crate::error::{BuildError, Result};
use crate::parallel::ParallelRunner;
use crate::stall::{DefaultStallDetector, StallDetector};
use crate::strategy::ComputeStrategy;

/// Controller over boxed capabilities, as produced by `ControllerBuilder`.
pub type DynController = Controller<Box<dyn Actuator + Send>, Box<dyn Sensor + Send>>;

/// Background runner owning a [`DynController`].
pub type DynParallelRunner = ParallelRunner<Box<dyn Actuator + Send>, Box<dyn Sensor + Send>>;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `DynController`. All values are validated on `build()`.
pub struct ControllerBuilder<A, S, C> {
    actuator: Option<Box<dyn Actuator + Send>>,
    sensor: Option<Box<dyn Sensor + Send>>,
    strategy: Option<Box<dyn ComputeStrategy + Send>>,
    stall_detector: Option<Box<dyn StallDetector + Send>>,
    cfg: ControllerCfg,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    _a: PhantomData<A>,
    _s: PhantomData<S>,
    _c: PhantomData<C>,
}

impl Default for ControllerBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            actuator: None,
            sensor: None,
            strategy: None,
            stall_detector: None,
            cfg: ControllerCfg::default(),
            clock: None,
            _a: PhantomData,
            _s: PhantomData,
            _c: PhantomData,
        }
    }
}

impl DynController {
    /// Start building a controller.
    pub fn builder() -> ControllerBuilder<Missing, Missing, Missing> {
        ControllerBuilder::default()
    }
}

/// Validate constants, bind everything and run the initial `reset`.
///
/// Single source of truth for construction, shared by
/// `ControllerBuilder::try_build()` and `build_controller()`.
fn validate_and_build<A: Actuator, S: Sensor>(
    actuator: A,
    sensor: S,
    strategy: Box<dyn ComputeStrategy + Send>,
    stall_detector: Option<Box<dyn StallDetector + Send>>,
    cfg: &ControllerCfg,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
) -> Result<Controller<A, S>> {
    if cfg.deadband.neg > 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "neg_deadband must be <= 0",
        )));
    }
    if cfg.deadband.pos < 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "pos_deadband must be >= 0",
        )));
    }
    if cfg.tick.is_zero() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "tick must be > 0",
        )));
    }

    let stall_detector = stall_detector.or_else(|| {
        cfg.stall_detect
            .then(|| Box::new(DefaultStallDetector::new()) as Box<dyn StallDetector + Send>)
    });
    let clock = clock.unwrap_or_else(|| Arc::new(MonotonicClock::new()));

    let mut controller = Controller::new(actuator, sensor, strategy, stall_detector, cfg, clock);
    controller.reset()?;
    tracing::debug!(
        neg_deadband = cfg.deadband.neg,
        pos_deadband = cfg.deadband.pos,
        tolerance = cfg.tolerance,
        confidence = cfg.confidence,
        tick_ms = crate::util::as_millis_u64(cfg.tick),
        stall_detect = controller.has_stall_detector(),
        "controller initialised"
    );
    Ok(controller)
}

/// Construct a statically-dispatched controller.
///
/// `stall_detector` overrides the default detector; with `None` the default
/// one is bound when `cfg.stall_detect` is set. `clock` defaults to
/// `MonotonicClock`.
pub fn build_controller<A: Actuator, S: Sensor>(
    actuator: A,
    sensor: S,
    strategy: impl ComputeStrategy + Send + 'static,
    stall_detector: Option<Box<dyn StallDetector + Send>>,
    cfg: ControllerCfg,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
) -> Result<Controller<A, S>> {
    validate_and_build(
        actuator,
        sensor,
        Box::new(strategy),
        stall_detector,
        &cfg,
        clock,
    )
}

impl<A, S, C> ControllerBuilder<A, S, C> {
    pub fn with_actuator(
        self,
        actuator: impl Actuator + Send + 'static,
    ) -> ControllerBuilder<Set, S, C> {
        ControllerBuilder {
            actuator: Some(Box::new(actuator)),
            sensor: self.sensor,
            strategy: self.strategy,
            stall_detector: self.stall_detector,
            cfg: self.cfg,
            clock: self.clock,
            _a: PhantomData,
            _s: PhantomData,
            _c: PhantomData,
        }
    }

    pub fn with_sensor(self, sensor: impl Sensor + Send + 'static) -> ControllerBuilder<A, Set, C> {
        ControllerBuilder {
            actuator: self.actuator,
            sensor: Some(Box::new(sensor)),
            strategy: self.strategy,
            stall_detector: self.stall_detector,
            cfg: self.cfg,
            clock: self.clock,
            _a: PhantomData,
            _s: PhantomData,
            _c: PhantomData,
        }
    }

    pub fn with_strategy(
        self,
        strategy: impl ComputeStrategy + Send + 'static,
    ) -> ControllerBuilder<A, S, Set> {
        self.with_boxed_strategy(Box::new(strategy))
    }

    /// Same as `with_strategy` for a strategy chosen at runtime (e.g. from config).
    pub fn with_boxed_strategy(
        self,
        strategy: Box<dyn ComputeStrategy + Send>,
    ) -> ControllerBuilder<A, S, Set> {
        ControllerBuilder {
            actuator: self.actuator,
            sensor: self.sensor,
            strategy: Some(strategy),
            stall_detector: self.stall_detector,
            cfg: self.cfg,
            clock: self.clock,
            _a: PhantomData,
            _s: PhantomData,
            _c: PhantomData,
        }
    }

    /// Replace the default stall detector with a custom one.
    pub fn with_stall_detector(mut self, detector: impl StallDetector + Send + 'static) -> Self {
        self.stall_detector = Some(Box::new(detector));
        self
    }

    /// Run without any stall detection.
    pub fn without_stall_detection(mut self) -> Self {
        self.stall_detector = None;
        self.cfg.stall_detect = false;
        self
    }

    pub fn with_deadband(mut self, neg: i32, pos: i32) -> Self {
        self.cfg.deadband = Deadband::new(neg, pos);
        self
    }

    pub fn with_tolerance(mut self, tolerance: u32) -> Self {
        self.cfg.tolerance = tolerance;
        self
    }

    pub fn with_confidence(mut self, confidence: u32) -> Self {
        self.cfg.confidence = confidence;
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.cfg.tick = tick;
        self
    }

    /// Take all constants from a runtime config at once.
    pub fn with_config(mut self, cfg: ControllerCfg) -> Self {
        self.cfg = cfg;
        self
    }

    /// Inject a custom clock (tests use a deterministic one).
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build with runtime checks for missing capabilities.
    pub fn try_build(self) -> Result<DynController> {
        let actuator = self
            .actuator
            .ok_or_else(|| eyre::Report::new(BuildError::MissingActuator))?;
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        let strategy = self
            .strategy
            .ok_or_else(|| eyre::Report::new(BuildError::MissingStrategy))?;
        validate_and_build(
            actuator,
            sensor,
            strategy,
            self.stall_detector,
            &self.cfg,
            self.clock,
        )
    }
}

impl ControllerBuilder<Set, Set, Set> {
    /// Build once actuator, sensor and strategy are all set.
    pub fn build(self) -> Result<DynController> {
        self.try_build()
    }
}
