//! `From` implementations bridging `fbc_config` types to `fbc_core` types.

use crate::config::{ControllerCfg, Deadband};
use crate::strategy::{Clegg, ComputeStrategy, Hysteresis, PidMod};
use crate::util::tick_duration;

// ── ControllerCfg ────────────────────────────────────────────────────────────

impl From<&fbc_config::Config> for ControllerCfg {
    fn from(c: &fbc_config::Config) -> Self {
        Self {
            deadband: Deadband::new(c.controller.neg_deadband, c.controller.pos_deadband),
            tolerance: c.controller.tolerance,
            confidence: c.controller.confidence,
            tick: tick_duration(c.runner.tick_ms),
            stall_detect: c.controller.stall_detect,
        }
    }
}

// ── Strategies ───────────────────────────────────────────────────────────────

impl From<&fbc_config::PidModCfg> for PidMod {
    fn from(c: &fbc_config::PidModCfg) -> Self {
        PidMod::new(c.kp, c.ki, c.kd, c.kf)
    }
}

impl From<&fbc_config::CleggCfg> for Clegg {
    fn from(c: &fbc_config::CleggCfg) -> Self {
        Clegg::new(c.gain, c.initial_output)
    }
}

impl From<&fbc_config::HysteresisCfg> for Hysteresis {
    fn from(c: &fbc_config::HysteresisCfg) -> Self {
        Hysteresis::new(c.output, c.enter, c.exit)
    }
}

impl From<&fbc_config::StrategyCfg> for Box<dyn ComputeStrategy + Send> {
    fn from(c: &fbc_config::StrategyCfg) -> Self {
        match c {
            fbc_config::StrategyCfg::PidMod(p) => Box::new(PidMod::from(p)),
            fbc_config::StrategyCfg::Clegg(p) => Box::new(Clegg::from(p)),
            fbc_config::StrategyCfg::Hysteresis(p) => Box::new(Hysteresis::from(p)),
        }
    }
}
