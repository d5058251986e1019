#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the feedback controller runtime.
//!
//! `Config` and its sections are deserialized from TOML and checked with
//! `Config::validate`. Every section except `[strategy]` has defaults, so a
//! minimal file only needs to pick a compute strategy.
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControllerCfg {
    /// Lower deadband edge; must be <= 0. Zero disables clamping below zero.
    pub neg_deadband: i32,
    /// Upper deadband edge; must be >= 0. Zero disables clamping above zero.
    pub pos_deadband: i32,
    /// `|error| < tolerance` counts as on target.
    pub tolerance: u32,
    /// Consecutive on-target ticks required for completion.
    pub confidence: u32,
    /// Bind the default stall detector
    pub stall_detect: bool,
}

impl Default for ControllerCfg {
    fn default() -> Self {
        Self {
            neg_deadband: 0,
            pos_deadband: 0,
            tolerance: 10,
            confidence: 5,
            stall_detect: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PidModCfg {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Feed-forward gain on the goal
    pub kf: f64,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CleggCfg {
    pub gain: f64,
    pub initial_output: i32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HysteresisCfg {
    pub output: i32,
    pub enter: u32,
    pub exit: u32,
}

impl Default for HysteresisCfg {
    fn default() -> Self {
        Self {
            output: 64,
            enter: 20,
            exit: 5,
        }
    }
}

/// Compute strategy selection, tagged by `kind`.
///
/// ```toml
/// [strategy]
/// kind = "pidmod"
/// kp = 0.8
/// ki = 0.01
/// ```
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StrategyCfg {
    PidMod(PidModCfg),
    Clegg(CleggCfg),
    Hysteresis(HysteresisCfg),
}

impl StrategyCfg {
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyCfg::PidMod(_) => "pidmod",
            StrategyCfg::Clegg(_) => "clegg",
            StrategyCfg::Hysteresis(_) => "hysteresis",
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Block until confident, stalled or timed out
    #[default]
    Completion,
    /// Tick on a background thread for `parallel_ms`
    Parallel,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RunnerCfg {
    /// Control tick period (ms)
    pub tick_ms: u64,
    /// Completion timeout (ms); 0 waits forever
    pub timeout_ms: u64,
    pub mode: RunMode,
    /// How long a parallel run lasts before it is stopped (ms)
    pub parallel_ms: u64,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            tick_ms: 20,
            timeout_ms: 0,
            mode: RunMode::Completion,
            parallel_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Simulated motor plant used when no real hardware is attached.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimCfg {
    /// Steady-state position change per sense per unit of command
    pub gain: f32,
    /// Commands below this magnitude do not move the plant
    pub deadband: i32,
    /// Fraction of velocity error closed per step, in (0, 1]
    pub response: f32,
    pub max_output: i32,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            gain: 0.05,
            deadband: 12,
            response: 0.5,
            max_output: 127,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerCfg,
    pub strategy: StrategyCfg,
    #[serde(default)]
    pub runner: RunnerCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub sim: SimCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&s).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

fn finite(v: f64) -> bool {
    v.is_finite()
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Controller
        if self.controller.neg_deadband > 0 {
            eyre::bail!("controller.neg_deadband must be <= 0");
        }
        if self.controller.pos_deadband < 0 {
            eyre::bail!("controller.pos_deadband must be >= 0");
        }
        if self.controller.tolerance == 0 {
            eyre::bail!("controller.tolerance must be > 0");
        }

        // Strategy
        match &self.strategy {
            StrategyCfg::PidMod(p) => {
                if ![p.kp, p.ki, p.kd, p.kf].into_iter().all(finite) {
                    eyre::bail!("strategy gains must be finite");
                }
            }
            StrategyCfg::Clegg(c) => {
                if !finite(c.gain) {
                    eyre::bail!("strategy.gain must be finite");
                }
                if c.initial_output < 0 {
                    eyre::bail!("strategy.initial_output must be >= 0");
                }
            }
            StrategyCfg::Hysteresis(h) => {
                if h.output < 0 {
                    eyre::bail!("strategy.output must be >= 0");
                }
                if h.exit > h.enter {
                    eyre::bail!("strategy.exit must be <= strategy.enter");
                }
            }
        }

        // Runner
        if self.runner.tick_ms == 0 {
            eyre::bail!("runner.tick_ms must be > 0");
        }
        if self.runner.mode == RunMode::Parallel && self.runner.parallel_ms == 0 {
            eyre::bail!("runner.parallel_ms must be > 0 in parallel mode");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref() {
            if !matches!(rot, "never" | "daily" | "hourly") {
                eyre::bail!("logging.rotation must be one of never|daily|hourly");
            }
        }

        // Sim
        if !(self.sim.response > 0.0 && self.sim.response <= 1.0) {
            eyre::bail!("sim.response must be in (0, 1]");
        }
        if !self.sim.gain.is_finite() {
            eyre::bail!("sim.gain must be finite");
        }
        if self.sim.deadband < 0 {
            eyre::bail!("sim.deadband must be >= 0");
        }
        if self.sim.max_output <= 0 {
            eyre::bail!("sim.max_output must be > 0");
        }
        Ok(())
    }
}
