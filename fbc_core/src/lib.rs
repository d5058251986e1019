#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Closed-loop feedback controller core (hardware-agnostic).
//!
//! All hardware interactions go through `fbc_traits::Actuator` and
//! `fbc_traits::Sensor`; time comes from `fbc_traits::Clock`.
//!
//! ## Architecture
//!
//! - **Controller**: per-tick primitive, confidence counter, deadband clamp (`core`)
//! - **Strategies**: pluggable error-to-output transforms (`strategy`)
//! - **Stall detection**: default heuristic and trait seam (`stall`)
//! - **Run modes**: blocking completion (`runner`) and background thread (`parallel`)
//! - **Construction**: type-state builder and `build_controller` (`builder`)

pub mod builder;
pub mod config;
pub mod conversions;
pub mod core;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod parallel;
pub mod runner;
pub mod stall;
pub mod status;
pub mod strategy;
pub mod util;

pub use builder::{
    ControllerBuilder, DynController, DynParallelRunner, Missing, Set, build_controller,
};
pub use config::{ControllerCfg, Deadband};
pub use crate::core::Controller;
pub use error::{BuildError, FbcError, Report, Result};
pub use parallel::{Command, GoalHandle, ParallelRunner};
pub use runner::RunSummary;
pub use stall::{DefaultStallDetector, StallDetector, StallFn, StallProbe};
pub use status::Confidence;
pub use strategy::{
    Clegg, ComputeStrategy, ControllerView, FnStrategy, Hysteresis, PidMod, proportional,
};
