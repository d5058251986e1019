//! Runtime configuration structs for the controller.

use std::time::Duration;

/// Non-blocking output band around zero.
///
/// Outputs strictly between `neg` and `pos` (other than zero) are pushed out
/// to the nearest edge. A zero edge disables clamping on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deadband {
    pub neg: i32,
    pub pos: i32,
}

impl Deadband {
    pub const fn new(neg: i32, pos: i32) -> Self {
        Self { neg, pos }
    }

    #[inline]
    pub fn clamp(&self, raw: i32) -> i32 {
        if raw > 0 && raw < self.pos {
            self.pos
        } else if raw < 0 && raw > self.neg {
            self.neg
        } else {
            raw
        }
    }

    /// True when `output` sits exactly on either edge.
    #[inline]
    pub fn is_edge(&self, output: i32) -> bool {
        output == self.neg || output == self.pos
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.neg <= 0 && self.pos >= 0
    }
}

#[derive(Debug, Clone)]
pub struct ControllerCfg {
    pub deadband: Deadband,
    /// `|error| < tolerance` counts as on target for one tick.
    pub tolerance: u32,
    /// Consecutive on-target ticks required to report confident.
    pub confidence: u32,
    /// Fixed cadence of both run modes.
    pub tick: Duration,
    /// Bind a `DefaultStallDetector` when no custom detector is given.
    pub stall_detect: bool,
}

impl Default for ControllerCfg {
    fn default() -> Self {
        Self {
            deadband: Deadband::default(),
            tolerance: 10,
            confidence: 5,
            tick: Duration::from_millis(crate::util::DEFAULT_TICK_MS),
            stall_detect: true,
        }
    }
}
