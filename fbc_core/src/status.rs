//! Completion status reported after each control tick.

/// Terminal-state oracle consumed by both run modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confidence {
    /// Still converging.
    #[default]
    NotYet,
    /// Error has stayed inside tolerance for the configured number of ticks.
    Confident,
    /// The stall detector reported the actuator is not moving.
    Stalled,
}

impl Confidence {
    /// Either confident or stalled; a completion run stops here.
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Confidence::NotYet)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::NotYet => "not_yet",
            Confidence::Confident => "confident",
            Confidence::Stalled => "stalled",
        }
    }

    #[inline]
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Confidence::NotYet => 0,
            Confidence::Confident => 1,
            Confidence::Stalled => 2,
        }
    }

    #[inline]
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => Confidence::Confident,
            2 => Confidence::Stalled,
            _ => Confidence::NotYet,
        }
    }
}

impl core::fmt::Display for Confidence {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
