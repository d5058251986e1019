pub mod error;

use crate::error::HwError;
use fbc_traits::{Actuator, BoxError, Sensor};
use std::sync::{Arc, Mutex, MutexGuard};

/// Physical parameters of the simulated motor.
#[derive(Debug, Clone, Copy)]
pub struct PlantParams {
    /// Steady-state position change per sense per unit of command.
    pub gain: f32,
    /// Commands with `|cmd| < deadband` produce no motion.
    pub deadband: i32,
    /// Fraction of the velocity error closed on each sense, in (0, 1].
    pub response: f32,
    /// Commands are clamped to `[-max_output, max_output]`.
    pub max_output: i32,
}

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            gain: 0.05,
            deadband: 12,
            response: 0.5,
            max_output: 127,
        }
    }
}

#[derive(Debug, Default)]
struct PlantState {
    position: f32,
    velocity: f32,
    commanded: i32,
    jammed: bool,
    sensor_fault: bool,
}

/// Simulated motor with an integrated encoder.
///
/// The plant is shared between the [`SimActuator`] and [`SimEncoder`] halves so
/// both can be handed to a controller while the test (or CLI) keeps a handle
/// for inspection and fault injection.
#[derive(Debug, Clone)]
pub struct SimulatedMotor {
    params: PlantParams,
    state: Arc<Mutex<PlantState>>,
}

impl Default for SimulatedMotor {
    fn default() -> Self {
        Self::new(PlantParams::default())
    }
}

impl SimulatedMotor {
    pub fn new(params: PlantParams) -> Self {
        Self {
            params,
            state: Arc::new(Mutex::new(PlantState::default())),
        }
    }

    /// Hand out the drive and sense halves of the plant.
    pub fn split(&self) -> (SimActuator, SimEncoder) {
        (
            SimActuator {
                params: self.params,
                state: self.state.clone(),
            },
            SimEncoder {
                params: self.params,
                state: self.state.clone(),
            },
        )
    }

    /// Mechanically block the output shaft (commands keep arriving, nothing moves).
    pub fn set_jammed(&self, jammed: bool) {
        if let Ok(mut s) = self.state.lock() {
            s.jammed = jammed;
            if jammed {
                s.velocity = 0.0;
            }
        }
    }

    /// Make every subsequent sense fail with [`HwError::Timeout`].
    pub fn set_sensor_fault(&self, fault: bool) {
        if let Ok(mut s) = self.state.lock() {
            s.sensor_fault = fault;
        }
    }

    /// Current shaft position rounded to encoder ticks.
    pub fn position(&self) -> i32 {
        self.state
            .lock()
            .map(|s| s.position.round() as i32)
            .unwrap_or(0)
    }

    /// Last command seen by the actuator half (after clamping).
    pub fn commanded(&self) -> i32 {
        self.state.lock().map(|s| s.commanded).unwrap_or(0)
    }
}

fn lock(state: &Mutex<PlantState>) -> Result<MutexGuard<'_, PlantState>, HwError> {
    state
        .lock()
        .map_err(|_| HwError::Fault("plant state poisoned".into()))
}

/// Drive half of [`SimulatedMotor`].
#[derive(Debug)]
pub struct SimActuator {
    params: PlantParams,
    state: Arc<Mutex<PlantState>>,
}

impl Actuator for SimActuator {
    fn drive(&mut self, output: i32) -> Result<(), BoxError> {
        let max = self.params.max_output.max(0);
        let mut s = lock(&self.state)?;
        s.commanded = output.clamp(-max, max);
        tracing::trace!(output, commanded = s.commanded, "sim drive");
        Ok(())
    }
}

/// Sense half of [`SimulatedMotor`]. Each read advances the plant one step.
#[derive(Debug)]
pub struct SimEncoder {
    params: PlantParams,
    state: Arc<Mutex<PlantState>>,
}

impl Sensor for SimEncoder {
    fn sense(&mut self) -> Result<i32, BoxError> {
        let mut s = lock(&self.state)?;
        if s.sensor_fault {
            return Err(Box::new(HwError::Timeout));
        }
        let target = if s.jammed || s.commanded.abs() < self.params.deadband {
            0.0
        } else {
            s.commanded as f32 * self.params.gain
        };
        let response = self.params.response.clamp(f32::EPSILON, 1.0);
        s.velocity += (target - s.velocity) * response;
        s.position += s.velocity;
        Ok(s.position.round() as i32)
    }

    fn reset(&mut self) -> Result<(), BoxError> {
        let mut s = lock(&self.state)?;
        s.position = 0.0;
        tracing::debug!("sim encoder zeroed");
        Ok(())
    }
}
