//! Test and helper capabilities for fbc_core.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use fbc_traits::{Actuator, BoxError, Sensor};

/// Sensor that replays a fixed sequence of positions, then repeats the last one.
#[derive(Debug, Clone, Default)]
pub struct SeqSensor {
    values: VecDeque<i32>,
    last: i32,
    resets: u32,
}

impl SeqSensor {
    pub fn new(values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            values: values.into_iter().collect(),
            last: 0,
            resets: 0,
        }
    }

    /// Always report the same position.
    pub fn constant(v: i32) -> Self {
        Self {
            values: VecDeque::new(),
            last: v,
            resets: 0,
        }
    }

    pub fn resets(&self) -> u32 {
        self.resets
    }
}

impl Sensor for SeqSensor {
    fn sense(&mut self) -> Result<i32, BoxError> {
        if let Some(v) = self.values.pop_front() {
            self.last = v;
        }
        Ok(self.last)
    }

    fn reset(&mut self) -> Result<(), BoxError> {
        self.resets += 1;
        Ok(())
    }
}

/// Sensor whose reads always fail with the given message.
#[derive(Debug, Clone)]
pub struct FailingSensor(pub &'static str);

impl Sensor for FailingSensor {
    fn sense(&mut self) -> Result<i32, BoxError> {
        Err(Box::new(std::io::Error::other(self.0)))
    }

    fn reset(&mut self) -> Result<(), BoxError> {
        Err(Box::new(std::io::Error::other(self.0)))
    }
}

/// Actuator that records every output it is driven with.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    outputs: Arc<Mutex<Vec<i32>>>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything driven so far (shared across clones).
    pub fn outputs(&self) -> Vec<i32> {
        self.outputs.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<i32> {
        self.outputs.lock().ok().and_then(|v| v.last().copied())
    }
}

impl Actuator for RecordingActuator {
    fn drive(&mut self, output: i32) -> Result<(), BoxError> {
        self.outputs
            .lock()
            .map_err(|_| Box::new(std::io::Error::other("recorder poisoned")) as BoxError)?
            .push(output);
        Ok(())
    }
}
