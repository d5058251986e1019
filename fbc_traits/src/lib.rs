//! Hardware boundary traits for the feedback controller runtime.
//!
//! The controller only ever talks to an actuator through [`Actuator`] and to a
//! position sensor through [`Sensor`]. Errors cross the boundary as boxed
//! trait objects so drivers can use whatever error type suits them.

pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Error type used at the hardware boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Something that can be commanded with a signed output magnitude.
pub trait Actuator {
    fn drive(&mut self, output: i32) -> Result<(), BoxError>;
}

/// A signed position source (encoder, potentiometer, ...).
pub trait Sensor {
    fn sense(&mut self) -> Result<i32, BoxError>;

    /// Zero the accumulated position. Sensors without a notion of zeroing
    /// keep the default no-op.
    fn reset(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn drive(&mut self, output: i32) -> Result<(), BoxError> {
        (**self).drive(output)
    }
}

impl<T: Sensor + ?Sized> Sensor for Box<T> {
    fn sense(&mut self) -> Result<i32, BoxError> {
        (**self).sense()
    }
    fn reset(&mut self) -> Result<(), BoxError> {
        (**self).reset()
    }
}

/// Adapter turning an infallible closure into an [`Actuator`].
pub struct ActuatorFn<F>(pub F);

impl<F: FnMut(i32)> Actuator for ActuatorFn<F> {
    fn drive(&mut self, output: i32) -> Result<(), BoxError> {
        (self.0)(output);
        Ok(())
    }
}

/// Adapter turning an infallible closure into a [`Sensor`] with no reset.
pub struct SensorFn<F>(pub F);

impl<F: FnMut() -> i32> Sensor for SensorFn<F> {
    fn sense(&mut self) -> Result<i32, BoxError> {
        Ok((self.0)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_adapters_forward_values() {
        let mut last = 0;
        {
            let mut act = ActuatorFn(|v| last = v);
            act.drive(42).unwrap();
        }
        assert_eq!(last, 42);

        let mut n = 0;
        let mut sensor = SensorFn(|| {
            n += 3;
            n
        });
        assert_eq!(sensor.sense().unwrap(), 3);
        assert_eq!(sensor.sense().unwrap(), 6);
        sensor.reset().unwrap();
    }

    #[test]
    fn boxed_capabilities_delegate() {
        let mut sensor: Box<dyn Sensor> = Box::new(SensorFn(|| -7));
        assert_eq!(sensor.sense().unwrap(), -7);
    }
}
