use fbc_core::mocks::{RecordingActuator, SeqSensor};
use fbc_core::{Deadband, DynController, FnStrategy, ControllerView};
use proptest::prelude::*;

proptest! {
    #[test]
    fn clamp_never_lands_inside_the_band(
        neg in -500i32..=0,
        pos in 0i32..=500,
        raw in any::<i32>(),
    ) {
        let out = Deadband::new(neg, pos).clamp(raw);
        prop_assert!(out == 0 || out >= pos || out <= neg);
        prop_assert_eq!(out.signum(), raw.signum());
        if raw >= pos || raw <= neg {
            prop_assert_eq!(out, raw);
        }
    }

    #[test]
    fn confidence_is_the_trailing_on_target_streak(
        readings in proptest::collection::vec(-40i32..40, 1..120),
        tolerance in 1u32..30,
    ) {
        let mut ctl = DynController::builder()
            .with_actuator(RecordingActuator::new())
            .with_sensor(SeqSensor::new(readings.clone()))
            .with_strategy(FnStrategy(|_: &ControllerView, e: i32| e))
            .with_tolerance(tolerance)
            .with_confidence(u32::MAX)
            .without_stall_detection()
            .build()
            .unwrap();
        let mut streak = 0u32;
        for r in readings {
            ctl.run_continuous().unwrap();
            if r.unsigned_abs() < tolerance {
                streak += 1;
            } else {
                streak = 0;
            }
            prop_assert_eq!(ctl.confidence(), streak);
        }
    }
}
