use fbc_core::error::BuildError;
use fbc_core::mocks::{FailingSensor, RecordingActuator, SeqSensor};
use fbc_core::{DynController, proportional};
use rstest::rstest;
use std::time::Duration;

fn downcast_build(err: &eyre::Report) -> Option<&BuildError> {
    err.downcast_ref::<BuildError>()
}

#[rstest]
fn builder_missing_actuator_yields_typed_build_error() {
    let err = DynController::builder()
        .with_sensor(SeqSensor::constant(0))
        .with_strategy(proportional(1))
        .try_build()
        .expect_err("should fail with MissingActuator");
    match downcast_build(&err) {
        Some(BuildError::MissingActuator) => {}
        other => panic!("expected MissingActuator, got: {other:?}"),
    }
}

#[rstest]
fn builder_missing_sensor_yields_typed_build_error() {
    let err = DynController::builder()
        .with_actuator(RecordingActuator::new())
        .with_strategy(proportional(1))
        .try_build()
        .expect_err("should fail with MissingSensor");
    assert!(matches!(downcast_build(&err), Some(BuildError::MissingSensor)));
}

#[rstest]
fn builder_missing_strategy_yields_typed_build_error() {
    let err = DynController::builder()
        .with_actuator(RecordingActuator::new())
        .with_sensor(SeqSensor::constant(0))
        .try_build()
        .expect_err("should fail with MissingStrategy");
    assert!(matches!(downcast_build(&err), Some(BuildError::MissingStrategy)));
}

#[rstest]
#[case(5, 10, Duration::from_millis(10), "neg_deadband must be <= 0")]
#[case(-5, -1, Duration::from_millis(10), "pos_deadband must be >= 0")]
#[case(-5, 5, Duration::ZERO, "tick must be > 0")]
fn builder_rejects_invalid_constants(
    #[case] neg: i32,
    #[case] pos: i32,
    #[case] tick: Duration,
    #[case] needle: &str,
) {
    let err = DynController::builder()
        .with_actuator(RecordingActuator::new())
        .with_sensor(SeqSensor::constant(0))
        .with_strategy(proportional(1))
        .with_deadband(neg, pos)
        .with_tick(tick)
        .build()
        .expect_err("invalid constants");
    match downcast_build(&err) {
        Some(BuildError::InvalidConfig(msg)) => assert_eq!(*msg, needle),
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}

#[test]
fn build_runs_initial_reset() {
    let sensor = SeqSensor::constant(7);
    let ctl = fbc_core::build_controller(
        RecordingActuator::new(),
        sensor,
        proportional(1),
        None,
        fbc_core::ControllerCfg::default(),
        None,
    )
    .expect("build");
    let (_, sensor) = ctl.into_parts();
    assert_eq!(sensor.resets(), 1);
}

#[test]
fn failing_sensor_reset_fails_the_build() {
    let err = DynController::builder()
        .with_actuator(RecordingActuator::new())
        .with_sensor(FailingSensor("bus off"))
        .with_strategy(proportional(1))
        .build()
        .expect_err("reset should fail");
    assert!(format!("{err:#}").contains("reset sense"), "{err:#}");
}

#[test]
fn stall_detection_toggles() {
    let with = DynController::builder()
        .with_actuator(RecordingActuator::new())
        .with_sensor(SeqSensor::constant(0))
        .with_strategy(proportional(1))
        .build()
        .expect("build");
    assert!(with.has_stall_detector());

    let without = DynController::builder()
        .with_actuator(RecordingActuator::new())
        .with_sensor(SeqSensor::constant(0))
        .with_strategy(proportional(1))
        .without_stall_detection()
        .build()
        .expect("build");
    assert!(!without.has_stall_detector());
}
