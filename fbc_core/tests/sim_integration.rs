//! End-to-end runs against the simulated motor plant.

use std::sync::Arc;
use std::time::Duration;

use fbc_core::{Confidence, ControllerCfg, Deadband, DynController, PidMod, build_controller};
use fbc_hardware::SimulatedMotor;
use fbc_traits::clock::test_clock::TestClock;

#[test]
fn proportional_pid_settles_on_goal() {
    let motor = SimulatedMotor::default();
    let (act, enc) = motor.split();
    let clock = TestClock::new();
    let cfg = ControllerCfg {
        deadband: Deadband::new(-15, 15),
        tolerance: 5,
        confidence: 5,
        tick: Duration::from_millis(10),
        stall_detect: false,
    };
    let mut ctl = build_controller(
        act,
        enc,
        PidMod::new(0.5, 0.0, 0.0, 0.0),
        None,
        cfg,
        Some(Arc::new(clock.clone())),
    )
    .unwrap();
    ctl.set_goal(100);
    assert!(ctl.run_completion(Duration::from_secs(10)).unwrap());
    assert_eq!(ctl.last_status(), Confidence::Confident);
    assert!((motor.position() - 100).abs() < 5, "{}", motor.position());
}

#[test]
fn jammed_plant_is_reported_as_stalled() {
    let motor = SimulatedMotor::default();
    motor.set_jammed(true);
    let (act, enc) = motor.split();
    let mut ctl = DynController::builder()
        .with_actuator(act)
        .with_sensor(enc)
        .with_strategy(PidMod::new(0.5, 0.0, 0.0, 0.0))
        .with_deadband(-15, 15)
        .with_tolerance(5)
        .with_confidence(3)
        .with_tick(Duration::from_millis(10))
        .with_clock(Arc::new(TestClock::new()))
        .build()
        .unwrap();
    ctl.set_goal(100);
    assert!(ctl.run_completion(Duration::from_secs(10)).unwrap());
    assert_eq!(ctl.last_status(), Confidence::Stalled);
    assert_eq!(motor.position(), 0);
    assert_eq!(motor.commanded(), 50);
}

#[test]
fn config_file_drives_a_run() {
    let cfg = fbc_config::load_toml(
        r#"
[controller]
neg_deadband = -15
pos_deadband = 15
tolerance = 5
confidence = 5
stall_detect = false

[strategy]
kind = "pidmod"
kp = 0.5

[runner]
tick_ms = 10
"#,
    )
    .unwrap();
    cfg.validate().unwrap();
    let motor = SimulatedMotor::default();
    let (act, enc) = motor.split();
    let mut ctl = DynController::builder()
        .with_actuator(act)
        .with_sensor(enc)
        .with_boxed_strategy((&cfg.strategy).into())
        .with_config(ControllerCfg::from(&cfg))
        .with_clock(Arc::new(TestClock::new()))
        .build()
        .unwrap();
    ctl.set_goal(-60);
    assert!(ctl.run_completion(Duration::from_secs(10)).unwrap());
    assert!((motor.position() + 60).abs() < 5, "{}", motor.position());
}
