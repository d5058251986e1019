#![no_main]
use fbc_core::mocks::{RecordingActuator, SeqSensor};
use fbc_core::{ControllerCfg, DynController};
use libfuzzer_sys::fuzz_target;

// Any TOML text: parsing and validation may fail but never panic. Configs
// that validate must build a controller that survives a burst of ticks
// against arbitrary sensor readings derived from the input bytes.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(cfg) = fbc_config::load_toml(text) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }

    let readings: Vec<i32> = data
        .chunks(4)
        .map(|c| {
            let mut b = [0u8; 4];
            b[..c.len()].copy_from_slice(c);
            i32::from_le_bytes(b)
        })
        .take(64)
        .collect();

    let Ok(mut ctl) = DynController::builder()
        .with_actuator(RecordingActuator::new())
        .with_sensor(SeqSensor::new(readings))
        .with_boxed_strategy((&cfg.strategy).into())
        .with_config(ControllerCfg::from(&cfg))
        .build()
    else {
        return;
    };
    ctl.set_goal(i32::MAX);
    for _ in 0..64 {
        let _ = ctl.run_continuous();
    }
    ctl.set_goal(i32::MIN);
    for _ in 0..64 {
        let _ = ctl.run_continuous();
    }
});
