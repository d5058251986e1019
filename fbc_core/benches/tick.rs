use criterion::{Criterion, black_box, criterion_group, criterion_main};
use fbc_core::mocks::SeqSensor;
use fbc_core::{Clegg, DynController, PidMod};
use fbc_traits::ActuatorFn;

fn bench_tick(c: &mut Criterion) {
    let mut pid = DynController::builder()
        .with_actuator(ActuatorFn(|_out: i32| {}))
        .with_sensor(SeqSensor::constant(40))
        .with_strategy(PidMod::new(0.8, 0.01, 2.0, 0.0))
        .with_deadband(-12, 12)
        .with_confidence(u32::MAX)
        .build()
        .unwrap_or_else(|e| panic!("build: {e}"));
    pid.set_goal(1000);
    c.bench_function("run_continuous_pidmod", |b| {
        b.iter(|| black_box(pid.run_continuous().ok()))
    });

    let mut clegg = DynController::builder()
        .with_actuator(ActuatorFn(|_out: i32| {}))
        .with_sensor(SeqSensor::constant(40))
        .with_strategy(Clegg::new(0.02, 60))
        .without_stall_detection()
        .build()
        .unwrap_or_else(|e| panic!("build: {e}"));
    clegg.set_goal(1000);
    c.bench_function("generate_output_clegg", |b| {
        b.iter(|| black_box(clegg.generate_output().ok()))
    });
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
