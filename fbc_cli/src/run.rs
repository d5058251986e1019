//! Run command: config mapping, hardware assembly, and controller execution.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use fbc_core::error::Result as CoreResult;
use fbc_core::{Confidence, ControllerCfg, DynController, DynParallelRunner};
use fbc_hardware::{PlantParams, SimulatedMotor};

use crate::cli::RtLock;
use crate::error_fmt::{Outcome, check_outcome};
use crate::rt::setup_rt_once;

/// Test hook: jam the simulated plant from the start.
const ENV_SIM_JAM: &str = "FBC_TEST_SIM_JAM";
/// Test hook: make every simulated sensor read time out.
const ENV_SIM_FAULT: &str = "FBC_TEST_SIM_FAULT";

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub goal: i32,
    pub timeout_ms: Option<u64>,
    pub tick_ms: Option<u64>,
    pub parallel: bool,
    pub duration_ms: Option<u64>,
    pub rt: bool,
    pub rt_prio: Option<i32>,
    pub rt_lock: RtLock,
}

/// What a finished run looked like, for text or JSON reporting.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub mode: &'static str,
    pub completed: bool,
    pub status: Confidence,
    pub goal: i32,
    pub position: i32,
    pub last_output: i32,
    pub ticks: u64,
    pub elapsed_ms: u64,
    pub strategy: &'static str,
}

impl RunReport {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "mode": self.mode,
            "completed": self.completed,
            "status": self.status.as_str(),
            "goal": self.goal,
            "position": self.position,
            "last_output": self.last_output,
            "ticks": self.ticks,
            "elapsed_ms": self.elapsed_ms,
            "strategy": self.strategy,
        })
    }

    pub fn to_text(&self) -> String {
        format!(
            "{} run {}: status={} goal={} position={} output={} ticks={} elapsed_ms={}",
            self.mode,
            if self.completed { "complete" } else { "timed out" },
            self.status,
            self.goal,
            self.position,
            self.last_output,
            self.ticks,
            self.elapsed_ms,
        )
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| !v.is_empty() && v != "0")
}

pub fn plant_params(sim: &fbc_config::SimCfg) -> PlantParams {
    PlantParams {
        gain: sim.gain,
        deadband: sim.deadband,
        response: sim.response,
        max_output: sim.max_output,
    }
}

/// Build the simulated plant and a boxed controller driving it.
pub fn assemble(
    cfg: &fbc_config::Config,
    tick_ms: Option<u64>,
) -> CoreResult<(SimulatedMotor, DynController)> {
    let motor = SimulatedMotor::new(plant_params(&cfg.sim));
    if env_flag(ENV_SIM_JAM) {
        motor.set_jammed(true);
    }
    if env_flag(ENV_SIM_FAULT) {
        motor.set_sensor_fault(true);
    }
    let (actuator, encoder) = motor.split();

    let mut ccfg = ControllerCfg::from(cfg);
    if let Some(ms) = tick_ms {
        ccfg.tick = fbc_core::util::tick_duration(ms);
    }

    let controller = DynController::builder()
        .with_actuator(actuator)
        .with_sensor(encoder)
        .with_boxed_strategy((&cfg.strategy).into())
        .with_config(ccfg)
        .build()?;
    Ok((motor, controller))
}

pub fn run(
    cfg: &fbc_config::Config,
    args: &RunArgs,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<RunReport> {
    if args.rt {
        setup_rt_once(args.rt_prio, args.rt_lock);
    }

    let (motor, mut ctl) = assemble(cfg, args.tick_ms)?;
    let strategy = cfg.strategy.kind();
    let parallel = args.parallel || cfg.runner.mode == fbc_config::RunMode::Parallel;
    tracing::info!(
        goal = args.goal,
        strategy,
        parallel,
        tick_ms = fbc_core::util::as_millis_u64(ctl.tick()),
        "starting run"
    );

    if parallel {
        let duration_ms = args.duration_ms.unwrap_or(cfg.runner.parallel_ms);
        return run_parallel(ctl, &motor, args.goal, duration_ms, strategy, &shutdown);
    }

    let timeout_ms = args.timeout_ms.unwrap_or(cfg.runner.timeout_ms);
    ctl.set_goal(args.goal);
    let summary = ctl.run_to_summary_until(Duration::from_millis(timeout_ms), &shutdown)?;
    if summary.cancelled {
        tracing::info!("shutdown requested; stopping completion run");
    }
    if let Err(e) = ctl.stop_actuator() {
        tracing::warn!(error = %e, "failed to zero actuator after run");
    }

    let report = RunReport {
        mode: "completion",
        completed: summary.completed,
        status: summary.status,
        goal: args.goal,
        position: motor.position(),
        last_output: summary.last_output,
        ticks: summary.ticks,
        elapsed_ms: summary.elapsed_ms,
        strategy,
    };
    check_outcome(&Outcome {
        completed: report.completed,
        cancelled: summary.cancelled,
        status: report.status,
        parked: false,
        timeout_ms,
        ticks: report.ticks,
        position: report.position,
        output: report.last_output,
    })?;
    Ok(report)
}

/// Hand the controller to a background thread already aimed at `goal`.
pub fn start_background(mut ctl: DynController, goal: i32) -> CoreResult<DynParallelRunner> {
    ctl.set_goal(goal);
    ctl.run_parallel()
}

/// Let the background runner chase `goal` for `duration_ms`, or until Ctrl-C.
fn run_parallel(
    ctl: DynController,
    motor: &SimulatedMotor,
    goal: i32,
    duration_ms: u64,
    strategy: &'static str,
    shutdown: &AtomicBool,
) -> CoreResult<RunReport> {
    let poll = ctl.tick();
    let start = Instant::now();
    let runner = start_background(ctl, goal)?;

    let until = start + Duration::from_millis(duration_ms);
    while Instant::now() < until && !shutdown.load(Ordering::Relaxed) {
        std::thread::sleep(poll.min(until.saturating_duration_since(Instant::now())));
    }
    let cancelled = shutdown.load(Ordering::Relaxed);
    if cancelled {
        tracing::info!("shutdown requested; stopping background runner");
    }

    let failures = runner.failures();
    let ctl = runner.stop()?;
    if failures > 0 {
        tracing::warn!(failures, "background ticks failed during run");
    }
    // A settled actuator holding a zero output reads as stalled.
    let parked = ctl.last_error().unsigned_abs() < ctl.tolerance();
    let status = ctl.last_status();
    let report = RunReport {
        mode: "parallel",
        completed: true,
        status,
        goal,
        position: motor.position(),
        last_output: ctl.last_output(),
        ticks: ctl.ticks(),
        elapsed_ms: fbc_core::util::as_millis_u64(start.elapsed()),
        strategy,
    };
    check_outcome(&Outcome {
        completed: true,
        cancelled,
        status,
        parked,
        timeout_ms: 0,
        ticks: report.ticks,
        position: report.position,
        output: report.last_output,
    })?;
    Ok(report)
}

/// Drive the sim plant briefly and make sure the encoder follows.
pub fn self_check(cfg: &fbc_config::Config) -> CoreResult<i32> {
    let motor = SimulatedMotor::new(plant_params(&cfg.sim));
    let (act, enc) = motor.split();
    let mut ctl = fbc_core::build_controller(
        act,
        enc,
        fbc_core::proportional(1),
        None,
        ControllerCfg {
            stall_detect: false,
            ..ControllerCfg::default()
        },
        None,
    )?;
    ctl.set_goal(cfg.sim.max_output);
    for _ in 0..5 {
        ctl.run_continuous()?;
    }
    ctl.stop_actuator()?;
    let moved = motor.position();
    if moved <= 0 {
        return Err(eyre::eyre!("simulated plant did not move (position {moved})"));
    }
    Ok(moved)
}
