//! Background periodic execution.
//!
//! `Controller::run_parallel` moves the controller onto a dedicated thread
//! that ticks `run_continuous` at the fixed tick interval until cancelled.
//! The thread is the only writer of the controller: goal changes and resets
//! arrive as `Command`s over a crossbeam channel, drained at each tick
//! boundary, and telemetry is published through atomics.
//!
//! Safety: each `ParallelRunner` owns exactly one thread, which is stopped
//! and joined when the runner is dropped.

use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicU8, AtomicU64, Ordering};
use std::thread::JoinHandle;

use fbc_traits::{Actuator, Sensor};

use crate::core::Controller;
use crate::error::{FbcError, Result};
use crate::status::Confidence;

/// Messages accepted by the runner thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetGoal(i32),
    Reset,
    Stop,
}

#[derive(Debug, Default)]
struct Telemetry {
    status: AtomicU8,
    goal: AtomicI32,
    last_output: AtomicI32,
    ticks: AtomicU64,
    failures: AtomicU64,
}

impl Telemetry {
    fn publish<A: Actuator, S: Sensor>(&self, ctl: &Controller<A, S>) {
        self.status.store(ctl.last_status().to_u8(), Ordering::Relaxed);
        self.goal.store(ctl.goal(), Ordering::Relaxed);
        self.last_output.store(ctl.last_output(), Ordering::Relaxed);
        self.ticks.store(ctl.ticks(), Ordering::Relaxed);
    }
}

/// Cloneable handle for changing the goal of a running background controller.
#[derive(Debug, Clone)]
pub struct GoalHandle {
    tx: xch::Sender<Command>,
}

impl GoalHandle {
    /// Queue a new goal. Returns `false` when the runner no longer exists.
    pub fn set_goal(&self, goal: i32) -> bool {
        self.tx.send(Command::SetGoal(goal)).is_ok()
    }

    /// Queue a controller reset. Returns `false` when the runner no longer exists.
    pub fn reset(&self) -> bool {
        self.tx.send(Command::Reset).is_ok()
    }
}

/// Handle to a controller ticking on a background thread.
pub struct ParallelRunner<A: Actuator, S: Sensor> {
    tx: xch::Sender<Command>,
    telemetry: Arc<Telemetry>,
    join_handle: Option<JoinHandle<Controller<A, S>>>,
}

impl<A, S> Controller<A, S>
where
    A: Actuator + Send + 'static,
    S: Sensor + Send + 'static,
{
    /// Hand the controller to a background thread that ticks it forever.
    ///
    /// A failing tick is logged and the loop carries on. The thread only
    /// exits on `ParallelRunner::stop`, on drop, or when every sender of
    /// the command channel is gone.
    pub fn run_parallel(self) -> Result<ParallelRunner<A, S>> {
        let (tx, rx) = xch::unbounded::<Command>();
        let telemetry = Arc::new(Telemetry::default());
        telemetry.publish(&self);
        let tel = telemetry.clone();

        let mut ctl = self;
        let join_handle = std::thread::Builder::new()
            .name("fbc-runner".into())
            .spawn(move || {
                let clock = ctl.clock.clone();
                let tick = ctl.tick;
                let mut wake = clock.now();
                tracing::info!(goal = ctl.goal(), "background runner started");

                'run: loop {
                    loop {
                        match rx.try_recv() {
                            Ok(Command::SetGoal(g)) => ctl.set_goal(g),
                            Ok(Command::Reset) => {
                                if let Err(e) = ctl.reset() {
                                    tracing::warn!(error = %e, "reset failed in background runner");
                                }
                            }
                            Ok(Command::Stop) | Err(xch::TryRecvError::Disconnected) => {
                                break 'run;
                            }
                            Err(xch::TryRecvError::Empty) => break,
                        }
                    }

                    if let Err(e) = ctl.run_continuous() {
                        tel.failures.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(error = %e, "background tick failed");
                    }
                    tel.publish(&ctl);
                    clock.delay_until(&mut wake, tick);
                }

                if let Err(e) = ctl.stop_actuator() {
                    tracing::warn!(error = %e, "failed to zero actuator on runner exit");
                }
                tracing::debug!(ticks = ctl.ticks(), "background runner exiting cleanly");
                ctl
            })
            .map_err(|e| eyre::Report::new(FbcError::State(format!("spawn runner: {e}"))))?;

        Ok(ParallelRunner {
            tx,
            telemetry,
            join_handle: Some(join_handle),
        })
    }
}

impl<A: Actuator, S: Sensor> ParallelRunner<A, S> {
    /// Queue a new goal. Returns `false` when the runner thread has exited.
    pub fn set_goal(&self, goal: i32) -> bool {
        self.tx.send(Command::SetGoal(goal)).is_ok()
    }

    /// Queue a controller reset. Returns `false` when the runner thread has exited.
    pub fn reset(&self) -> bool {
        self.tx.send(Command::Reset).is_ok()
    }

    pub fn goal_handle(&self) -> GoalHandle {
        GoalHandle {
            tx: self.tx.clone(),
        }
    }

    /// Status published by the most recent tick.
    pub fn status(&self) -> Confidence {
        Confidence::from_u8(self.telemetry.status.load(Ordering::Relaxed))
    }

    pub fn goal(&self) -> i32 {
        self.telemetry.goal.load(Ordering::Relaxed)
    }

    pub fn last_output(&self) -> i32 {
        self.telemetry.last_output.load(Ordering::Relaxed)
    }

    pub fn ticks(&self) -> u64 {
        self.telemetry.ticks.load(Ordering::Relaxed)
    }

    /// Ticks that returned an error (logged and skipped).
    pub fn failures(&self) -> u64 {
        self.telemetry.failures.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.join_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the background loop and take the controller back.
    ///
    /// The runner observes the request at its next tick boundary, so this
    /// blocks for at most about one tick.
    pub fn stop(mut self) -> Result<Controller<A, S>> {
        let _ = self.tx.send(Command::Stop);
        let handle = self
            .join_handle
            .take()
            .ok_or_else(|| eyre::Report::new(FbcError::State("runner already joined".into())))?;
        handle
            .join()
            .map_err(|_| eyre::Report::new(FbcError::State("runner thread panicked".into())))
    }
}

impl<A: Actuator, S: Sensor> Drop for ParallelRunner<A, S> {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Stop);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(_) => tracing::trace!("runner thread joined"),
                Err(e) => tracing::warn!(?e, "runner thread panicked during shutdown"),
            }
        }
    }
}
