//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "fbc", version, about = "Closed-loop feedback controller runner")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/fbc.toml")]
    pub config: PathBuf,

    /// Log and report as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive the (simulated) actuator to a goal position
    Run {
        /// Target position in sensor units
        #[arg(long, allow_hyphen_values = true)]
        goal: i32,
        /// Completion timeout in ms (0 waits forever); overrides [runner].timeout_ms
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
        /// Control tick in ms; overrides [runner].tick_ms
        #[arg(long, value_name = "MS")]
        tick_ms: Option<u64>,
        /// Run the controller on a background thread instead of blocking
        #[arg(long, action = ArgAction::SetTrue)]
        parallel: bool,
        /// How long a parallel run lasts in ms; overrides [runner].parallel_ms
        #[arg(long, value_name = "MS", requires = "parallel")]
        duration_ms: Option<u64>,
        /// Enable real-time mode (SCHED_FIFO, mlockall)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on Linux.\n\nAttempts SCHED_FIFO priority and locks the process address space into RAM with mlockall. This reduces page faults and jitter on the control tick but may require elevated privileges or ulimits (e.g., memlock). Ignored with a warning on other OSes."
        )]
        rt: bool,
        /// Real-time priority for SCHED_FIFO (1..=max)
        #[arg(long, value_name = "PRIO", requires = "rt")]
        rt_prio: Option<i32>,
        /// Memory locking mode for --rt: none, current, or all
        #[arg(long, value_enum, value_name = "MODE", default_value = "current")]
        rt_lock: RtLock,
    },
    /// Quick health check of the simulated plant
    SelfCheck,
}
