//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "rotor", version, about = "Rotation phase estimator for POV displays")]
pub struct Cli {
    /// Path to config TOML (typed). Built-in defaults are used when omitted.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log and print as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

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

impl RtLock {
    #[cfg_attr(not(all(feature = "hardware", target_os = "linux")), allow(dead_code))]
    #[inline]
    pub fn os_default() -> Self {
        #[cfg(target_os = "linux")]
        {
            return RtLock::Current;
        }
        #[allow(unreachable_code)]
        RtLock::None
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Spin a simulated rotor and report the estimated phase against the true one
    Simulate {
        /// Simulated run length in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 2000)]
        duration_ms: u64,
        /// Rotation speed (takes precedence over simulation.rotations_per_second)
        #[arg(long, value_name = "RPS")]
        rps: Option<f64>,
        /// Drop every n-th pass of each switch (takes precedence over config)
        #[arg(long, value_name = "N")]
        miss_every: Option<u32>,
        /// Render loop rate; each frame ticks the engine once
        #[arg(long, value_name = "HZ", default_value_t = 2000)]
        sample_hz: u32,
        /// Print one phase sample every this many milliseconds (0 = summary only)
        #[arg(long, value_name = "MS", default_value_t = 100)]
        print_every_ms: u64,
        /// Also write the generated trigger log (with jitter) as CSV
        #[arg(long, value_name = "FILE")]
        emit_log: Option<PathBuf>,
    },
    /// Feed a recorded trigger log (CSV: time_us,ordinal) through the engine
    Replay {
        /// Trigger log CSV
        #[arg(long, value_name = "FILE")]
        log: PathBuf,
        /// Number of switches; defaults to sensor.pins, then simulation.switch_count
        #[arg(long, value_name = "N")]
        switch_count: Option<usize>,
    },
    /// Read real Hall switches and report diagnostics (requires the hardware feature)
    Run {
        /// Stop after this many milliseconds (runs until Ctrl-C when omitted)
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
        /// Diagnostics report period
        #[arg(long, value_name = "MS", default_value_t = 1000)]
        report_ms: u64,
        /// Enable real-time mode (SCHED_FIFO, mlockall)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on Linux.\n\nAttempts SCHED_FIFO priority and calls mlockall to lock the process address space into RAM. This reduces trigger timestamp jitter but may require elevated privileges or ulimits (e.g., memlock)."
        )]
        rt: bool,
        /// Real-time priority for SCHED_FIFO (1..=max)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// Select memory locking mode for --rt: none, current, or all
        #[arg(long, value_enum, value_name = "MODE")]
        rt_lock: Option<RtLock>,
    },
    /// Validate the config and construct the engine
    SelfCheck,
}
