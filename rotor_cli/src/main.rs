//! `rotor`: drive the rotation estimator from a simulated rotor, a recorded trigger log
//! or real Hall switches.

mod cli;
mod error_fmt;
mod replay;
#[cfg(all(feature = "hardware", target_os = "linux"))]
mod rt;
#[cfg(all(feature = "hardware", target_os = "linux"))]
mod run;
mod simulate;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use rotor_config::Config;
use rotor_core::RotationEngine;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    if !cli.json {
        let _ = color_eyre::install();
    }
    let cfg = load_config(cli.config.as_deref())?;
    init_tracing(cli.json, &cli.log_level, &cfg.logging)?;

    // Ctrl-C flips the flag; long-running commands poll it
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    match cli.cmd {
        Commands::Simulate {
            duration_ms,
            rps,
            miss_every,
            sample_hz,
            print_every_ms,
            emit_log,
        } => {
            let params = simulate::SimParams {
                duration_ms,
                rps,
                miss_every,
                sample_hz,
                print_every_ms,
                emit_log,
            };
            let summary = simulate::run_simulate(&cfg, &params, cli.json)?;
            let mut out = std::io::stdout().lock();
            if cli.json {
                writeln!(out, "{}", serde_json::json!({ "summary": summary }))?;
            } else {
                writeln!(out, "Simulation complete: {}", summary.status)?;
                writeln!(
                    out,
                    "Frames: {} (reliable {}), phase error max {:.4} / mean {:.4} turns",
                    summary.frames,
                    summary.reliable_frames,
                    summary.max_abs_error,
                    summary.mean_abs_error
                )?;
            }
        }
        Commands::Replay { log, switch_count } => {
            let summary = replay::run_replay(&cfg, &log, switch_count, cli.json)?;
            let mut out = std::io::stdout().lock();
            if cli.json {
                writeln!(out, "{}", serde_json::json!({ "summary": summary }))?;
            } else {
                writeln!(
                    out,
                    "Replay complete: {} checkpoints ({} reliable), {}",
                    summary.checkpoints, summary.reliable_checkpoints, summary.status
                )?;
            }
        }
        Commands::Run {
            duration_ms,
            report_ms,
            rt,
            rt_prio,
            rt_lock,
        } => {
            #[cfg(all(feature = "hardware", target_os = "linux"))]
            {
                let params = run::RunParams {
                    duration_ms,
                    report_ms,
                    rt,
                    rt_prio,
                    rt_lock,
                };
                let diag = run::run_hardware(&cfg, &params, cli.json, shutdown)?;
                let mut out = std::io::stdout().lock();
                if cli.json {
                    writeln!(out, "{}", serde_json::json!({ "summary": diag }))?;
                } else {
                    writeln!(out, "Run stopped: {diag}")?;
                }
            }
            #[cfg(not(all(feature = "hardware", target_os = "linux")))]
            {
                let _ = (duration_ms, report_ms, rt, rt_prio, rt_lock, &shutdown);
                eyre::bail!("the run command requires the hardware feature on Linux");
            }
        }
        Commands::SelfCheck => {
            let switch_count = replay::replay_switch_count(&cfg, None);
            let engine = RotationEngine::builder()
                .with_switch_count(switch_count)
                .with_config((&cfg.engine).into())
                .build()?;
            let c = engine.config();
            let mut out = std::io::stdout().lock();
            if cli.json {
                let obj = serde_json::json!({
                    "ok": true,
                    "switch_count": switch_count,
                    "history_size": c.history_size,
                    "min_valid_samples": c.min_valid_samples,
                    "pause_threshold_us": c.pause_threshold_us,
                    "override": cfg.fixed.map(|o| o.rotations_per_second),
                });
                writeln!(out, "{obj}")?;
            } else {
                writeln!(
                    out,
                    "OK: {} switches, history {}, trust after {}, pause after {} ms",
                    switch_count,
                    c.history_size,
                    c.min_valid_samples,
                    cfg.engine.pause_ms
                )?;
            }
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> eyre::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = rotor_config::load_toml(&text)
        .wrap_err_with(|| format!("invalid configuration in {}", path.display()))?;
    cfg.validate()
        .wrap_err_with(|| format!("invalid configuration in {}", path.display()))?;
    Ok(cfg)
}

/// Console logs go to stderr (stdout carries command output); an optional JSON file
/// sink follows `[logging]`.
fn init_tracing(json: bool, level: &str, logging: &rotor_config::Logging) -> eyre::Result<()> {
    use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| eyre::eyre!("invalid log level {level:?}: {e}"))?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    }

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_filter = EnvFilter::try_new(logging.level.as_deref().unwrap_or("info"))
            .map_err(|e| eyre::eyre!("invalid logging.level: {e}"))?;
        layers.push(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| eyre::eyre!("init tracing: {e}"))?;
    Ok(())
}
