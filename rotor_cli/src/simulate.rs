//! Simulated rotor driven through the engine on a manual clock.
//!
//! The rotor and the engine share one `ManualClock`; every frame the engine ticks once,
//! which polls the simulated switches, and the estimate is compared with the true phase.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rotor_config::{Config, SimulationCfg};
use rotor_core::util::{MILLIS_PER_SEC, period_us};
use rotor_core::{EngineState, RotationEngine};
use rotor_hardware::{RotorProfile, SimulatedRotor};
use rotor_traits::{ManualClock, Switch};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct SimParams {
    pub duration_ms: u64,
    pub rps: Option<f64>,
    pub miss_every: Option<u32>,
    pub sample_hz: u32,
    pub print_every_ms: u64,
    pub emit_log: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct PhaseSample {
    t_us: u64,
    phase: Option<f64>,
    true_phase: f64,
    error: Option<f64>,
    state: EngineState,
}

#[derive(Debug, Serialize)]
pub struct SimSummary {
    pub frames: u64,
    pub reliable_frames: u64,
    pub max_abs_error: f64,
    pub mean_abs_error: f64,
    pub steps_per_second: Option<f64>,
    pub rotations_per_second: Option<f64>,
    pub true_rotations_per_second: f64,
    pub status: String,
}

/// Rotor profile from `[simulation]`, with CLI overrides applied.
pub fn rotor_profile(sim: &SimulationCfg, rps: Option<f64>, miss_every: Option<u32>) -> RotorProfile {
    RotorProfile {
        rotations_per_second: rps.unwrap_or(sim.rotations_per_second),
        switch_count: sim.switch_count,
        pulse_width: sim.pulse_width,
        miss_every: miss_every.or(sim.miss_every),
        jitter_us: sim.jitter_us,
        seed: sim.seed,
    }
}

/// Shortest distance between two phases on the unit circle.
fn phase_error(estimate: f64, truth: f64) -> f64 {
    let d = (estimate - truth).rem_euclid(1.0);
    d.min(1.0 - d)
}

fn write_trigger_log(path: &Path, rows: &[(u64, usize)]) -> eyre::Result<()> {
    let mut w = csv::Writer::from_path(path)
        .map_err(|e| eyre::eyre!("create trigger log {:?}: {}", path, e))?;
    w.write_record(["time_us", "ordinal"])?;
    for (t, o) in rows {
        w.write_record([t.to_string(), o.to_string()])?;
    }
    w.flush()?;
    Ok(())
}

pub fn run_simulate(cfg: &Config, p: &SimParams, json: bool) -> eyre::Result<SimSummary> {
    let profile = rotor_profile(&cfg.simulation, p.rps, p.miss_every);
    let clock = ManualClock::new();
    let rotor = SimulatedRotor::new(profile, Arc::new(clock.clone()))?;
    let duration_us = p.duration_ms.saturating_mul(1000);

    if let Some(path) = &p.emit_log {
        let rows = rotor.trigger_log(duration_us);
        write_trigger_log(path, &rows)?;
        tracing::info!(rows = rows.len(), path = %path.display(), "trigger log written");
    }

    let switches: Vec<Box<dyn Switch + Send>> = rotor
        .switches()
        .into_iter()
        .map(|s| Box::new(s) as Box<dyn Switch + Send>)
        .collect();
    let mut engine = RotationEngine::builder()
        .with_boxed_switches(switches)
        .with_config((&cfg.engine).into())
        .build()?;
    if let Some(o) = cfg.fixed {
        engine.set_override(o.rotations_per_second);
    }

    tracing::info!(
        rps = profile.rotations_per_second,
        switches = profile.switch_count,
        miss_every = ?profile.miss_every,
        sample_hz = p.sample_hz,
        "simulation start"
    );

    let frame = Duration::from_micros(period_us(p.sample_hz));
    let print_every_us = p.print_every_ms.saturating_mul(MILLIS_PER_SEC);
    let mut next_print = 0u64;
    let mut frames = 0u64;
    let mut reliable_frames = 0u64;
    let mut max_abs_error = 0.0f64;
    let mut sum_abs_error = 0.0f64;
    let mut out = std::io::stdout().lock();

    loop {
        let now = clock.micros();
        if now >= duration_us {
            break;
        }
        engine.tick(now);
        let phase = engine.estimated_phase(now);
        let truth = rotor.phase_at(now);
        let error = phase.map(|est| phase_error(est, truth));
        if engine.is_reliable()
            && let Some(e) = error
        {
            reliable_frames += 1;
            sum_abs_error += e;
            max_abs_error = max_abs_error.max(e);
        }

        if print_every_us > 0 && now >= next_print {
            let sample = PhaseSample {
                t_us: now,
                phase,
                true_phase: truth,
                error,
                state: engine.state(),
            };
            if json {
                writeln!(out, "{}", serde_json::to_string(&sample)?)?;
            } else {
                let shown = phase.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"));
                writeln!(
                    out,
                    "t={:>8}us phase={:>6} true={:.4} state={:?}",
                    sample.t_us, shown, sample.true_phase, sample.state
                )?;
            }
            next_print = next_print.saturating_add(print_every_us);
        }

        frames += 1;
        clock.advance(frame);
    }

    let diag = engine.diagnostics();
    let summary = SimSummary {
        frames,
        reliable_frames,
        max_abs_error,
        mean_abs_error: if reliable_frames > 0 {
            sum_abs_error / reliable_frames as f64
        } else {
            0.0
        },
        steps_per_second: diag.steps_per_second,
        rotations_per_second: diag.rotations_per_second,
        true_rotations_per_second: profile.rotations_per_second,
        status: diag.to_string(),
    };
    tracing::info!(
        frames,
        reliable_frames,
        max_abs_error = summary.max_abs_error,
        "simulation complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_error_wraps_around() {
        assert!((phase_error(0.99, 0.01) - 0.02).abs() < 1e-12);
        assert!((phase_error(0.25, 0.75) - 0.5).abs() < 1e-12);
        assert_eq!(phase_error(0.3, 0.3), 0.0);
    }

    #[test]
    fn cli_overrides_take_precedence() {
        let sim = SimulationCfg::default();
        let p = rotor_profile(&sim, Some(4.0), Some(5));
        assert_eq!(p.rotations_per_second, 4.0);
        assert_eq!(p.miss_every, Some(5));
        assert_eq!(p.switch_count, sim.switch_count);
        let p = rotor_profile(&sim, None, None);
        assert_eq!(p.rotations_per_second, sim.rotations_per_second);
    }

    #[test]
    fn steady_rotor_is_tracked_closely() {
        let cfg = Config::default();
        let params = SimParams {
            duration_ms: 1000,
            rps: Some(10.0),
            miss_every: Some(4),
            sample_hz: 2000,
            print_every_ms: 0,
            emit_log: None,
        };
        let s = run_simulate(&cfg, &params, false).unwrap();
        assert_eq!(s.frames, 2000);
        assert!(s.reliable_frames > 1500, "{s:?}");
        assert!(s.max_abs_error < 0.01, "{s:?}");
        let rps = s.rotations_per_second.unwrap();
        assert!((rps - 10.0).abs() < 0.1, "{s:?}");
    }
}
