//! Replay a recorded trigger log through the engine.

use std::io::Write;
use std::path::Path;

use rotor_config::Config;
use rotor_core::{RotationEngine, SensorState};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ReplayLine {
    time_us: u64,
    ordinal: usize,
    state: SensorState,
    steps_per_second: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ReplaySummary {
    pub checkpoints: usize,
    pub reliable_checkpoints: usize,
    pub switch_count: usize,
    pub steps_per_second: Option<f64>,
    pub rotations_per_second: Option<f64>,
    pub status: String,
}

/// Switch count for a replay: explicit, else one per configured pin, else the
/// simulation default.
pub fn replay_switch_count(cfg: &Config, explicit: Option<usize>) -> usize {
    explicit
        .or_else(|| (!cfg.sensor.pins.is_empty()).then_some(cfg.sensor.pins.len()))
        .unwrap_or(cfg.simulation.switch_count)
}

fn describe(state: SensorState) -> String {
    match state {
        SensorState::Reliable => "reliable".to_string(),
        SensorState::Paused => "paused".to_string(),
        SensorState::Unreliable(reason) => format!("unreliable: {reason}"),
    }
}

pub fn run_replay(
    cfg: &Config,
    log: &Path,
    switch_count: Option<usize>,
    json: bool,
) -> eyre::Result<ReplaySummary> {
    let rows = rotor_config::load_trigger_log_csv(log)?;
    let switch_count = replay_switch_count(cfg, switch_count);
    let mut engine = RotationEngine::builder()
        .with_switch_count(switch_count)
        .with_config((&cfg.engine).into())
        .build()?;
    if let Some(o) = cfg.fixed {
        engine.set_override(o.rotations_per_second);
    }
    tracing::info!(rows = rows.len(), switch_count, path = %log.display(), "replay start");

    let mut out = std::io::stdout().lock();
    let mut reliable_checkpoints = 0usize;
    for row in &rows {
        engine.tick(row.time_us);
        let state = engine.register_checkpoint(row.time_us, row.ordinal);
        if state == SensorState::Reliable {
            reliable_checkpoints += 1;
        }
        let line = ReplayLine {
            time_us: row.time_us,
            ordinal: row.ordinal,
            state,
            steps_per_second: engine.rotation_rate(),
        };
        if json {
            writeln!(out, "{}", serde_json::to_string(&line)?)?;
        } else {
            let rate = line
                .steps_per_second
                .map_or_else(|| "-".to_string(), |r| format!("{r:.2}"));
            writeln!(
                out,
                "{:>12}us #{} {} rate={}",
                line.time_us,
                line.ordinal,
                describe(state),
                rate
            )?;
        }
    }

    let diag = engine.diagnostics();
    Ok(ReplaySummary {
        checkpoints: rows.len(),
        reliable_checkpoints,
        switch_count,
        steps_per_second: diag.steps_per_second,
        rotations_per_second: diag.rotations_per_second,
        status: diag.to_string(),
    })
}
