#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and trigger-log parsing for the rotation estimator.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Trigger-log CSV loader enforces headers and time ordering so a replay sees the
//!   same stream a live run would have produced.
use std::collections::HashSet;

use serde::Deserialize;

/// Trigger-log CSV schema.
///
/// Expected headers:
/// time_us,ordinal
///
/// Example:
/// time_us,ordinal
/// 0,0
/// 20000,1
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRow {
    pub time_us: u64,
    pub ordinal: usize,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SensorMode {
    /// Switches are polled by the render loop or a background poller.
    #[default]
    Poll,
    /// Falling-edge interrupts register checkpoints directly.
    Interrupt,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SensorCfg {
    /// BCM GPIO pins, one per switch, in ordinal order.
    pub pins: Vec<u8>,
    pub mode: SensorMode,
    /// Polling period in microseconds (poll mode only).
    pub poll_us: u64,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            pins: Vec::new(),
            mode: SensorMode::Poll,
            poll_us: 200,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineCfg {
    pub history_size: usize,
    pub min_valid_samples: usize,
    /// Silence after which checkpoint history is dropped
    pub pause_ms: u64,
    /// Extrapolation limit past the newest checkpoint, in switch steps
    pub max_steps_ahead: f64,
    /// Exclusive band on the implied rate, steps per second
    pub min_rate: f64,
    pub max_rate: f64,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            history_size: 12,
            min_valid_samples: 4,
            pause_ms: 2000,
            max_steps_ahead: 3.5,
            min_rate: 1.0,
            max_rate: 100.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulationCfg {
    pub rotations_per_second: f64,
    pub switch_count: usize,
    /// Fraction of a revolution each magnet pass holds a switch low
    pub pulse_width: f64,
    /// Drop every n-th pass of each switch
    pub miss_every: Option<u32>,
    pub jitter_us: u32,
    pub seed: u32,
}

impl Default for SimulationCfg {
    fn default() -> Self {
        Self {
            rotations_per_second: 10.0,
            switch_count: 3,
            pulse_width: 0.02,
            miss_every: None,
            jitter_us: 0,
            seed: 0x5EED,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Persisted fixed rotation speed; when present the sensors are ignored.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct OverrideCfg {
    pub rotations_per_second: f64,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sensor: SensorCfg,
    #[serde(default)]
    pub engine: EngineCfg,
    #[serde(default)]
    pub simulation: SimulationCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default, rename = "override")]
    pub fixed: Option<OverrideCfg>,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Parse a trigger log from any reader. See `TriggerRow` for the format.
pub fn read_trigger_log<R: std::io::Read>(reader: R) -> eyre::Result<Vec<TriggerRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers: {}", e))?
        .clone();
    let expected = ["time_us", "ordinal"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "trigger log CSV must have headers 'time_us,ordinal', got: {}",
            actual.join(",")
        );
    }

    let mut rows: Vec<TriggerRow> = Vec::new();
    for (idx, rec) in rdr.deserialize::<TriggerRow>().enumerate() {
        let row = match rec {
            Ok(row) => row,
            Err(e) => eyre::bail!("invalid CSV row {}: {}", idx + 2, e),
        };
        if let Some(prev) = rows.last()
            && row.time_us < prev.time_us
        {
            eyre::bail!(
                "trigger log time goes backwards at row {} ({} < {})",
                idx + 2,
                row.time_us,
                prev.time_us
            );
        }
        rows.push(row);
    }
    if rows.is_empty() {
        eyre::bail!("trigger log contains no rows");
    }
    Ok(rows)
}

pub fn load_trigger_log_csv(path: &std::path::Path) -> eyre::Result<Vec<TriggerRow>> {
    let file = std::fs::File::open(path)
        .map_err(|e| eyre::eyre!("open trigger log CSV {:?}: {}", path, e))?;
    read_trigger_log(file).map_err(|e| eyre::eyre!("trigger log {:?}: {}", path, e))
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sensor
        if self.sensor.poll_us == 0 {
            eyre::bail!("sensor.poll_us must be >= 1");
        }
        if self.sensor.poll_us > 1_000_000 {
            eyre::bail!("sensor.poll_us is unreasonably large (>1s)");
        }
        let mut seen = HashSet::new();
        for pin in &self.sensor.pins {
            if !seen.insert(pin) {
                eyre::bail!("sensor.pins lists GPIO {} more than once", pin);
            }
        }

        // Engine
        let e = &self.engine;
        if e.history_size < 2 || e.history_size > 1024 {
            eyre::bail!("engine.history_size must be in [2, 1024]");
        }
        if e.min_valid_samples < 2 || e.min_valid_samples > e.history_size {
            eyre::bail!("engine.min_valid_samples must be in [2, engine.history_size]");
        }
        if e.pause_ms == 0 {
            eyre::bail!("engine.pause_ms must be >= 1");
        }
        if !(e.max_steps_ahead.is_finite() && e.max_steps_ahead > 0.0) {
            eyre::bail!("engine.max_steps_ahead must be > 0");
        }
        if !(e.min_rate.is_finite() && e.min_rate >= 0.0) {
            eyre::bail!("engine.min_rate must be >= 0");
        }
        if !(e.max_rate.is_finite() && e.max_rate > e.min_rate) {
            eyre::bail!("engine.max_rate must be > engine.min_rate");
        }

        // Simulation
        let s = &self.simulation;
        if !(s.rotations_per_second.is_finite() && s.rotations_per_second >= 0.0) {
            eyre::bail!("simulation.rotations_per_second must be >= 0");
        }
        if s.switch_count == 0 || s.switch_count > 64 {
            eyre::bail!("simulation.switch_count must be in [1, 64]");
        }
        let max_width = 1.0 / s.switch_count as f64;
        if !(s.pulse_width > 0.0 && s.pulse_width < max_width) {
            eyre::bail!("simulation.pulse_width must be in (0, 1/switch_count)");
        }
        if let Some(m) = s.miss_every
            && m < 2
        {
            eyre::bail!("simulation.miss_every must be >= 2");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Override
        if let Some(o) = self.fixed
            && !(o.rotations_per_second.is_finite() && o.rotations_per_second >= 0.0)
        {
            eyre::bail!("override.rotations_per_second must be >= 0");
        }

        Ok(())
    }
}
