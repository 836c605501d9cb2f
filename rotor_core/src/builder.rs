//! Builder for `RotationEngine`.
//!
//! Construction is the only fallible step: once built, the engine degrades to
//! unreliable states instead of returning errors.

use rotor_traits::Switch;

use crate::config::EngineCfg;
use crate::engine::RotationEngine;
use crate::error::{BuildError, Result, Unreliability};
use crate::log::CheckpointLog;
use crate::reconstruct::GapReconstructor;
use crate::status::SensorState;
use crate::trend::{LinearTrend, TrendEstimator};

impl RotationEngine {
    /// Start building an engine.
    pub fn builder() -> RotationEngineBuilder {
        RotationEngineBuilder::default()
    }
}

/// Builder for `RotationEngine`. All fields are validated on `build()`.
#[derive(Default)]
pub struct RotationEngineBuilder {
    switch_count: Option<usize>,
    switches: Vec<Box<dyn Switch + Send>>,
    cfg: EngineCfg,
    trend: Option<Box<dyn TrendEstimator>>,
}

impl RotationEngineBuilder {
    /// Number of switches feeding `register_checkpoint` externally (interrupts, replay).
    pub fn with_switch_count(mut self, n: usize) -> Self {
        self.switch_count = Some(n);
        self
    }

    /// Switches polled by `tick`, in ordinal order. Also fixes the switch count.
    pub fn with_switches<I, S>(mut self, switches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Switch + Send + 'static,
    {
        self.switches = switches
            .into_iter()
            .map(|s| Box::new(s) as Box<dyn Switch + Send>)
            .collect();
        self
    }

    /// Already boxed switches, e.g. a mix of hardware variants.
    pub fn with_boxed_switches(mut self, switches: Vec<Box<dyn Switch + Send>>) -> Self {
        self.switches = switches;
        self
    }

    pub fn with_config(mut self, cfg: EngineCfg) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn with_history_size(mut self, n: usize) -> Self {
        self.cfg.history_size = n;
        self
    }

    pub fn with_min_valid_samples(mut self, n: usize) -> Self {
        self.cfg.min_valid_samples = n;
        self
    }

    pub fn with_pause_threshold_us(mut self, us: u64) -> Self {
        self.cfg.pause_threshold_us = us;
        self
    }

    /// Replace the default least-squares trend.
    pub fn with_trend(mut self, trend: impl TrendEstimator + 'static) -> Self {
        self.trend = Some(Box::new(trend));
        self
    }

    pub fn build(self) -> Result<RotationEngine> {
        let switch_count = match (self.switch_count, self.switches.len()) {
            (Some(n), 0) => n,
            (None, 0) => return Err(eyre::Report::new(BuildError::MissingSwitches)),
            (None, polled) => polled,
            (Some(n), polled) if n == polled => n,
            (Some(_), _) => {
                return Err(eyre::Report::new(BuildError::InvalidConfig(
                    "switch count does not match the switch list",
                )));
            }
        };
        validate(switch_count, &self.cfg)?;

        let cfg = self.cfg;
        let required = cfg.min_valid_samples;
        Ok(RotationEngine {
            switch_count,
            switches: self.switches,
            log: CheckpointLog::new(cfg.history_size),
            reconstructor: GapReconstructor::with_capacity(cfg.history_size),
            trend: self
                .trend
                .unwrap_or_else(|| Box::new(LinearTrend::new())),
            sensor: SensorState::Unreliable(Unreliability::InsufficientData { valid: 0, required }),
            was_reliable: false,
            last_steps: None,
            fixed_rotation: None,
            cfg,
        })
    }
}

fn validate(switch_count: usize, cfg: &EngineCfg) -> Result<()> {
    let invalid = |msg: &'static str| Err(eyre::Report::new(BuildError::InvalidConfig(msg)));
    if switch_count == 0 {
        return invalid("switch count must be >= 1");
    }
    if cfg.history_size < 2 {
        return invalid("history_size must be >= 2");
    }
    if cfg.min_valid_samples < 2 || cfg.min_valid_samples > cfg.history_size {
        return invalid("min_valid_samples must be in [2, history_size]");
    }
    if cfg.pause_threshold_us == 0 {
        return invalid("pause threshold must be > 0");
    }
    if !(cfg.max_steps_ahead.is_finite() && cfg.max_steps_ahead > 0.0) {
        return invalid("max_steps_ahead must be finite and > 0");
    }
    if !(cfg.min_rate.is_finite() && cfg.max_rate.is_finite()) || cfg.min_rate < 0.0 {
        return invalid("rate band must be finite and >= 0");
    }
    if cfg.min_rate >= cfg.max_rate {
        return invalid("min_rate must be < max_rate");
    }
    Ok(())
}
