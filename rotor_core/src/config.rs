//! Runtime configuration for the rotation engine.
//!
//! Separate from the TOML-deserialized config in `rotor_config`; see `conversions`.

/// Estimator tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineCfg {
    /// Ring capacity of the checkpoint log.
    pub history_size: usize,
    /// Valid checkpoints required before any fit is trusted.
    pub min_valid_samples: usize,
    /// Silence after which history is cleared (µs). Default: 2 s.
    pub pause_threshold_us: u64,
    /// Maximum extrapolation beyond the newest checkpoint, in steps. Default: 3.5.
    pub max_steps_ahead: f64,
    /// Reliability band on the implied rate, exclusive, in steps per second.
    pub min_rate: f64,
    pub max_rate: f64,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            history_size: 12,
            min_valid_samples: 4,
            pause_threshold_us: 2_000_000,
            max_steps_ahead: 3.5,
            min_rate: 1.0,
            max_rate: 100.0,
        }
    }
}
