use serde::Serialize;
use thiserror::Error;

/// Why the engine currently refuses to report a phase.
///
/// These are states, not failures: the render loop holds its last frame or blanks
/// while the engine is unreliable, and the next checkpoint may recover.
#[derive(Debug, Error, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Unreliability {
    #[error("waiting for checkpoints ({valid} of {required})")]
    InsufficientData { valid: usize, required: usize },
    #[error("no positive interval between checkpoints")]
    DegenerateTiming,
    #[error("trend fit is degenerate")]
    DegenerateFit,
    #[error("implied rate {rate:.2} steps/s outside ({min}, {max})")]
    RateOutOfBand { rate: f64, min: f64, max: f64 },
    #[error("checkpoint ordinal {ordinal} out of range (switch count {count})")]
    InvalidOrdinal { ordinal: usize, count: usize },
    #[error("a switch reports unreliable readings")]
    SwitchUnreliable,
    #[error("no trend fit yet")]
    NoFit,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing switch count")]
    MissingSwitches,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
