//! Engine state and diagnostics reported to the render loop and control surface.

use std::fmt;

use serde::Serialize;

use crate::error::Unreliability;
use crate::log::Interval;

/// Reliability of the sensor-fusion path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorState {
    /// Not enough trustworthy data; see the reason.
    Unreliable(Unreliability),
    /// Phase queries return extrapolated values.
    Reliable,
    /// History was cleared after a long silence.
    Paused,
}

/// Public engine state. A fixed override shadows the sensor state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Unreliable(Unreliability),
    Reliable,
    Paused,
    FixedOverride { rotations_per_second: f64 },
}

impl From<SensorState> for EngineState {
    fn from(s: SensorState) -> Self {
        match s {
            SensorState::Unreliable(r) => Self::Unreliable(r),
            SensorState::Reliable => Self::Reliable,
            SensorState::Paused => Self::Paused,
        }
    }
}

/// Snapshot for operator-facing displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub state: EngineState,
    pub reliable: bool,
    /// Raw fitted rate, independent of reliability.
    pub steps_per_second: Option<f64>,
    pub rotations_per_second: Option<f64>,
    pub valid_checkpoints: usize,
    pub intervals: Vec<Interval>,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let history = self
            .intervals
            .iter()
            .map(|i| format!("{}ms ({})", i.interval_us / 1000, i.ordinal))
            .collect::<Vec<_>>()
            .join(", ");
        match self.state {
            EngineState::FixedOverride {
                rotations_per_second,
            } => write!(f, "Fixed: {rotations_per_second}"),
            EngineState::Paused => write!(f, "Paused"),
            EngineState::Unreliable(_) => write!(f, "Unreliable ({history})"),
            EngineState::Reliable => write!(
                f,
                "{:.1} r/s ({history})",
                self.rotations_per_second.unwrap_or(0.0)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(state: EngineState) -> Diagnostics {
        Diagnostics {
            state,
            reliable: matches!(state, EngineState::Reliable),
            steps_per_second: Some(50.0),
            rotations_per_second: Some(16.666),
            valid_checkpoints: 3,
            intervals: vec![
                Interval { interval_us: 20_400, ordinal: 1 },
                Interval { interval_us: 19_900, ordinal: 2 },
            ],
        }
    }

    #[test]
    fn describes_each_state() {
        assert_eq!(diag(EngineState::Reliable).to_string(), "16.7 r/s (20ms (1), 19ms (2))");
        assert_eq!(diag(EngineState::Paused).to_string(), "Paused");
        assert_eq!(
            diag(EngineState::Unreliable(Unreliability::NoFit)).to_string(),
            "Unreliable (20ms (1), 19ms (2))"
        );
        assert_eq!(
            diag(EngineState::FixedOverride { rotations_per_second: 2.5 }).to_string(),
            "Fixed: 2.5"
        );
    }
}
