//! The rotation engine: checkpoint intake, refit, reliability gate and phase queries.

use rotor_traits::Switch;

use crate::config::EngineCfg;
use crate::error::Unreliability;
use crate::log::CheckpointLog;
use crate::reconstruct::GapReconstructor;
use crate::status::{Diagnostics, EngineState, SensorState};
use crate::trend::TrendEstimator;
use crate::util::{MICROS_PER_SEC, wrap_unit};

/// Poll every switch once, calling `on_fire(ordinal)` for each switch that just dropped
/// low while reliable. Returns whether all switches reported reliable.
pub(crate) fn poll_switches(
    switches: &mut [Box<dyn Switch + Send>],
    mut on_fire: impl FnMut(usize),
) -> bool {
    let mut all_reliable = true;
    for (ordinal, sw) in switches.iter_mut().enumerate() {
        let changed = sw.test();
        let reliable = sw.is_reliable();
        if changed && reliable && !sw.is_on() {
            on_fire(ordinal);
        }
        all_reliable &= reliable;
    }
    all_reliable
}

/// Converts irregular switch checkpoints into a continuous rotation phase.
///
/// Timestamps are microseconds on a monotonic `u64` counter chosen by the caller;
/// every call must use the same epoch.
pub struct RotationEngine {
    pub(crate) switch_count: usize,
    pub(crate) switches: Vec<Box<dyn Switch + Send>>,
    pub(crate) cfg: EngineCfg,
    pub(crate) log: CheckpointLog,
    pub(crate) reconstructor: GapReconstructor,
    pub(crate) trend: Box<dyn TrendEstimator>,
    pub(crate) sensor: SensorState,
    // Set once Reliable is reached; arms pause detection until the next reset.
    pub(crate) was_reliable: bool,
    pub(crate) last_steps: Option<f64>,
    pub(crate) fixed_rotation: Option<f64>,
}

impl core::fmt::Debug for RotationEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RotationEngine")
            .field("switch_count", &self.switch_count)
            .field("polled_switches", &self.switches.len())
            .field("state", &self.state())
            .field("valid_checkpoints", &self.log.valid_count())
            .finish()
    }
}

impl RotationEngine {
    pub fn switch_count(&self) -> usize {
        self.switch_count
    }

    pub fn config(&self) -> &EngineCfg {
        &self.cfg
    }

    pub fn log(&self) -> &CheckpointLog {
        &self.log
    }

    /// Record a trigger of switch `ordinal` at `time_us` and refit.
    ///
    /// History is kept on failure; later checkpoints may restore reliability.
    pub fn register_checkpoint(&mut self, time_us: u64, ordinal: usize) -> SensorState {
        if ordinal >= self.switch_count {
            self.set_sensor(SensorState::Unreliable(Unreliability::InvalidOrdinal {
                ordinal,
                count: self.switch_count,
            }));
            return self.sensor;
        }
        self.log.append(time_us, ordinal);
        let next = match self.refit() {
            Ok(()) => SensorState::Reliable,
            Err(reason) => SensorState::Unreliable(reason),
        };
        self.set_sensor(next);
        self.sensor
    }

    fn refit(&mut self) -> Result<(), Unreliability> {
        let rec = self.reconstructor.reconstruct(
            &self.log,
            self.switch_count,
            self.cfg.min_valid_samples,
        )?;
        self.trend
            .fit(self.reconstructor.times(), self.reconstructor.steps())?;
        self.last_steps = Some(rec.last_steps);

        let slope = self.trend.slope().ok_or(Unreliability::NoFit)?;
        let rate = slope.abs() * MICROS_PER_SEC as f64;
        tracing::trace!(
            samples = rec.samples,
            min_interval_us = rec.min_interval_us,
            rate,
            "rotation refit"
        );
        if rate > self.cfg.min_rate && rate < self.cfg.max_rate {
            Ok(())
        } else {
            Err(Unreliability::RateOutOfBand {
                rate,
                min: self.cfg.min_rate,
                max: self.cfg.max_rate,
            })
        }
    }

    fn set_sensor(&mut self, next: SensorState) {
        if std::mem::discriminant(&next) != std::mem::discriminant(&self.sensor) {
            tracing::debug!(from = ?self.sensor, to = ?next, "rotation reliability changed");
        }
        if next == SensorState::Reliable {
            self.was_reliable = true;
        }
        self.sensor = next;
    }

    /// Per-frame housekeeping: pause detection, then one poll of any owned switches.
    pub fn tick(&mut self, time_us: u64) {
        if self.was_reliable
            && let Some(last) = self.log.last()
            && time_us.saturating_sub(last) > self.cfg.pause_threshold_us
        {
            self.reset_history();
            tracing::info!(idle_us = time_us.saturating_sub(last), "rotation paused, history cleared");
            self.set_sensor(SensorState::Paused);
        }

        if self.switches.is_empty() {
            return;
        }
        let mut switches = std::mem::take(&mut self.switches);
        let all_reliable = poll_switches(&mut switches, |ordinal| {
            self.register_checkpoint(time_us, ordinal);
        });
        self.switches = switches;
        if !all_reliable {
            self.mark_switch_unreliable();
        }
    }

    /// Demote a reliable estimate after a switch reported unreliable readings.
    pub(crate) fn mark_switch_unreliable(&mut self) {
        if self.sensor == SensorState::Reliable {
            self.set_sensor(SensorState::Unreliable(Unreliability::SwitchUnreliable));
        }
    }

    fn reset_history(&mut self) {
        self.log.clear();
        self.trend.reset();
        self.last_steps = None;
        self.was_reliable = false;
    }

    /// Force a fixed rotation speed (rotations per second) that bypasses the sensors.
    /// A negative or non-finite value clears the override.
    pub fn set_override(&mut self, rotations_per_second: f64) {
        if rotations_per_second.is_finite() && rotations_per_second >= 0.0 {
            tracing::info!(rotations_per_second, "fixed rotation override set");
            self.fixed_rotation = Some(rotations_per_second);
        } else {
            self.clear_override();
        }
    }

    pub fn clear_override(&mut self) {
        if self.fixed_rotation.take().is_some() {
            tracing::info!("fixed rotation override cleared");
        }
    }

    pub fn fixed_rotation(&self) -> Option<f64> {
        self.fixed_rotation
    }

    /// Rotation phase in [0, 1) at `time_us`, or `None` when no trustworthy estimate
    /// exists (unreliable, or too far past the newest checkpoint).
    pub fn estimated_phase(&self, time_us: u64) -> Option<f64> {
        if let Some(rps) = self.fixed_rotation {
            let turns = rps * (time_us as f64 / MICROS_PER_SEC as f64);
            return turns.is_finite().then(|| wrap_unit(turns));
        }
        if self.sensor != SensorState::Reliable {
            return None;
        }
        let steps = self.trend.extrapolate(time_us as f64)?;
        let last = self.last_steps?;
        if !steps.is_finite() || steps - last > self.cfg.max_steps_ahead {
            return None;
        }
        Some(wrap_unit(steps / self.switch_count as f64))
    }

    /// Fitted rate in steps per second. Not gated by reliability.
    pub fn rotation_rate(&self) -> Option<f64> {
        self.trend.slope().map(|s| s * MICROS_PER_SEC as f64)
    }

    /// Fitted rate in full revolutions per second. Not gated by reliability.
    pub fn rotations_per_second(&self) -> Option<f64> {
        self.rotation_rate().map(|r| r / self.switch_count as f64)
    }

    pub fn is_reliable(&self) -> bool {
        self.sensor == SensorState::Reliable
    }

    pub fn sensor_state(&self) -> SensorState {
        self.sensor
    }

    pub fn state(&self) -> EngineState {
        match self.fixed_rotation {
            Some(rotations_per_second) => EngineState::FixedOverride {
                rotations_per_second,
            },
            None => self.sensor.into(),
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            state: self.state(),
            reliable: self.is_reliable(),
            steps_per_second: self.rotation_rate(),
            rotations_per_second: self.rotations_per_second(),
            valid_checkpoints: self.log.valid_count(),
            intervals: self.log.intervals(),
        }
    }
}
