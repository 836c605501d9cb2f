//! Trigger sources for the rotation engine.
//!
//! Every variant implements `rotor_traits::Switch`:
//! - `FixedSwitch`: constant level, for bench setups without a sensor.
//! - `SimulatedSwitch`: magnet passes computed from a `SimulatedRotor` and a `Clock`.
//! - `gpio::HallSwitch` / `gpio::EdgeSwitch` (feature `hardware`, Linux): polled level
//!   and falling-edge interrupt counting on Raspberry Pi GPIO.
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;

pub mod error;
pub mod util;

use std::sync::Arc;
use std::time::Instant;

use rotor_traits::{Clock, Switch};

use crate::error::{HwError, Result};
use crate::util::XorShift32;

/// Switch with a constant level. Never reports a change.
#[derive(Debug, Clone, Copy)]
pub struct FixedSwitch {
    on: bool,
    reliable: bool,
}

impl FixedSwitch {
    pub fn new(on: bool, reliable: bool) -> Self {
        Self { on, reliable }
    }
}

impl Switch for FixedSwitch {
    fn test(&mut self) -> bool {
        false
    }
    fn is_on(&self) -> bool {
        self.on
    }
    fn is_reliable(&self) -> bool {
        self.reliable
    }
}

/// Parameters of a simulated spinning rotor.
#[derive(Debug, Clone, Copy)]
pub struct RotorProfile {
    /// Constant rotation speed.
    pub rotations_per_second: f64,
    /// Number of switches, evenly spaced; switch `i` sits at phase `i / switch_count`.
    pub switch_count: usize,
    /// Fraction of a revolution during which the magnet holds a switch low.
    pub pulse_width: f64,
    /// Drop every n-th pass of each switch (`None` = never miss).
    pub miss_every: Option<u32>,
    /// Uniform timing noise applied to generated trigger logs (µs).
    pub jitter_us: u32,
    pub seed: u32,
}

impl Default for RotorProfile {
    fn default() -> Self {
        Self {
            rotations_per_second: 10.0,
            switch_count: 1,
            pulse_width: 0.02,
            miss_every: None,
            jitter_us: 0,
            seed: 0x5EED,
        }
    }
}

/// A rotor spinning at constant speed, observed through a shared clock.
///
/// Cloning is cheap; clones observe the same clock and epoch.
#[derive(Clone)]
pub struct SimulatedRotor {
    profile: RotorProfile,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
}

impl core::fmt::Debug for SimulatedRotor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimulatedRotor")
            .field("profile", &self.profile)
            .field("elapsed_us", &self.elapsed_us())
            .finish()
    }
}

impl SimulatedRotor {
    pub fn new(profile: RotorProfile, clock: Arc<dyn Clock + Send + Sync>) -> Result<Self> {
        if profile.switch_count == 0 {
            return Err(HwError::InvalidProfile("switch count must be >= 1".into()));
        }
        if !profile.rotations_per_second.is_finite() || profile.rotations_per_second < 0.0 {
            return Err(HwError::InvalidProfile(format!(
                "speed must be finite and >= 0, got {}",
                profile.rotations_per_second
            )));
        }
        let max_width = 1.0 / profile.switch_count as f64;
        if !(profile.pulse_width > 0.0 && profile.pulse_width < max_width) {
            return Err(HwError::InvalidProfile(format!(
                "pulse width must be in (0, {max_width}), got {}",
                profile.pulse_width
            )));
        }
        let epoch = clock.now();
        Ok(Self {
            profile,
            clock,
            epoch,
        })
    }

    pub fn profile(&self) -> &RotorProfile {
        &self.profile
    }

    /// Microseconds since the rotor started spinning.
    pub fn elapsed_us(&self) -> u64 {
        self.clock.micros_since(self.epoch)
    }

    /// True rotation phase in [0, 1) at `time_us`.
    pub fn phase_at(&self, time_us: u64) -> f64 {
        self.turns_at(time_us).rem_euclid(1.0)
    }

    fn turns_at(&self, time_us: u64) -> f64 {
        self.profile.rotations_per_second * time_us as f64 / 1e6
    }

    fn missed(&self, pass: u64) -> bool {
        match self.profile.miss_every {
            Some(m) if m > 0 => (pass + 1) % u64::from(m) == 0,
            _ => false,
        }
    }

    /// Whether the magnet currently holds switch `ordinal` low.
    pub fn magnet_at(&self, ordinal: usize, time_us: u64) -> bool {
        let rel = self.turns_at(time_us) - ordinal as f64 / self.profile.switch_count as f64;
        if rel < 0.0 {
            return false;
        }
        let pass = rel.floor();
        rel - pass < self.profile.pulse_width && !self.missed(pass as u64)
    }

    /// Polled switch at `ordinal`, reading this rotor.
    pub fn switch(&self, ordinal: usize) -> Result<SimulatedSwitch> {
        if ordinal >= self.profile.switch_count {
            return Err(HwError::InvalidOrdinal {
                ordinal,
                count: self.profile.switch_count,
            });
        }
        Ok(SimulatedSwitch {
            rotor: self.clone(),
            ordinal,
            on: true,
        })
    }

    /// Every switch of this rotor, in ordinal order.
    pub fn switches(&self) -> Vec<SimulatedSwitch> {
        (0..self.profile.switch_count)
            .map(|ordinal| SimulatedSwitch {
                rotor: self.clone(),
                ordinal,
                on: true,
            })
            .collect()
    }

    /// Falling-edge trigger events `(time_us, ordinal)` within `[0, duration_us)`,
    /// with misses and jitter applied, sorted by time.
    pub fn trigger_log(&self, duration_us: u64) -> Vec<(u64, usize)> {
        let rps = self.profile.rotations_per_second;
        if rps <= 0.0 {
            return Vec::new();
        }
        let n = self.profile.switch_count;
        let us_per_turn = 1e6 / rps;
        let mut rng = XorShift32::new(self.profile.seed);
        let jitter = f64::from(self.profile.jitter_us);
        let mut out = Vec::new();
        let mut pass: u64 = 0;
        loop {
            let turn_start = pass as f64 * us_per_turn;
            if turn_start >= duration_us as f64 {
                break;
            }
            for ordinal in 0..n {
                let ideal = turn_start + us_per_turn * ordinal as f64 / n as f64;
                let t = (ideal + rng.next_signed_unit() * jitter).max(0.0);
                if ideal >= duration_us as f64 || self.missed(pass) {
                    continue;
                }
                out.push((t.round() as u64, ordinal));
            }
            pass += 1;
        }
        out.sort_by_key(|&(t, _)| t);
        out
    }
}

/// Polled switch reading a `SimulatedRotor`. Active low: the level drops while the
/// magnet passes, like a Hall switch with a pull-up.
#[derive(Debug, Clone)]
pub struct SimulatedSwitch {
    rotor: SimulatedRotor,
    ordinal: usize,
    on: bool,
}

impl SimulatedSwitch {
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

impl Switch for SimulatedSwitch {
    fn test(&mut self) -> bool {
        let now_on = !self.rotor.magnet_at(self.ordinal, self.rotor.elapsed_us());
        let changed = now_on != self.on;
        self.on = now_on;
        changed
    }

    fn is_on(&self) -> bool {
        self.on
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotor_traits::ManualClock;
    use rstest::rstest;
    use std::time::Duration;

    fn rotor(profile: RotorProfile) -> (ManualClock, SimulatedRotor) {
        let clock = ManualClock::new();
        let rotor = SimulatedRotor::new(profile, Arc::new(clock.clone())).unwrap();
        (clock, rotor)
    }

    #[test]
    fn test_simulated_switch_falls_when_magnet_passes() {
        let (clock, rotor) = rotor(RotorProfile {
            rotations_per_second: 10.0,
            switch_count: 2,
            pulse_width: 0.05,
            ..RotorProfile::default()
        });
        let mut sw = rotor.switch(1).unwrap();
        // switch 1 sits half a turn in: 50 ms at 10 r/s
        clock.set_offset(Duration::from_millis(40));
        assert!(!sw.test());
        assert!(sw.is_on());
        clock.set_offset(Duration::from_millis(51));
        assert!(sw.test());
        assert!(!sw.is_on());
        clock.set_offset(Duration::from_millis(60));
        assert!(sw.test());
        assert!(sw.is_on());
    }

    #[test]
    fn test_trigger_log_spacing_and_misses() {
        let (_clock, rotor) = rotor(RotorProfile {
            rotations_per_second: 10.0,
            switch_count: 2,
            miss_every: Some(3),
            ..RotorProfile::default()
        });
        let log = rotor.trigger_log(300_000);
        // passes 0,1 kept, pass 2 dropped
        let times: Vec<u64> = log.iter().map(|&(t, _)| t).collect();
        assert_eq!(times, vec![0, 50_000, 100_000, 150_000]);
        let ords: Vec<usize> = log.iter().map(|&(_, o)| o).collect();
        assert_eq!(ords, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_rejects_bad_ordinal() {
        let (_clock, rotor) = rotor(RotorProfile::default());
        assert!(matches!(
            rotor.switch(3),
            Err(HwError::InvalidOrdinal { ordinal: 3, count: 1 })
        ));
    }

    #[rstest]
    #[case::no_switches(10.0, 0, 0.02)]
    #[case::negative_speed(-1.0, 1, 0.02)]
    #[case::nan_speed(f64::NAN, 1, 0.02)]
    #[case::zero_pulse(10.0, 1, 0.0)]
    #[case::pulse_overlaps_next_switch(10.0, 2, 0.6)]
    fn test_rejects_bad_profile(#[case] rps: f64, #[case] switch_count: usize, #[case] pulse_width: f64) {
        let res = SimulatedRotor::new(
            RotorProfile {
                rotations_per_second: rps,
                switch_count,
                pulse_width,
                ..RotorProfile::default()
            },
            Arc::new(ManualClock::new()),
        );
        assert!(matches!(res, Err(HwError::InvalidProfile(_))), "{res:?}");
    }

    #[rstest]
    #[case(true, true)]
    #[case(true, false)]
    #[case(false, true)]
    fn test_fixed_switch_holds_level(#[case] on: bool, #[case] reliable: bool) {
        let mut sw = FixedSwitch::new(on, reliable);
        for _ in 0..3 {
            assert!(!sw.test());
        }
        assert_eq!(sw.is_on(), on);
        assert_eq!(sw.is_reliable(), reliable);
    }
}
