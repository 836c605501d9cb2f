//! Common time/period helpers for rotor_core.

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;
/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Compute the period in microseconds for a given polling rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 microsecond.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    (MICROS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Map any finite value into [0, 1).
///
/// `rem_euclid` can round a tiny negative input up to exactly 1.0; that case folds to 0.
#[inline]
pub fn wrap_unit(x: f64) -> f64 {
    let r = x.rem_euclid(1.0);
    if r >= 1.0 { 0.0 } else { r }
}
