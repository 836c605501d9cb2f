//! Missed-trigger reconstruction.
//!
//! Switch ordinals wrap every `switch_count` triggers and some triggers are never seen.
//! Walking backwards from the newest checkpoint, each gap is assigned the ordinal step
//! it must contain modulo `switch_count`, plus however many whole revolutions best match
//! the elapsed time measured in units of the shortest observed interval. The result is
//! an unwrapped step count that increases with time.

use crate::error::Unreliability;
use crate::log::CheckpointLog;

/// Smallest strictly positive delta between consecutive times.
///
/// Returns `None` when no positive delta exists or any delta is negative
/// (out-of-order input). Zero deltas are skipped: two switches may fire within the
/// same poll.
pub fn min_positive_interval(xs: &[f64]) -> Option<f64> {
    let mut min: Option<f64> = None;
    for w in xs.windows(2) {
        let d = w[1] - w[0];
        if d < 0.0 || !d.is_finite() {
            return None;
        }
        if d > 0.0 && min.is_none_or(|m| d < m) {
            min = Some(d);
        }
    }
    min
}

/// Steps between two consecutive checkpoints.
///
/// `expected` is the ordinal distance modulo `switch_count`; the remaining elapsed
/// intervals are rounded to whole revolutions. The step is never below `expected`; a
/// repeated ordinal within less than half a revolution counts as no movement.
#[inline]
pub fn step_between(
    raw_prev: usize,
    raw_next: usize,
    elapsed_intervals: f64,
    switch_count: usize,
) -> f64 {
    let n = switch_count as f64;
    let expected = ((raw_next + switch_count - raw_prev % switch_count) % switch_count) as f64;
    let turns = ((elapsed_intervals - expected) / n).round().max(0.0);
    expected + turns * n
}

/// Fill `out` with the unwrapped step series for `(xs, raw)`, anchored so the newest
/// sample keeps its raw ordinal.
///
/// All three slices must have the same non-zero length.
pub fn chain_steps(
    xs: &[f64],
    raw: &[usize],
    switch_count: usize,
    min_interval: f64,
    out: &mut [f64],
) {
    let n = out.len();
    debug_assert!(n > 0 && xs.len() == n && raw.len() == n);
    debug_assert!(min_interval > 0.0);
    out[n - 1] = raw[n - 1] as f64;
    for j in (0..n - 1).rev() {
        let elapsed = (xs[j + 1] - xs[j]) / min_interval;
        out[j] = out[j + 1] - step_between(raw[j], raw[j + 1], elapsed, switch_count);
    }
}

/// Summary of a successful reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconstruction {
    pub samples: usize,
    pub min_interval_us: f64,
    /// Step count at the newest checkpoint.
    pub last_steps: f64,
    pub last_time_us: f64,
}

/// Reusable scratch space for reconstructing a `CheckpointLog`.
///
/// Buffers are sized to the log capacity once; reconstruction never reallocates.
#[derive(Debug, Clone)]
pub struct GapReconstructor {
    xs: Vec<f64>,
    raw: Vec<usize>,
    ys: Vec<f64>,
}

impl GapReconstructor {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            xs: Vec::with_capacity(capacity),
            raw: Vec::with_capacity(capacity),
            ys: Vec::with_capacity(capacity),
        }
    }

    pub fn reconstruct(
        &mut self,
        log: &CheckpointLog,
        switch_count: usize,
        min_valid_samples: usize,
    ) -> Result<Reconstruction, Unreliability> {
        self.xs.clear();
        self.raw.clear();
        self.ys.clear();
        for cp in log.iter() {
            self.xs.push(cp.time_us as f64);
            self.raw.push(cp.ordinal);
        }

        let n = self.xs.len();
        if n < min_valid_samples.max(2) {
            return Err(Unreliability::InsufficientData {
                valid: n,
                required: min_valid_samples,
            });
        }

        let min_interval = min_positive_interval(&self.xs).ok_or_else(|| {
            tracing::warn!(samples = n, "no positive checkpoint interval; unable to sync rotation");
            Unreliability::DegenerateTiming
        })?;

        self.ys.resize(n, 0.0);
        chain_steps(&self.xs, &self.raw, switch_count, min_interval, &mut self.ys);

        Ok(Reconstruction {
            samples: n,
            min_interval_us: min_interval,
            last_steps: self.ys[n - 1],
            last_time_us: self.xs[n - 1],
        })
    }

    /// Times of the last reconstruction, oldest first.
    pub fn times(&self) -> &[f64] {
        &self.xs
    }

    /// Step series of the last reconstruction; empty after a failed one.
    pub fn steps(&self) -> &[f64] {
        &self.ys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1, 1.0, 3, 1.0)]
    #[case(2, 0, 1.0, 3, 1.0)]
    #[case(0, 1, 4.0, 3, 4.0)]
    #[case(1, 1, 3.0, 3, 3.0)]
    #[case(1, 1, 0.2, 3, 0.0)]
    #[case(0, 0, 0.0, 3, 0.0)]
    #[case(0, 2, 0.4, 3, 2.0)]
    #[case(0, 0, 1.0, 1, 1.0)]
    #[case(0, 0, 3.1, 1, 3.0)]
    fn step_cases(
        #[case] prev: usize,
        #[case] next: usize,
        #[case] elapsed: f64,
        #[case] n: usize,
        #[case] want: f64,
    ) {
        assert_eq!(step_between(prev, next, elapsed, n), want);
    }

    #[test]
    fn min_interval_skips_zero_and_rejects_backwards() {
        assert_eq!(min_positive_interval(&[0.0, 5.0, 5.0, 8.0]), Some(3.0));
        assert_eq!(min_positive_interval(&[1.0, 1.0, 1.0]), None);
        assert_eq!(min_positive_interval(&[0.0, 10.0, 4.0]), None);
        assert_eq!(min_positive_interval(&[7.0]), None);
    }

    #[test]
    fn insufficient_samples_are_reported() {
        let mut log = CheckpointLog::new(8);
        log.append(0, 0);
        log.append(20_000, 1);
        let mut r = GapReconstructor::with_capacity(8);
        assert_eq!(
            r.reconstruct(&log, 3, 4),
            Err(Unreliability::InsufficientData { valid: 2, required: 4 })
        );
    }

    #[test]
    fn concrete_three_switch_scenario() {
        let mut log = CheckpointLog::new(8);
        for (t, o) in [(0, 0), (20_000, 1), (40_000, 2), (60_000, 0)] {
            log.append(t, o);
        }
        let mut r = GapReconstructor::with_capacity(8);
        let rec = r.reconstruct(&log, 3, 4).unwrap();
        assert_eq!(rec.min_interval_us, 20_000.0);
        assert_eq!(rec.samples, 4);
        assert_eq!(r.steps(), &[-3.0, -2.0, -1.0, 0.0]);
        assert_eq!(rec.last_steps, 0.0);
    }

    #[test]
    fn repeated_checkpoint_adds_no_steps() {
        let mut log = CheckpointLog::new(8);
        for (t, o) in [(0, 0), (20_000, 1), (40_000, 2), (60_000, 0), (60_000, 0)] {
            log.append(t, o);
        }
        let mut r = GapReconstructor::with_capacity(8);
        r.reconstruct(&log, 3, 4).unwrap();
        assert_eq!(r.steps(), &[-3.0, -2.0, -1.0, 0.0, 0.0]);
    }

    #[test]
    fn missed_revolution_is_recovered() {
        // ordinal 2 at 40 ms is followed by ordinal 0 one revolution late
        let mut log = CheckpointLog::new(8);
        for (t, o) in [(0, 0), (20_000, 1), (40_000, 2), (120_000, 0), (140_000, 1)] {
            log.append(t, o);
        }
        let mut r = GapReconstructor::with_capacity(8);
        r.reconstruct(&log, 3, 4).unwrap();
        let diffs: Vec<f64> = r.steps().windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(diffs, vec![1.0, 1.0, 4.0, 1.0]);
    }
}
