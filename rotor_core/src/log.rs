//! Bounded history of switch checkpoints.
//!
//! Two parallel rings (timestamps, ordinals) are always written by the same call, so
//! chronological slot `i` of one ring pairs with slot `i` of the other. Unset slots hold
//! `UNSET_TIME` / `None`.

use serde::Serialize;

use crate::roller::Roller;

/// Timestamp stored in slots that never saw a checkpoint.
pub const UNSET_TIME: u64 = 0;

/// A timestamped trigger from one switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Checkpoint {
    pub time_us: u64,
    pub ordinal: usize,
}

/// Time between two consecutive checkpoints, labelled with the later ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub interval_us: u64,
    pub ordinal: usize,
}

#[derive(Debug, Clone)]
pub struct CheckpointLog {
    timestamps: Roller<u64>,
    ordinals: Roller<Option<usize>>,
}

impl CheckpointLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            timestamps: Roller::new(capacity, UNSET_TIME),
            ordinals: Roller::new(capacity, None),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ordinals.capacity()
    }

    /// Record a checkpoint, overwriting the oldest slot of both rings.
    #[inline]
    pub fn append(&mut self, time_us: u64, ordinal: usize) {
        self.ordinals.append(Some(ordinal));
        self.timestamps.append(time_us);
    }

    /// Timestamp of the newest checkpoint, if any.
    #[inline]
    pub fn last(&self) -> Option<u64> {
        self.ordinals.last().map(|_| self.timestamps.last())
    }

    /// Chronological slot `i` (0 = oldest); `None` for unset or out-of-range slots.
    pub fn get(&self, i: usize) -> Option<Checkpoint> {
        let ordinal = self.ordinals.get(i)??;
        let time_us = self.timestamps.get(i)?;
        Some(Checkpoint { time_us, ordinal })
    }

    /// Reset both rings to the unset sentinel.
    pub fn clear(&mut self) {
        self.ordinals.fill(None);
        self.timestamps.fill(UNSET_TIME);
    }

    pub fn unset_count(&self) -> usize {
        self.ordinals.count_occurrences(&None)
    }

    #[inline]
    pub fn valid_count(&self) -> usize {
        self.capacity() - self.unset_count()
    }

    /// Valid checkpoints, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = Checkpoint> + '_ {
        self.timestamps
            .iter()
            .zip(self.ordinals.iter())
            .filter_map(|(time_us, ordinal)| ordinal.map(|ordinal| Checkpoint { time_us, ordinal }))
    }

    /// Consecutive intervals between valid checkpoints, oldest first.
    pub fn intervals(&self) -> Vec<Interval> {
        let mut out = Vec::with_capacity(self.valid_count().saturating_sub(1));
        let mut prev: Option<u64> = None;
        for cp in self.iter() {
            if let Some(p) = prev {
                out.push(Interval {
                    interval_us: cp.time_us.saturating_sub(p),
                    ordinal: cp.ordinal,
                });
            }
            prev = Some(cp.time_us);
        }
        out
    }
}
