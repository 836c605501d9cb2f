//! Background switch polling.
//!
//! Spawns a thread that owns the switches, polls them at a fixed rate and registers
//! checkpoints into a `SharedEngine`, leaving the render loop free to query.
//!
//! Each `Poller` spawns exactly one thread that is shut down when the `Poller` is
//! dropped.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use rotor_traits::Switch;
use rotor_traits::clock::Clock;

use crate::engine::{RotationEngine, poll_switches};
use crate::shared::SharedEngine;

pub struct Poller {
    polls: Arc<AtomicU64>,
    checkpoints: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Poller {
    pub fn spawn<C: Clock + Send + Sync + 'static>(
        engine: SharedEngine,
        mut switches: Vec<Box<dyn Switch + Send>>,
        hz: u32,
        clock: C,
        epoch: Instant,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let polls = Arc::new(AtomicU64::new(0));
        let polls_clone = polls.clone();
        let checkpoints = Arc::new(AtomicU64::new(0));
        let checkpoints_clone = checkpoints.clone();
        let period = Duration::from_micros(crate::util::period_us(hz));

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("Poller thread received shutdown signal");
                    break;
                }

                let now = clock.micros_since(epoch);
                let all_reliable = poll_switches(&mut switches, |ordinal| {
                    engine.register_checkpoint(now, ordinal);
                    checkpoints_clone.fetch_add(1, Ordering::Relaxed);
                });
                if !all_reliable {
                    tracing::trace!("switch reported unreliable during poll");
                    engine.with(RotationEngine::mark_switch_unreliable);
                }
                polls_clone.fetch_add(1, Ordering::Relaxed);

                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(period);
            }
            tracing::trace!("Poller thread exiting cleanly");
        });

        Self {
            polls,
            checkpoints,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Number of completed polling passes.
    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::Relaxed)
    }

    /// Number of checkpoints registered by this poller.
    pub fn checkpoints(&self) -> u64 {
        self.checkpoints.load(Ordering::Relaxed)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("Poller thread joined successfully");
                }
                Err(e) => {
                    tracing::warn!(?e, "Poller thread panicked during shutdown");
                }
            }
        }
    }
}
