//! Cross-thread handle to one `RotationEngine`.
//!
//! Checkpoint producers (interrupt handlers, a polling thread) and the render loop
//! share the engine through a single mutex. Each call holds the lock for one append
//! and refit, or one query, so a reader never sees a timestamp paired with the wrong
//! ordinal.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use rotor_traits::Clock;

use crate::engine::RotationEngine;
use crate::status::{Diagnostics, SensorState};

#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<RotationEngine>>,
}

impl core::fmt::Debug for SharedEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("SharedEngine").field(&*self.lock()).finish()
    }
}

impl SharedEngine {
    pub fn new(engine: RotationEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    // A panic while holding the lock cannot leave a torn checkpoint pair behind:
    // both rings are written before any fallible work, so the state stays usable.
    fn lock(&self) -> MutexGuard<'_, RotationEngine> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with<R>(&self, f: impl FnOnce(&mut RotationEngine) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn register_checkpoint(&self, time_us: u64, ordinal: usize) -> SensorState {
        self.lock().register_checkpoint(time_us, ordinal)
    }

    pub fn tick(&self, time_us: u64) {
        self.lock().tick(time_us);
    }

    pub fn estimated_phase(&self, time_us: u64) -> Option<f64> {
        self.lock().estimated_phase(time_us)
    }

    pub fn rotation_rate(&self) -> Option<f64> {
        self.lock().rotation_rate()
    }

    pub fn is_reliable(&self) -> bool {
        self.lock().is_reliable()
    }

    pub fn set_override(&self, rotations_per_second: f64) {
        self.lock().set_override(rotations_per_second);
    }

    pub fn clear_override(&self) {
        self.lock().clear_override();
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.lock().diagnostics()
    }

    /// Callback that timestamps a trigger of `ordinal` with `clock` and registers it.
    /// Suitable as an edge-interrupt hook.
    ///
    /// The timestamp is read under the lock so concurrent hooks append in time order.
    pub fn checkpoint_sink<C>(&self, ordinal: usize, clock: C, epoch: Instant) -> impl FnMut() + Send + 'static
    where
        C: Clock + Send + 'static,
    {
        let engine = self.clone();
        move || {
            engine.with(|e| e.register_checkpoint(clock.micros_since(epoch), ordinal));
        }
    }
}
