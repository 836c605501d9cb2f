use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rppal::gpio::{Event, Gpio, InputPin, Level, Trigger};
use rotor_traits::Switch;
use tracing::{debug, trace};

use crate::error::{HwError, Result};

fn open_input_pullup(pin: u8) -> Result<InputPin> {
    let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
    let pin = gpio
        .get(pin)
        .map_err(|e| HwError::Gpio(format!("open switch pin {pin}: {e}")))?
        .into_input_pullup();
    Ok(pin)
}

/// Hall switch read by polling the pin level (pull-up, magnet pulls low).
pub struct HallSwitch {
    pin: InputPin,
    level: Level,
}

impl HallSwitch {
    pub fn new(pin: u8) -> Result<Self> {
        let pin = open_input_pullup(pin)?;
        let level = pin.read();
        debug!(pin = pin.pin(), ?level, "hall switch opened");
        Ok(Self { pin, level })
    }
}

impl Switch for HallSwitch {
    fn test(&mut self) -> bool {
        let now = self.pin.read();
        let changed = now != self.level;
        self.level = now;
        changed
    }

    fn is_on(&self) -> bool {
        self.level == Level::High
    }
}

/// Switch fed by a falling-edge interrupt.
///
/// The interrupt thread counts edges; `test()` reports whether any edge arrived since
/// the previous poll, and `is_on()` reads low right after one. An optional hook runs on
/// the interrupt thread for every edge, which lets callers timestamp checkpoints without
/// waiting for the next poll.
pub struct EdgeSwitch {
    // Held to keep the interrupt registered.
    _pin: InputPin,
    edges: Arc<AtomicU64>,
    seen: u64,
    on: bool,
}

impl EdgeSwitch {
    pub fn new(pin: u8) -> Result<Self> {
        Self::with_hook(pin, || {})
    }

    pub fn with_hook(pin: u8, mut on_edge: impl FnMut() + Send + 'static) -> Result<Self> {
        let mut input = open_input_pullup(pin)?;
        let edges = Arc::new(AtomicU64::new(0));
        let counter = edges.clone();
        input
            .set_async_interrupt(Trigger::FallingEdge, None, move |_event: Event| {
                counter.fetch_add(1, Ordering::Relaxed);
                on_edge();
            })
            .map_err(|e| HwError::Gpio(format!("attach interrupt on pin {pin}: {e}")))?;
        debug!(pin, "edge switch interrupt attached");
        Ok(Self {
            _pin: input,
            edges,
            seen: 0,
            on: true,
        })
    }

    /// Total falling edges observed since construction.
    pub fn edge_count(&self) -> u64 {
        self.edges.load(Ordering::Relaxed)
    }
}

impl Switch for EdgeSwitch {
    fn test(&mut self) -> bool {
        let n = self.edges.load(Ordering::Relaxed);
        let fresh = n != self.seen;
        if fresh {
            trace!(edges = n - self.seen, "edge switch fired");
        }
        self.seen = n;
        self.on = !fresh;
        fresh
    }

    fn is_on(&self) -> bool {
        self.on
    }
}
