pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// A single trigger source mounted at a fixed ordinal position around the rotation.
///
/// Switches are read in a tight loop (or from an edge interrupt). `test()` samples the
/// hardware and reports whether the level changed since the previous sample; `is_on()`
/// returns the level captured by the most recent `test()`.
pub trait Switch {
    /// Sample the input; true when the level differs from the previous sample.
    fn test(&mut self) -> bool;
    /// Level captured by the last `test()`.
    fn is_on(&self) -> bool;
    /// False while the sensor is known to produce garbage (unwired, floating, ...).
    fn is_reliable(&self) -> bool {
        true
    }
}

impl<S: Switch + ?Sized> Switch for Box<S> {
    fn test(&mut self) -> bool {
        (**self).test()
    }
    fn is_on(&self) -> bool {
        (**self).is_on()
    }
    fn is_reliable(&self) -> bool {
        (**self).is_reliable()
    }
}
