//! `From` implementations bridging `rotor_config` types to `rotor_core` types.

use crate::config::EngineCfg;
use crate::util::MILLIS_PER_SEC;

impl From<&rotor_config::EngineCfg> for EngineCfg {
    fn from(c: &rotor_config::EngineCfg) -> Self {
        Self {
            history_size: c.history_size,
            min_valid_samples: c.min_valid_samples,
            pause_threshold_us: c.pause_ms.saturating_mul(MILLIS_PER_SEC),
            max_steps_ahead: c.max_steps_ahead,
            min_rate: c.min_rate,
            max_rate: c.max_rate,
        }
    }
}
