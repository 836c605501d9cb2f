//! Test and helper mocks for rotor_core

use rotor_traits::Switch;

/// Switch that replays a fixed sequence of levels, one per `test()`, then holds the
/// last level.
#[derive(Debug, Clone)]
pub struct ScriptedSwitch {
    levels: Vec<bool>,
    idx: usize,
    on: bool,
    reliable: bool,
}

impl ScriptedSwitch {
    pub fn new(levels: impl Into<Vec<bool>>) -> Self {
        Self {
            levels: levels.into(),
            idx: 0,
            on: true,
            reliable: true,
        }
    }

    pub fn unreliable(mut self) -> Self {
        self.reliable = false;
        self
    }
}

impl Switch for ScriptedSwitch {
    fn test(&mut self) -> bool {
        let next = self.levels.get(self.idx).copied().unwrap_or(self.on);
        self.idx = self.idx.saturating_add(1);
        let changed = next != self.on;
        self.on = next;
        changed
    }

    fn is_on(&self) -> bool {
        self.on
    }

    fn is_reliable(&self) -> bool {
        self.reliable
    }
}
