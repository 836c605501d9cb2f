#![no_main]
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;
use rotor_core::RotationEngine;

#[derive(Debug, Arbitrary)]
enum Op {
    Checkpoint { dt_us: u32, ordinal: u8 },
    Tick { dt_us: u32 },
    Query { ahead_us: u32 },
    Override(f64),
    ClearOverride,
}

#[derive(Debug, Arbitrary)]
struct Input {
    switch_count: u8,
    history: u8,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let switch_count = usize::from(input.switch_count % 8) + 1;
    let history = usize::from(input.history % 30) + 2;
    let Ok(mut engine) = RotationEngine::builder()
        .with_switch_count(switch_count)
        .with_history_size(history)
        .with_min_valid_samples(2)
        .build()
    else {
        return;
    };

    let mut now = 0u64;
    for op in input.ops {
        match op {
            Op::Checkpoint { dt_us, ordinal } => {
                now += u64::from(dt_us);
                engine.register_checkpoint(now, usize::from(ordinal));
            }
            Op::Tick { dt_us } => {
                now += u64::from(dt_us);
                engine.tick(now);
            }
            Op::Query { ahead_us } => {
                if let Some(p) = engine.estimated_phase(now + u64::from(ahead_us)) {
                    assert!((0.0..1.0).contains(&p), "phase {p} out of range");
                }
                if engine.is_reliable() {
                    assert!(engine.rotation_rate().is_some());
                }
            }
            Op::Override(v) => engine.set_override(v),
            Op::ClearOverride => engine.clear_override(),
        }
    }
});
