#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are both fine; panics are not.
    if let Ok(cfg) = rotor_config::load_toml(data) {
        let valid = cfg.validate().is_ok();
        if valid {
            let core: rotor_core::EngineCfg = (&cfg.engine).into();
            let built = rotor_core::RotationEngine::builder()
                .with_switch_count(cfg.simulation.switch_count)
                .with_config(core)
                .build();
            assert!(built.is_ok(), "validated config must build");
        }
    }
    let _ = rotor_config::read_trigger_log(data.as_bytes());
});
