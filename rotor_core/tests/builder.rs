use rotor_core::mocks::ScriptedSwitch;
use rotor_core::{BuildError, EngineCfg, EngineState, RotationEngine, Unreliability};
use rstest::rstest;

fn build_error(b: rotor_core::RotationEngineBuilder) -> BuildError {
    let err = b.build().unwrap_err();
    *err.downcast_ref::<BuildError>().expect("a BuildError")
}

#[test]
fn missing_switches_is_rejected() {
    assert_eq!(build_error(RotationEngine::builder()), BuildError::MissingSwitches);
}

#[test]
fn switch_count_must_match_switch_list() {
    let b = RotationEngine::builder()
        .with_switch_count(3)
        .with_switches([ScriptedSwitch::new([true])]);
    assert!(matches!(build_error(b), BuildError::InvalidConfig(_)));
}

#[rstest]
#[case(EngineCfg { history_size: 1, ..EngineCfg::default() })]
#[case(EngineCfg { min_valid_samples: 1, ..EngineCfg::default() })]
#[case(EngineCfg { min_valid_samples: 13, ..EngineCfg::default() })]
#[case(EngineCfg { pause_threshold_us: 0, ..EngineCfg::default() })]
#[case(EngineCfg { max_steps_ahead: 0.0, ..EngineCfg::default() })]
#[case(EngineCfg { max_steps_ahead: f64::NAN, ..EngineCfg::default() })]
#[case(EngineCfg { min_rate: 100.0, max_rate: 1.0, ..EngineCfg::default() })]
#[case(EngineCfg { max_rate: f64::INFINITY, ..EngineCfg::default() })]
fn invalid_tuning_is_rejected(#[case] cfg: EngineCfg) {
    let b = RotationEngine::builder().with_switch_count(2).with_config(cfg);
    assert!(matches!(build_error(b), BuildError::InvalidConfig(_)));
}

#[test]
fn defaults_start_unreliable_with_full_capacity() {
    let engine = RotationEngine::builder().with_switch_count(2).build().unwrap();
    assert_eq!(engine.log().capacity(), EngineCfg::default().history_size);
    assert_eq!(engine.log().valid_count(), 0);
    assert_eq!(
        engine.state(),
        EngineState::Unreliable(Unreliability::InsufficientData { valid: 0, required: 4 })
    );
    assert_eq!(engine.rotation_rate(), None);
}

#[test]
fn switch_list_sets_count() {
    let engine = RotationEngine::builder()
        .with_switches([ScriptedSwitch::new([true]), ScriptedSwitch::new([true])])
        .build()
        .unwrap();
    assert_eq!(engine.switch_count(), 2);
}
