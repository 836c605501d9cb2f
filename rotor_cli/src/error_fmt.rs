//! Human-readable error descriptions and structured JSON error formatting.

/// Exit code for a failed command when the cause is not recognized.
pub const EXIT_GENERIC: i32 = 1;
/// Invalid config file or engine tuning.
pub const EXIT_CONFIG: i32 = 3;
/// Unreadable or malformed trigger log.
pub const EXIT_INPUT: i32 = 4;
/// GPIO or other hardware failure.
pub const EXIT_HARDWARE: i32 = 5;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use rotor_core::error::BuildError;
    use rotor_hardware::error::HwError;

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSwitches => {
                "What happened: No switches were provided to the rotation engine.\nLikely causes: sensor.pins is empty and no switch count was given.\nHow to fix: List the Hall switch GPIO pins under [sensor] or pass --switch-count.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid engine configuration ({msg}).\nLikely causes: Out-of-range values in [engine].\nHow to fix: Edit the config file, then rerun `rotor self-check`."
            ),
        };
    }

    if let Some(he) = err.downcast_ref::<HwError>() {
        return match he {
            HwError::Gpio(msg) => format!(
                "What happened: GPIO access failed ({msg}).\nLikely causes: Wrong pin numbers, not running on a Raspberry Pi, or missing permission for /dev/gpiomem.\nHow to fix: Check sensor.pins and run as a user in the gpio group."
            ),
            HwError::InvalidProfile(msg) => format!(
                "What happened: The simulated rotor cannot be built ({msg}).\nLikely causes: Out-of-range values in [simulation] or on the command line.\nHow to fix: Adjust the simulation settings, then rerun `rotor self-check`."
            ),
            HwError::InvalidOrdinal { ordinal, count } => format!(
                "What happened: Switch {ordinal} does not exist (switch count {count}).\nLikely causes: Simulation switch_count does not match the request.\nHow to fix: Adjust simulation.switch_count."
            ),
        };
    }

    // String-based heuristics for errors coming from config and input files
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();
    let root = err.root_cause().to_string();

    if lower.contains("invalid configuration") {
        return format!(
            "What happened: Configuration is invalid ({root}).\nLikely causes: A typo or an out-of-range value in the TOML.\nHow to fix: Edit the config file and try again."
        );
    }

    if lower.contains("trigger log csv must have headers") {
        return "Invalid headers in trigger log CSV. Expected 'time_us,ordinal'.".to_string();
    }

    if lower.contains("trigger log") {
        return format!(
            "What happened: The trigger log could not be used ({msg}).\nHow to fix: Provide a CSV with headers 'time_us,ordinal' and non-decreasing times."
        );
    }

    if lower.contains("requires the hardware feature") {
        return format!("{msg}\nHow to fix: Rebuild with `cargo build -p rotor_cli --features hardware`.");
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Error: {msg}"
    )
}

/// Stable exit codes per error class.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<rotor_core::error::BuildError>().is_some() {
        return EXIT_CONFIG;
    }
    match err.downcast_ref::<rotor_hardware::error::HwError>() {
        Some(rotor_hardware::error::HwError::InvalidProfile(_)) => return EXIT_CONFIG,
        Some(_) => return EXIT_HARDWARE,
        None => {}
    }
    let lower = err.to_string().to_ascii_lowercase();
    if lower.contains("invalid configuration") || lower.contains("read config") {
        return EXIT_CONFIG;
    }
    if lower.contains("trigger log") {
        return EXIT_INPUT;
    }
    EXIT_GENERIC
}

fn reason_name(code: i32) -> &'static str {
    match code {
        EXIT_CONFIG => "Config",
        EXIT_INPUT => "Input",
        EXIT_HARDWARE => "Hardware",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    let code = exit_code_for_error(err);
    json!({
        "reason": reason_name(code),
        "exit_code": code,
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;

    #[test]
    fn build_errors_map_to_config_exit() {
        let err = eyre::Report::new(rotor_core::error::BuildError::InvalidConfig("history_size must be >= 2"));
        assert_eq!(exit_code_for_error(&err), EXIT_CONFIG);
        assert!(humanize(&err).contains("history_size must be >= 2"));
    }

    #[test]
    fn wrapped_config_errors_show_root_cause() {
        let err = Err::<(), _>(eyre::eyre!("engine.pause_ms must be >= 1"))
            .wrap_err("invalid configuration in cfg.toml")
            .unwrap_err();
        assert_eq!(exit_code_for_error(&err), EXIT_CONFIG);
        assert!(humanize(&err).contains("engine.pause_ms must be >= 1"));
    }

    #[test]
    fn trigger_log_errors_are_input_errors() {
        let err = eyre::eyre!("trigger log CSV must have headers 'time_us,ordinal', got: a,b");
        assert_eq!(exit_code_for_error(&err), EXIT_INPUT);
        assert!(humanize(&err).starts_with("Invalid headers"));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Input");
        assert_eq!(v["exit_code"], EXIT_INPUT);
    }

    #[test]
    fn hardware_errors_map_to_hardware_exit() {
        let err = eyre::Report::new(rotor_hardware::error::HwError::Gpio("no /dev/gpiomem".into()));
        assert_eq!(exit_code_for_error(&err), EXIT_HARDWARE);
        assert!(humanize(&err).contains("no /dev/gpiomem"));
    }

    #[test]
    fn invalid_rotor_profile_is_a_config_error() {
        let err = eyre::Report::new(rotor_hardware::error::HwError::InvalidProfile(
            "pulse width must be in (0, 0.5), got 0.6".into(),
        ));
        assert_eq!(exit_code_for_error(&err), EXIT_CONFIG);
        let text = humanize(&err);
        assert!(text.contains("simulated rotor"));
        assert!(!text.contains("GPIO"));
    }
}
