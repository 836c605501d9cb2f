//! Live run against real Hall switches.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rotor_config::{Config, SensorMode};
use rotor_core::poller::Poller;
use rotor_core::util::MICROS_PER_SEC;
use rotor_core::{Diagnostics, RotationEngine, SharedEngine};
use rotor_hardware::gpio::{EdgeSwitch, HallSwitch};
use rotor_traits::{Clock, MonotonicClock, Switch};

use crate::cli::RtLock;
use crate::rt::setup_rt_once;

#[derive(Debug, Clone)]
pub struct RunParams {
    pub duration_ms: Option<u64>,
    pub report_ms: u64,
    pub rt: bool,
    pub rt_prio: Option<i32>,
    pub rt_lock: Option<RtLock>,
}

fn report(diag: &Diagnostics, json: bool) -> eyre::Result<()> {
    let mut out = std::io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string(diag)?)?;
    } else {
        writeln!(out, "{diag}")?;
    }
    Ok(())
}

pub fn run_hardware(
    cfg: &Config,
    p: &RunParams,
    json: bool,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<Diagnostics> {
    setup_rt_once(p.rt, p.rt_prio, p.rt_lock.unwrap_or(RtLock::os_default()));

    let pins = &cfg.sensor.pins;
    if pins.is_empty() {
        eyre::bail!("sensor.pins is empty; configure at least one switch pin");
    }
    let engine = SharedEngine::new(
        RotationEngine::builder()
            .with_switch_count(pins.len())
            .with_config((&cfg.engine).into())
            .build()?,
    );
    if let Some(o) = cfg.fixed {
        engine.set_override(o.rotations_per_second);
    }

    let clock = MonotonicClock::new();
    let epoch = clock.now();

    // Both hold live GPIO handles for the whole run.
    let mut edge_switches = Vec::new();
    let mut poller = None;
    match cfg.sensor.mode {
        SensorMode::Interrupt => {
            for (ordinal, &pin) in pins.iter().enumerate() {
                let sink = engine.checkpoint_sink(ordinal, clock, epoch);
                edge_switches.push(EdgeSwitch::with_hook(pin, sink)?);
            }
        }
        SensorMode::Poll => {
            let switches = pins
                .iter()
                .map(|&pin| HallSwitch::new(pin).map(|s| Box::new(s) as Box<dyn Switch + Send>))
                .collect::<Result<Vec<_>, _>>()?;
            let hz = u32::try_from(MICROS_PER_SEC / cfg.sensor.poll_us.max(1)).unwrap_or(u32::MAX);
            poller = Some(Poller::spawn(engine.clone(), switches, hz, clock, epoch));
        }
    }
    tracing::info!(pins = ?pins, mode = ?cfg.sensor.mode, "run start");

    let report_every = Duration::from_millis(p.report_ms.max(1));
    let deadline = p.duration_ms.map(|ms| epoch + Duration::from_millis(ms));
    let mut next_report = epoch + report_every;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break;
        }
        let now = clock.now();
        if deadline.is_some_and(|d| now >= d) {
            break;
        }
        engine.tick(clock.micros_since(epoch));
        if now >= next_report {
            report(&engine.diagnostics(), json)?;
            next_report += report_every;
        }
        clock.sleep(Duration::from_millis(1));
    }

    let polls = poller.as_ref().map(Poller::polls);
    drop(poller);
    let edges: u64 = edge_switches.iter().map(EdgeSwitch::edge_count).sum();
    tracing::info!(?polls, edges, "run stopped");
    Ok(engine.diagnostics())
}
