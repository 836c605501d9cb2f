#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Rotation phase estimation for persistence-of-vision displays (hardware-agnostic).
//!
//! Switches mounted around the rotation fire once per revolution each. This crate turns
//! those irregular, sometimes missed, trigger timestamps into a phase in [0, 1) that the
//! render loop can query at any instant. All hardware goes through
//! `rotor_traits::Switch`.
//!
//! ## Architecture
//!
//! - **Log**: paired ring buffers of checkpoint timestamps and ordinals (`log`)
//! - **Reconstruction**: unwrapped step series with missed triggers filled in
//!   (`reconstruct`)
//! - **Trend**: least-squares line over the step series (`trend`)
//! - **Engine**: reliability state machine and phase/speed queries (`engine`)
//! - **Sharing**: mutex handle and background poller for multi-threaded capture
//!   (`shared`, `poller`)
//!
//! ## Units
//!
//! Timestamps are `u64` microseconds. Rates are steps per second, where one step is
//! the distance between two adjacent switches.

pub mod builder;
pub mod config;
pub mod conversions;
pub mod engine;
pub mod error;
pub mod log;
pub mod mocks;
pub mod poller;
pub mod reconstruct;
pub mod roller;
pub mod shared;
pub mod status;
pub mod trend;
pub mod util;

pub use builder::RotationEngineBuilder;
pub use config::EngineCfg;
pub use engine::RotationEngine;
pub use error::{BuildError, Unreliability};
pub use log::{Checkpoint, CheckpointLog, Interval};
pub use shared::SharedEngine;
pub use status::{Diagnostics, EngineState, SensorState};
pub use trend::{LinearTrend, TrendEstimator};
