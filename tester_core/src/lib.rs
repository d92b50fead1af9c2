#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Sweep tester core (hardware-agnostic).
//!
//! Sweeps a programmable output from 0 to a reference maximum, samples the
//! device response several times per level, takes the median, and classifies
//! the device as PASS or FAIL against a ceiling. All hardware interaction goes
//! through the `tester_traits` peripheral traits and `Event`s.
//!
//! ## Architecture
//!
//! - **Sample buffer**: fixed-capacity readings + median (`buffer`)
//! - **Sweep**: output level ownership and stepping (`sweep`)
//! - **Acquisition**: N requests per settled level (`acquisition`)
//! - **Lifecycle**: button-gated state machine and decision (`TesterCore`)
//! - **Runner**: single-consumer event loop (`runner`)

pub mod acquisition;
pub mod buffer;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod core;
pub mod error;
pub mod hw_error;
pub mod report;
pub mod runner;
pub mod status;
pub mod sweep;

pub use crate::buffer::SampleBuffer;
pub use crate::builder::{DynCore, Missing, Set, Tester, TesterBuilder, TesterG, build_tester};
pub use crate::config::{DisplayCfg, SweepCfg};
pub use crate::core::TesterCore;
pub use crate::error::{BuildError, TesterError};
pub use crate::report::{RunReport, StepRecord};
pub use crate::runner::EventLoop;
pub use crate::status::{LifecycleState, Verdict};
pub use tester_traits::Event;
