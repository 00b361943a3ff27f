//! Holdlight Control - Frame Loop
//!
//! Runs animation fills and a renderer against a shared panel:
//! - **Fill**: per-frame color update (`CycleHue`, `ToggleColors`)
//! - **Runner**: the locked fill + render loop on its own thread
//! - **Controller**: binds a panel and renderer, starts and stops runners
//! - **AppState**: the panel a front end loads layouts into

#![allow(missing_docs)]

pub mod controller;
pub mod error;
pub mod fill;
pub mod runner;
pub mod state;

pub use controller::Controller;
pub use error::{ControlError, Result};
pub use fill::{CycleHue, Fill, FillKind, ToggleColors};
pub use runner::{
    shared, FpsCounter, RunReport, Runner, RunnerConfig, RunnerHandle, RunnerState, SharedPanel,
    StartError,
};
pub use state::AppState;
