//! # Contracts
//!
//! Frozen interface contracts shared by every steplink crate: the agent-facing
//! data model, the static bridge configuration and the `Simulator` capability
//! trait. Business crates depend on this crate only; reverse dependencies are
//! prohibited.
//!
//! ## Time Model
//! - Simulation time (seconds, f64) is owned by the simulator and advanced only
//!   by explicit ticks issued from the control loop.
//! - One `Step` action maps to exactly one tick.

mod action;
mod config;
mod error;
mod sensor;
mod simulator;
mod state;

pub use action::*;
pub use config::*;
pub use error::*;
pub use sensor::*;
pub use simulator::*;
pub use state::*;
