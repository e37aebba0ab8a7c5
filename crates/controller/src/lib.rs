//! # Controller
//!
//! Lock-step control loop between the agent and the simulator.
//!
//! ## Flow
//! ```text
//! Idle → Dispatch → (Reset | Step) → AwaitSensors → Reply → Idle
//! ```
//!
//! - `StepController`: serves one action per poll
//! - `ControlLoopHandle`: dedicated `steplink-control` thread with a stop flag
//! - `Bridge`: ordered bootstrap and teardown of the whole bridge

mod bootstrap;
mod controller;
mod error;
mod handle;
mod metrics;

pub use bootstrap::Bridge;
pub use controller::{Served, StepController};
pub use error::BridgeError;
pub use handle::{ControlLoopHandle, CONTROL_THREAD_NAME};
pub use metrics::{ControllerMetrics, MetricsSnapshot};
