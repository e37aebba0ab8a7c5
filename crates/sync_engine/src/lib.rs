//! # Sync Engine
//!
//! Per-tick sensor synchronization.
//!
//! Responsibilities:
//! - Counted rendezvous between the control loop and sensor callbacks
//! - Latest-value store for every sensor channel
//! - One mutex guarding both, one condition variable for waiters
//!
//! ## Example
//!
//! ```
//! use contracts::{ImuMessage, SensorKind, SensorMessage};
//! use sync_engine::SharedSensorState;
//!
//! let shared = SharedSensorState::new([SensorKind::Imu].into_iter().collect(), 0);
//! shared.arm(1);
//! shared.apply(SensorMessage::Imu(ImuMessage::default())).unwrap();
//! shared.await_completion();
//! ```

mod barrier;
mod error;
mod shared;
mod store;

pub use barrier::CompletionCounter;
pub use error::SyncError;
pub use shared::SharedSensorState;
pub use store::{SensorStateStore, SENTINEL_ANGULAR_VELOCITY};
