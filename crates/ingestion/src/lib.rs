//! # Ingestion
//!
//! Sensor topic wiring.
//!
//! Responsibilities:
//! - Subscribe the IMU topic and one ESC topic per actuator
//! - Route delivered messages into the shared sensor store
//! - Count each accepted message towards the current tick
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::SensorSubscriptions;
//!
//! let subs = SensorSubscriptions::subscribe_all(simulator, &config.sensors, shared)?;
//! // ... run the control loop ...
//! drop(subs); // unsubscribes every topic
//! ```

mod adapter;
mod adapters;
mod error;
mod stats;
mod subscriptions;

// Re-exports
pub use adapter::SensorAdapter;
pub use adapters::{EscAdapter, ImuAdapter};
pub use error::{IngestionError, Result};
pub use stats::{IngestionMetrics, MetricsSnapshot};
pub use subscriptions::SensorSubscriptions;
