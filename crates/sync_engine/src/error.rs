//! Sync engine error types

use thiserror::Error;

/// Sensor update rejected by the store
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    /// ESC message for an actuator id outside the configured range
    #[error("ESC id {id} out of range for {actuator_count} actuators")]
    EscIdOutOfRange { id: u32, actuator_count: usize },

    /// Message for a sensor kind that is not enabled
    #[error("sensor '{0}' is not enabled")]
    SensorDisabled(contracts::SensorKind),
}
