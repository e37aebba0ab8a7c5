//! Sensor adapter implementations

mod esc;
mod imu;

pub use esc::EscAdapter;
pub use imu::ImuAdapter;

use std::sync::Arc;

use contracts::SensorMessage;
use sync_engine::SharedSensorState;
use tracing::warn;

use crate::stats::IngestionMetrics;

/// Apply a message and account for the outcome
fn apply_and_record(
    shared: &SharedSensorState,
    metrics: &Arc<IngestionMetrics>,
    topic: &str,
    message: SensorMessage,
) {
    let kind = message.kind();
    match shared.apply(message) {
        Ok(()) => {
            metrics.record_applied();
            observability::record_sensor_message(kind);
        }
        Err(e) => {
            metrics.record_rejected();
            observability::record_sensor_rejected(kind);
            warn!(topic = %topic, error = %e, "Sensor message rejected");
        }
    }
}
