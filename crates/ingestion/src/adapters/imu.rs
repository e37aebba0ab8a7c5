//! IMU sensor adapter

use std::sync::Arc;

use contracts::{SensorKind, SensorMessage};
use sync_engine::SharedSensorState;
use tracing::trace;

use crate::adapter::SensorAdapter;
use crate::stats::IngestionMetrics;

/// IMU sensor adapter
pub struct ImuAdapter {
    topic: String,
    shared: Arc<SharedSensorState>,
    metrics: Arc<IngestionMetrics>,
}

impl ImuAdapter {
    /// Create a new IMU adapter
    pub fn new(
        topic: String,
        shared: Arc<SharedSensorState>,
        metrics: Arc<IngestionMetrics>,
    ) -> Self {
        Self {
            topic,
            shared,
            metrics,
        }
    }
}

impl SensorAdapter for ImuAdapter {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn sensor_kind(&self) -> SensorKind {
        SensorKind::Imu
    }

    fn handle(&self, message: SensorMessage) {
        trace!(topic = %self.topic, "IMU message");
        super::apply_and_record(&self.shared, &self.metrics, &self.topic, message);
    }
}
