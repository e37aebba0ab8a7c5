//! ESC sensor adapter

use std::sync::Arc;

use contracts::{SensorKind, SensorMessage};
use sync_engine::SharedSensorState;
use tracing::{debug, trace};

use crate::adapter::SensorAdapter;
use crate::stats::IngestionMetrics;

/// ESC sensor adapter for one actuator topic
///
/// The store slot is chosen by the id carried in the message, not by the
/// topic; a mismatch is only logged.
pub struct EscAdapter {
    topic: String,
    actuator_id: u32,
    shared: Arc<SharedSensorState>,
    metrics: Arc<IngestionMetrics>,
}

impl EscAdapter {
    /// Create a new ESC adapter
    pub fn new(
        topic: String,
        actuator_id: u32,
        shared: Arc<SharedSensorState>,
        metrics: Arc<IngestionMetrics>,
    ) -> Self {
        Self {
            topic,
            actuator_id,
            shared,
            metrics,
        }
    }

    /// Actuator the topic belongs to
    pub fn actuator_id(&self) -> u32 {
        self.actuator_id
    }
}

impl SensorAdapter for EscAdapter {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn sensor_kind(&self) -> SensorKind {
        SensorKind::Esc
    }

    fn handle(&self, message: SensorMessage) {
        if let SensorMessage::Esc(esc) = &message {
            if esc.id != self.actuator_id {
                debug!(
                    topic = %self.topic,
                    expected = self.actuator_id,
                    got = esc.id,
                    "ESC id differs from topic"
                );
            }
            trace!(topic = %self.topic, id = esc.id, "ESC message");
        }
        super::apply_and_record(&self.shared, &self.metrics, &self.topic, message);
    }
}
