//! Sensor adapter trait

use contracts::{SensorKind, SensorMessage};

/// Sensor adapter trait
///
/// One adapter per subscribed topic. Responsible for:
/// 1. Accepting messages delivered on simulator threads
/// 2. Writing them into the shared sensor store
/// 3. Counting the arrival towards the current tick
pub trait SensorAdapter: Send + Sync {
    /// Topic the adapter is bound to
    fn topic(&self) -> &str;

    /// Sensor kind handled
    fn sensor_kind(&self) -> SensorKind;

    /// Handle one delivered message
    fn handle(&self, message: SensorMessage);
}
