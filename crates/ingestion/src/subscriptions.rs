//! Sensor topic subscriptions
//!
//! Wires one adapter per topic into the simulator: the IMU topic when the IMU
//! is enabled, and `<esc_prefix>/<i>` for every actuator when ESCs are.

use std::sync::Arc;

use contracts::{SensorConfig, SensorKind, SensorMessage, Simulator, SubscriptionId};
use sync_engine::SharedSensorState;
use tracing::{debug, info, instrument};

use crate::adapter::SensorAdapter;
use crate::adapters::{EscAdapter, ImuAdapter};
use crate::error::{IngestionError, Result};
use crate::stats::IngestionMetrics;

/// Active sensor subscriptions
///
/// Unsubscribes everything when dropped.
pub struct SensorSubscriptions {
    simulator: Arc<dyn Simulator>,
    active: Vec<(String, SubscriptionId)>,
    metrics: Arc<IngestionMetrics>,
}

impl SensorSubscriptions {
    /// Subscribe every configured sensor topic
    ///
    /// On failure the subscriptions made so far are released before the
    /// error is returned.
    #[instrument(name = "sensor_subscribe_all", skip_all)]
    pub fn subscribe_all(
        simulator: Arc<dyn Simulator>,
        config: &SensorConfig,
        shared: Arc<SharedSensorState>,
    ) -> Result<Self> {
        let metrics = Arc::new(IngestionMetrics::new());
        let mut subscriptions = Self {
            simulator,
            active: Vec::new(),
            metrics: Arc::clone(&metrics),
        };

        for adapter in Self::build_adapters(config, &shared, &metrics) {
            subscriptions.attach(adapter)?;
        }

        info!(
            topics = subscriptions.active.len(),
            expected_per_step = config.callback_budget().expected_per_step,
            "Sensor topics subscribed"
        );
        Ok(subscriptions)
    }

    fn build_adapters(
        config: &SensorConfig,
        shared: &Arc<SharedSensorState>,
        metrics: &Arc<IngestionMetrics>,
    ) -> Vec<Arc<dyn SensorAdapter>> {
        let mut adapters: Vec<Arc<dyn SensorAdapter>> = Vec::new();

        if config.is_enabled(SensorKind::Imu) {
            adapters.push(Arc::new(ImuAdapter::new(
                config.topics.imu_topic(),
                Arc::clone(shared),
                Arc::clone(metrics),
            )));
        }

        if config.is_enabled(SensorKind::Esc) {
            for id in 0..config.actuator_count {
                adapters.push(Arc::new(EscAdapter::new(
                    config.topics.esc_topic(id),
                    id as u32,
                    Arc::clone(shared),
                    Arc::clone(metrics),
                )));
            }
        }

        adapters
    }

    fn attach(&mut self, adapter: Arc<dyn SensorAdapter>) -> Result<()> {
        let topic = adapter.topic().to_string();
        let kind = adapter.sensor_kind();
        let callback = Arc::new(move |message: SensorMessage| adapter.handle(message));
        let id = self
            .simulator
            .subscribe(&topic, callback)
            .map_err(|source| IngestionError::SubscribeFailed {
                topic: topic.clone(),
                source,
            })?;

        debug!(topic = %topic, kind = %kind, subscription = id, "Subscribed");
        self.active.push((topic, id));
        Ok(())
    }

    /// Number of subscribed topics
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether nothing is subscribed
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Subscribed topic names, in subscription order
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(|(topic, _)| topic.as_str())
    }

    /// Shared callback counters
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl Drop for SensorSubscriptions {
    fn drop(&mut self) {
        for (topic, id) in self.active.drain(..) {
            self.simulator.unsubscribe(id);
            debug!(topic = %topic, subscription = id, "Unsubscribed");
        }
    }
}

impl std::fmt::Debug for SensorSubscriptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorSubscriptions")
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{EscMessage, ImuMessage, SensorMessage, StatusCode, TopicConfig};
    use twin_factory::{MockWorld, MockWorldConfig};

    fn sensor_config(kinds: &[SensorKind], actuators: usize) -> SensorConfig {
        SensorConfig {
            enabled: kinds.iter().copied().collect(),
            actuator_count: actuators,
            topics: TopicConfig::default(),
        }
    }

    fn setup(
        kinds: &[SensorKind],
        actuators: usize,
    ) -> (Arc<MockWorld>, Arc<SharedSensorState>, SensorSubscriptions) {
        let config = sensor_config(kinds, actuators);
        let world = Arc::new(MockWorld::new(MockWorldConfig::default()));
        let shared = Arc::new(SharedSensorState::new(config.enabled.clone(), actuators));
        let subs = SensorSubscriptions::subscribe_all(world.clone(), &config, shared.clone())
            .unwrap();
        (world, shared, subs)
    }

    #[test]
    fn test_topic_count_matches_budget() {
        for n in 0..6 {
            let (world, _, subs) = setup(&[SensorKind::Imu, SensorKind::Esc], n);
            assert_eq!(subs.len(), 1 + n);
            assert_eq!(world.subscription_count(), 1 + n);
        }

        let (_, _, subs) = setup(&[], 4);
        assert!(subs.is_empty());
    }

    #[test]
    fn test_esc_topics_follow_prefix() {
        let (_, _, subs) = setup(&[SensorKind::Esc], 3);
        let topics: Vec<_> = subs.topics().collect();
        assert_eq!(
            topics,
            vec![
                "/aircraft/sensor/esc/0",
                "/aircraft/sensor/esc/1",
                "/aircraft/sensor/esc/2"
            ]
        );
    }

    #[test]
    fn test_delivery_updates_store_and_counter() {
        let (world, shared, subs) = setup(&[SensorKind::Imu, SensorKind::Esc], 2);
        shared.arm(3);

        world.deliver(
            "/aircraft/sensor/esc/1",
            SensorMessage::Esc(EscMessage {
                id: 1,
                motor_speed: 42.0,
                ..Default::default()
            }),
        );
        world.deliver(
            "/aircraft/sensor/imu",
            SensorMessage::Imu(ImuMessage::default()),
        );
        assert_eq!(shared.outstanding(), 1);

        world.deliver(
            "/aircraft/sensor/esc/0",
            SensorMessage::Esc(EscMessage::default()),
        );
        shared.await_completion();

        let state = shared.snapshot(0.0, StatusCode::Ok);
        assert_eq!(state.esc.unwrap().motor_angular_velocity, vec![0.0, 42.0]);
        assert_eq!(subs.metrics().snapshot().messages_applied, 3);
    }

    #[test]
    fn test_out_of_range_id_rejected() {
        let (world, shared, subs) = setup(&[SensorKind::Esc], 2);
        shared.arm(1);
        world.deliver(
            "/aircraft/sensor/esc/1",
            SensorMessage::Esc(EscMessage {
                id: 7,
                ..Default::default()
            }),
        );
        assert_eq!(shared.outstanding(), 1);
        assert_eq!(subs.metrics().snapshot().messages_rejected, 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let (world, _, subs) = setup(&[SensorKind::Imu, SensorKind::Esc], 4);
        assert_eq!(world.subscription_count(), 5);
        drop(subs);
        assert_eq!(world.subscription_count(), 0);
    }

    #[test]
    fn test_subscribe_failure_releases_partial() {
        let config = sensor_config(&[SensorKind::Imu, SensorKind::Esc], 3);
        let world = Arc::new(MockWorld::new(MockWorldConfig::default()));
        world.reject_topic("/aircraft/sensor/esc/2");
        let shared = Arc::new(SharedSensorState::new(config.enabled.clone(), 3));

        let err = SensorSubscriptions::subscribe_all(world.clone(), &config, shared).unwrap_err();
        assert!(err.to_string().contains("/aircraft/sensor/esc/2"));
        assert_eq!(world.subscription_count(), 0);
    }
}
