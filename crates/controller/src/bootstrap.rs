//! Bridge - ordered bootstrap and teardown

use std::net::SocketAddr;
use std::sync::Arc;

use contracts::{BridgeConfig, Simulator};
use ingestion::SensorSubscriptions;
use sync_engine::SharedSensorState;
use tracing::{info, instrument, warn};
use transport::UdpTransport;
use twin_factory::{DigitalTwinFactory, TwinAttachment};

use crate::controller::StepController;
use crate::error::BridgeError;
use crate::handle::ControlLoopHandle;
use crate::metrics::ControllerMetrics;

/// A running bridge
///
/// Dropping it stops the control loop, then releases the sensor
/// subscriptions.
pub struct Bridge {
    local_addr: SocketAddr,
    attachment: TwinAttachment,
    metrics: Arc<ControllerMetrics>,
    control: Option<ControlLoopHandle>,
    subscriptions: Option<SensorSubscriptions>,
}

impl Bridge {
    /// Bring the bridge up
    ///
    /// Binds the socket, subscribes the sensor topics, seeds sentinels,
    /// attaches the digital twin, pauses the simulator clock and finally
    /// starts the control loop. Anything acquired before a failure is
    /// released again and no thread is left running.
    #[instrument(
        name = "bridge_bootstrap",
        skip_all,
        fields(addr = %config.network.socket_addr())
    )]
    pub fn bootstrap(
        config: &BridgeConfig,
        simulator: Arc<dyn Simulator>,
    ) -> Result<Self, BridgeError> {
        let budget = config.callback_budget();
        if budget.expected_per_step == 0 {
            warn!("No sensors enabled, replies will carry no sensor data");
        }

        let transport =
            UdpTransport::bind(config.network.socket_addr(), config.network.max_datagram_size)?;
        let local_addr = transport.local_addr()?;

        let shared = Arc::new(SharedSensorState::new(
            config.sensors.enabled.clone(),
            config.sensors.actuator_count,
        ));
        let subscriptions = SensorSubscriptions::subscribe_all(
            Arc::clone(&simulator),
            &config.sensors,
            Arc::clone(&shared),
        )?;
        shared.seed_sentinels();

        let attachment = DigitalTwinFactory::new(Arc::clone(&simulator), config.twin.rig.clone())
            .load_and_attach(&config.twin.model_path)?;

        simulator.set_paused(true);

        let controller = StepController::new(simulator, shared, config);
        let control = ControlLoopHandle::spawn(
            controller,
            transport,
            config.controller.idle_backoff(),
        )
        .map_err(BridgeError::Spawn)?;
        let metrics = Arc::clone(control.metrics());

        info!(
            local_addr = %local_addr,
            actuators = config.sensors.actuator_count,
            expected_per_step = budget.expected_per_step,
            twin = %attachment.name,
            "Bridge running"
        );

        Ok(Self {
            local_addr,
            attachment,
            metrics,
            control: Some(control),
            subscriptions: Some(subscriptions),
        })
    }

    /// Bound UDP address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handles of the attached digital twin
    pub fn attachment(&self) -> &TwinAttachment {
        &self.attachment
    }

    /// Control loop metrics
    pub fn metrics(&self) -> &Arc<ControllerMetrics> {
        &self.metrics
    }

    /// Whether the control loop is still running
    pub fn is_running(&self) -> bool {
        self.control
            .as_ref()
            .is_some_and(ControlLoopHandle::is_running)
    }

    /// Stop the control loop and release the subscriptions
    #[instrument(name = "bridge_shutdown", skip(self))]
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(control) = self.control.take() {
            control.shutdown();
        }
        if let Some(subscriptions) = self.subscriptions.take() {
            let topics = subscriptions.len();
            drop(subscriptions);
            info!(topics, "Bridge stopped");
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("local_addr", &self.local_addr)
            .field("attachment", &self.attachment)
            .field("running", &self.is_running())
            .finish()
    }
}
