//! ControlLoopHandle - owns the control loop thread

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, instrument};
use transport::UdpTransport;

use crate::controller::{Served, StepController};
use crate::metrics::ControllerMetrics;

/// Name of the control loop thread
pub const CONTROL_THREAD_NAME: &str = "steplink-control";

/// Handle to a running control loop
///
/// Stopping is cooperative: the flag is checked between polls, so an action
/// already being served runs to completion first.
pub struct ControlLoopHandle {
    stop: Arc<AtomicBool>,
    metrics: Arc<ControllerMetrics>,
    worker: Option<JoinHandle<()>>,
}

impl ControlLoopHandle {
    /// Spawn the control loop; the thread takes ownership of the socket
    pub fn spawn(
        controller: StepController,
        transport: UdpTransport,
        idle_backoff: Duration,
    ) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let metrics = controller.metrics();

        let worker_stop = Arc::clone(&stop);
        let worker = thread::Builder::new()
            .name(CONTROL_THREAD_NAME.to_string())
            .spawn(move || control_loop(controller, transport, worker_stop, idle_backoff))?;

        Ok(Self {
            stop,
            metrics,
            worker: Some(worker),
        })
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<ControllerMetrics> {
        &self.metrics
    }

    /// Whether the thread is still running
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// Stop the loop and wait for the thread to exit
    #[instrument(name = "control_loop_shutdown", skip(self))]
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Control loop thread panicked");
            }
            debug!("Control loop joined");
        }
    }
}

impl Drop for ControlLoopHandle {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

impl std::fmt::Debug for ControlLoopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlLoopHandle")
            .field("running", &self.is_running())
            .finish()
    }
}

#[instrument(name = "control_loop", skip_all)]
fn control_loop(
    controller: StepController,
    mut transport: UdpTransport,
    stop: Arc<AtomicBool>,
    idle_backoff: Duration,
) {
    info!(
        local_addr = ?transport.local_addr().ok(),
        idle_backoff_us = idle_backoff.as_micros() as u64,
        "Control loop started"
    );

    while !stop.load(Ordering::Acquire) {
        if controller.serve_once(&mut transport) == Served::Idle {
            if idle_backoff.is_zero() {
                thread::yield_now();
            } else {
                thread::sleep(idle_backoff);
            }
        }
    }

    let snapshot = controller.metrics().snapshot();
    info!(
        steps = snapshot.steps,
        resets = snapshot.resets,
        dropped = snapshot.packets_dropped,
        "Control loop stopped"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        Action, BridgeConfig, ControllerConfig, NetworkConfig, SensorConfig, SensorKind,
        SettleConfig, StatusCode, TopicConfig, TwinConfig,
    };
    use ingestion::SensorSubscriptions;
    use std::net::UdpSocket;
    use std::path::PathBuf;
    use sync_engine::SharedSensorState;
    use twin_factory::{MockWorld, MockWorldConfig};

    fn config() -> BridgeConfig {
        BridgeConfig {
            network: NetworkConfig::default(),
            sensors: SensorConfig {
                enabled: [SensorKind::Imu, SensorKind::Esc].into_iter().collect(),
                actuator_count: 4,
                topics: TopicConfig::default(),
            },
            twin: TwinConfig {
                model_path: PathBuf::from("unused.sdf"),
                rig: Default::default(),
            },
            settle: SettleConfig::default(),
            controller: ControllerConfig::default(),
        }
    }

    #[test]
    fn test_serves_until_shutdown() {
        let config = config();
        let world = Arc::new(MockWorld::new(MockWorldConfig::default()));
        let shared = Arc::new(SharedSensorState::new(config.sensors.enabled.clone(), 4));
        let _subscriptions =
            SensorSubscriptions::subscribe_all(world.clone(), &config.sensors, shared.clone())
                .unwrap();

        let transport = UdpTransport::bind("127.0.0.1:0".parse().unwrap(), 1024).unwrap();
        let addr = transport.local_addr().unwrap();
        let controller = StepController::new(world.clone(), shared, &config);
        let handle =
            ControlLoopHandle::spawn(controller, transport, Duration::from_micros(100)).unwrap();
        assert!(handle.is_running());

        let agent = UdpSocket::bind("127.0.0.1:0").unwrap();
        agent
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        agent
            .send_to(&protocol::encode_action(&Action::step(vec![0.2; 4])), addr)
            .unwrap();

        let mut buf = [0u8; 1024];
        let (len, from) = agent.recv_from(&mut buf).unwrap();
        assert_eq!(from, addr);
        let state = protocol::decode_state(&buf[..len]).unwrap();
        assert_eq!(state.status, StatusCode::Ok);
        assert_eq!(world.tick_count(), 1);

        let metrics = Arc::clone(handle.metrics());
        handle.shutdown();
        assert_eq!(metrics.snapshot().steps, 1);
        assert_eq!(metrics.replies(), 1);
    }
}
