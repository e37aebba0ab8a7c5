//! StepController - one action in, one tick (or settle sequence), one reply out

use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{
    Action, BridgeConfig, MotorCommand, SensorKind, SettleConfig, Simulator, State, StatusCode,
    WorldControl,
};
use sync_engine::SharedSensorState;
use tracing::{debug, error, info, trace, warn};
use transport::UdpTransport;

use crate::metrics::ControllerMetrics;

/// Outcome of one poll of the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    /// Nothing was waiting
    Idle,
    /// Datagram could not be decoded; no reply sent
    Dropped(&'static str),
    /// Reply sent
    Replied(StatusCode),
    /// Reply could not be sent
    SendFailed,
}

/// Drives the simulator in lock-step with agent actions
pub struct StepController {
    simulator: Arc<dyn Simulator>,
    shared: Arc<SharedSensorState>,
    motor_topic: String,
    actuator_count: usize,
    expected_per_step: u32,
    imu_enabled: bool,
    settle: SettleConfig,
    sensor_timeout: Option<Duration>,
    metrics: Arc<ControllerMetrics>,
}

impl StepController {
    pub fn new(
        simulator: Arc<dyn Simulator>,
        shared: Arc<SharedSensorState>,
        config: &BridgeConfig,
    ) -> Self {
        Self {
            simulator,
            shared,
            motor_topic: config.sensors.topics.motor_command_topic(),
            actuator_count: config.sensors.actuator_count,
            expected_per_step: config.callback_budget().expected_per_step,
            imu_enabled: config.sensors.is_enabled(SensorKind::Imu),
            settle: config.settle.clone(),
            sensor_timeout: config.controller.sensor_timeout(),
            metrics: Arc::new(ControllerMetrics::new()),
        }
    }

    /// Shared metrics
    pub fn metrics(&self) -> Arc<ControllerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Receive at most one datagram and answer it
    pub fn serve_once(&self, transport: &mut UdpTransport) -> Served {
        let Some(datagram) = transport.try_receive() else {
            return Served::Idle;
        };

        let action = match protocol::decode_action(&datagram) {
            Ok(action) => action,
            Err(e) => {
                debug!(bytes = datagram.len(), error = %e, "Dropping undecodable datagram");
                self.metrics.record_dropped(e.reason());
                return Served::Dropped(e.reason());
            }
        };

        let state = self.handle(&action);
        let payload = protocol::encode_state(&state);
        match transport.send(&payload) {
            Ok(_) => {
                self.metrics.record_reply(state.status);
                Served::Replied(state.status)
            }
            Err(e) => {
                self.metrics.record_send_failure();
                warn!(error = %e, "Failed to send reply");
                Served::SendFailed
            }
        }
    }

    /// Execute one decoded action and build its reply
    pub fn handle(&self, action: &Action) -> State {
        match action.command {
            WorldControl::Reset => self.reset(),
            WorldControl::Step => self.step(&action.actuator_commands),
        }
    }

    /// Forward actuator commands, advance exactly one tick, reply
    fn step(&self, commands: &[f32]) -> State {
        if commands.len() != self.actuator_count {
            warn!(
                received = commands.len(),
                expected = self.actuator_count,
                "Actuator command count mismatch, not stepping"
            );
            return self.reply(StatusCode::Error);
        }

        let command = MotorCommand {
            motor: commands.to_vec(),
        };
        let status = if self.tick(Some(&command)) {
            StatusCode::Ok
        } else {
            StatusCode::Error
        };
        self.metrics.record_step();
        self.reply(status)
    }

    /// Reset the world and tick until the IMU reports the body at rest
    ///
    /// Every reset is followed by a fresh tick, so a reading from before the
    /// reset can never end the sequence. Without an IMU there is nothing to
    /// settle and one cycle is run.
    fn reset(&self) -> State {
        let started = Instant::now();
        let mut ticks = 0u64;

        let status = loop {
            self.simulator.reset();
            let completed = self.tick(None);
            ticks += 1;

            if !completed {
                break StatusCode::Error;
            }
            if !self.imu_enabled || self.shared.is_settled(&self.settle) {
                break StatusCode::Ok;
            }
            if ticks >= self.settle.max_ticks {
                warn!(
                    ticks,
                    tolerance = self.settle.tolerance,
                    "World did not settle within the tick limit"
                );
                break StatusCode::Error;
            }
            trace!(ticks, "Not settled yet");
        };

        self.metrics.record_reset(ticks);
        info!(
            ticks,
            status = ?status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Reset complete"
        );
        self.reply(status)
    }

    /// Arm the barrier, optionally publish a command, tick once and wait
    ///
    /// Returns `false` if the tick failed or sensors did not all report.
    fn tick(&self, command: Option<&MotorCommand>) -> bool {
        self.shared.arm(self.expected_per_step);

        if let Some(command) = command {
            if let Err(e) = self
                .simulator
                .publish_motor_command(&self.motor_topic, command)
            {
                error!(topic = %self.motor_topic, error = %e, "Motor command rejected");
                return false;
            }
        }

        if let Err(e) = self.simulator.step(1) {
            error!(error = %e, "Simulator step failed");
            return false;
        }

        let started = Instant::now();
        let completed = self.shared.await_with(self.sensor_timeout);
        self.metrics.record_sensor_wait(started.elapsed(), completed);
        completed
    }

    fn reply(&self, status: StatusCode) -> State {
        self.shared.snapshot(self.simulator.sim_time(), status)
    }
}

impl std::fmt::Debug for StepController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepController")
            .field("motor_topic", &self.motor_topic)
            .field("actuator_count", &self.actuator_count)
            .field("expected_per_step", &self.expected_per_step)
            .field("settle", &self.settle)
            .field("sensor_timeout", &self.sensor_timeout)
            .finish()
    }
}
