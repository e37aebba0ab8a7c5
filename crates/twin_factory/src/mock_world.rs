//! MockWorld - in-process simulator
//!
//! Rigid-body attitude dynamics driven by motor commands, plus just enough
//! scene graph for twin insertion. Sensor messages for a tick are published
//! on worker threads in shuffled order, like a real engine's sensor
//! subsystems.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::f64::consts::TAU;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use contracts::{
    ContractError, EscMessage, ImuMessage, JointHandle, JointSpec, LinkHandle, LinkInfo,
    ModelDescriptor, ModelHandle, MotorCommand, RigConfig, SensorCallback, SensorMessage,
    Simulator, SubscriptionId, TopicConfig,
};
use nalgebra::{UnitQuaternion, Vector3};
use rand::seq::SliceRandom;
use tracing::{debug, trace};

use crate::descriptor::element_names;

const GRAVITY: f64 = 9.81;
const MAX_MOTOR_SPEED: f64 = 1_000.0;
const MOTOR_RESPONSE: f64 = 0.5;
const AMBIENT_TEMPERATURE: f64 = 25.0;
const BATTERY_VOLTAGE: f64 = 16.8;

/// MockWorld configuration
#[derive(Debug, Clone)]
pub struct MockWorldConfig {
    /// Number of motors / ESCs
    pub actuator_count: usize,
    /// Topic names the world publishes on and listens to
    pub topics: TopicConfig,
    /// Simulated seconds per tick
    pub step_size: f64,
    /// Body angular velocity at creation (rad/s)
    pub initial_angular_velocity: [f64; 3],
    /// Per-tick angular velocity decay factor
    pub velocity_decay: f64,
    /// Angular velocity factor kept across a reset
    pub reset_damping: f64,
    /// Torque per unit motor command
    pub motor_torque_gain: f64,
    /// Delay before an inserted model shows up
    pub insertion_delay: Duration,
    /// Accept insertions but never materialize them
    pub drop_insertions: bool,
    /// Pre-populate the attitude training rig model
    pub with_training_rig: bool,
    /// Publish sensor messages from worker threads after `step` returns
    pub async_delivery: bool,
}

impl Default for MockWorldConfig {
    fn default() -> Self {
        Self {
            actuator_count: 4,
            topics: TopicConfig::default(),
            step_size: 0.001,
            initial_angular_velocity: [0.4, -0.3, 0.2],
            velocity_decay: 0.6,
            reset_damping: 0.5,
            motor_torque_gain: 0.05,
            insertion_delay: Duration::ZERO,
            drop_insertions: false,
            with_training_rig: true,
            async_delivery: true,
        }
    }
}

#[derive(Debug, Clone)]
struct MockModel {
    name: String,
    links: Vec<String>,
}

impl MockModel {
    fn new(name: &str, links: impl IntoIterator<Item = String>) -> Self {
        Self {
            name: name.to_string(),
            links: links
                .into_iter()
                .map(|link| format!("{name}::{link}"))
                .collect(),
        }
    }
}

struct WorldState {
    sim_time: f64,
    ticks: u64,
    resets: u64,
    paused: bool,

    angular_velocity: Vector3<f64>,
    orientation: UnitQuaternion<f64>,
    motor_speeds: Vec<f64>,
    command: Vec<f64>,
    motor_history: Vec<MotorCommand>,
    scripted_imu: VecDeque<[f64; 3]>,

    models: Vec<MockModel>,
    pending: Vec<(Instant, MockModel)>,
    joints: Vec<JointSpec>,

    subscriptions: BTreeMap<SubscriptionId, (String, SensorCallback)>,
    next_subscription: SubscriptionId,
    rejected_topics: HashSet<String>,
}

impl WorldState {
    fn promote_pending(&mut self) {
        let now = Instant::now();
        let (ready, waiting): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|(ready_at, _)| *ready_at <= now);
        self.pending = waiting;
        for (_, model) in ready {
            debug!(model = %model.name, "Model materialized");
            self.models.push(model);
        }
    }

    fn link_exists(&self, link: LinkHandle) -> bool {
        self.models
            .get(link.model.0 as usize)
            .is_some_and(|model| (link.index as usize) < model.links.len())
    }
}

/// In-process `Simulator`
pub struct MockWorld {
    config: MockWorldConfig,
    imu_topic: String,
    esc_topics: HashMap<String, u32>,
    motor_topic: String,
    state: Mutex<WorldState>,
}

impl MockWorld {
    /// Create a world
    pub fn new(config: MockWorldConfig) -> Self {
        let imu_topic = config.topics.imu_topic();
        let esc_topics = (0..config.actuator_count)
            .map(|id| (config.topics.esc_topic(id), id as u32))
            .collect();
        let motor_topic = config.topics.motor_command_topic();

        let mut models = Vec::new();
        if config.with_training_rig {
            let rig = RigConfig::default();
            models.push(MockModel::new(
                &rig.rig_model,
                ["base".to_string(), rig.pivot_link],
            ));
        }

        let state = WorldState {
            sim_time: 0.0,
            ticks: 0,
            resets: 0,
            paused: false,
            angular_velocity: Vector3::from(config.initial_angular_velocity),
            orientation: UnitQuaternion::identity(),
            motor_speeds: vec![0.0; config.actuator_count],
            command: vec![0.0; config.actuator_count],
            motor_history: Vec::new(),
            scripted_imu: VecDeque::new(),
            models,
            pending: Vec::new(),
            joints: Vec::new(),
            subscriptions: BTreeMap::new(),
            next_subscription: 1,
            rejected_topics: HashSet::new(),
        };

        Self {
            config,
            imu_topic,
            esc_topics,
            motor_topic,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WorldState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// World configuration
    pub fn config(&self) -> &MockWorldConfig {
        &self.config
    }

    /// Ticks advanced since creation
    pub fn tick_count(&self) -> u64 {
        self.lock().ticks
    }

    /// Resets performed since creation
    pub fn reset_count(&self) -> u64 {
        self.lock().resets
    }

    /// Every motor command received, oldest first
    pub fn motor_commands(&self) -> Vec<MotorCommand> {
        self.lock().motor_history.clone()
    }

    /// Current body angular velocity
    pub fn angular_velocity(&self) -> [f64; 3] {
        self.lock().angular_velocity.into()
    }

    /// Joints created so far
    pub fn joints(&self) -> Vec<JointSpec> {
        self.lock().joints.clone()
    }

    /// Number of live subscriptions
    pub fn subscription_count(&self) -> usize {
        self.lock().subscriptions.len()
    }

    /// Queue angular velocities reported by the next ticks, one per tick
    ///
    /// A scripted reading also becomes the body state, so dynamics continue
    /// from it.
    pub fn script_angular_velocity(&self, readings: impl IntoIterator<Item = [f64; 3]>) {
        self.lock().scripted_imu.extend(readings);
    }

    /// Make future subscriptions to `topic` fail
    pub fn reject_topic(&self, topic: impl Into<String>) {
        self.lock().rejected_topics.insert(topic.into());
    }

    /// Deliver a message to every subscriber of `topic` on the calling thread
    ///
    /// Returns the number of callbacks invoked.
    pub fn deliver(&self, topic: &str, message: SensorMessage) -> usize {
        let callbacks: Vec<SensorCallback> = self
            .lock()
            .subscriptions
            .values()
            .filter(|(t, _)| t == topic)
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in &callbacks {
            callback(message);
        }
        callbacks.len()
    }

    /// Advance the dynamics one tick and collect the resulting messages
    fn advance(&self, state: &mut WorldState) -> Vec<(SensorCallback, SensorMessage)> {
        let cfg = &self.config;
        let dt = cfg.step_size;

        let torque = body_torque(&state.command) * cfg.motor_torque_gain;
        state.angular_velocity = state.angular_velocity * cfg.velocity_decay + torque;
        if let Some(scripted) = state.scripted_imu.pop_front() {
            state.angular_velocity = Vector3::from(scripted);
        }
        state.orientation *= UnitQuaternion::from_scaled_axis(state.angular_velocity * dt);

        for (speed, command) in state.motor_speeds.iter_mut().zip(&state.command) {
            let target = command.clamp(0.0, 1.0) * MAX_MOTOR_SPEED;
            *speed += (target - *speed) * MOTOR_RESPONSE;
        }

        state.sim_time += dt;
        state.ticks += 1;

        let imu = self.imu_message(state);
        state
            .subscriptions
            .values()
            .filter_map(|(topic, callback)| {
                let message = if *topic == self.imu_topic {
                    SensorMessage::Imu(imu)
                } else {
                    let id = *self.esc_topics.get(topic)?;
                    SensorMessage::Esc(esc_message(id, state.motor_speeds[id as usize]))
                };
                Some((Arc::clone(callback), message))
            })
            .collect()
    }

    fn imu_message(&self, state: &WorldState) -> ImuMessage {
        let q = state.orientation.quaternion();
        let gravity_body = state.orientation.inverse() * Vector3::new(0.0, 0.0, GRAVITY);
        ImuMessage {
            angular_velocity: state.angular_velocity.into(),
            orientation: [q.w, q.i, q.j, q.k],
            linear_acceleration: gravity_body.into(),
        }
    }

    fn publish(&self, mut deliveries: Vec<(SensorCallback, SensorMessage)>) {
        if !self.config.async_delivery {
            for (callback, message) in deliveries {
                callback(message);
            }
            return;
        }

        deliveries.shuffle(&mut rand::rng());
        for (callback, message) in deliveries {
            thread::spawn(move || callback(message));
        }
    }
}

/// Roll/pitch/yaw torque of a symmetric multirotor with motors evenly spaced
/// around the hub and alternating spin direction
fn body_torque(command: &[f64]) -> Vector3<f64> {
    let n = command.len().max(1) as f64;
    command
        .iter()
        .enumerate()
        .fold(Vector3::zeros(), |acc, (i, c)| {
            let angle = TAU * i as f64 / n;
            let spin = if i % 2 == 0 { 1.0 } else { -1.0 };
            acc + Vector3::new(angle.sin(), -angle.cos(), spin) * *c
        })
}

fn esc_message(id: u32, speed: f64) -> EscMessage {
    EscMessage {
        id,
        motor_speed: speed,
        temperature: AMBIENT_TEMPERATURE + 0.01 * speed,
        current: 0.02 * speed,
        voltage: BATTERY_VOLTAGE - 0.001 * speed,
    }
}

impl Simulator for MockWorld {
    fn step(&self, ticks: u32) -> Result<(), ContractError> {
        for _ in 0..ticks {
            let deliveries = {
                let mut state = self.lock();
                self.advance(&mut state)
            };
            trace!(deliveries = deliveries.len(), "Tick advanced");
            self.publish(deliveries);
        }
        Ok(())
    }

    fn reset(&self) {
        let mut state = self.lock();
        state.sim_time = 0.0;
        state.resets += 1;
        state.angular_velocity *= self.config.reset_damping;
        state.orientation = UnitQuaternion::identity();
        state.motor_speeds.iter_mut().for_each(|s| *s = 0.0);
        state.command.iter_mut().for_each(|c| *c = 0.0);
        debug!(resets = state.resets, "World reset");
    }

    fn sim_time(&self) -> f64 {
        self.lock().sim_time
    }

    fn set_paused(&self, paused: bool) {
        self.lock().paused = paused;
    }

    fn is_paused(&self) -> bool {
        self.lock().paused
    }

    fn model_count(&self) -> usize {
        let mut state = self.lock();
        state.promote_pending();
        state.models.len()
    }

    fn insert_model(&self, descriptor: &ModelDescriptor) -> Result<(), ContractError> {
        let mut state = self.lock();
        state.promote_pending();

        let exists = state.models.iter().any(|m| m.name == descriptor.name)
            || state.pending.iter().any(|(_, m)| m.name == descriptor.name);
        if exists {
            return Err(ContractError::simulation(
                "insert_model",
                format!("model '{}' already exists", descriptor.name),
            ));
        }

        if self.config.drop_insertions {
            debug!(model = %descriptor.name, "Insertion dropped");
            return Ok(());
        }

        let model = MockModel::new(
            &descriptor.name,
            element_names(&descriptor.document, "link"),
        );
        let ready_at = Instant::now() + self.config.insertion_delay;
        state.pending.push((ready_at, model));
        Ok(())
    }

    fn model_by_name(&self, name: &str) -> Option<ModelHandle> {
        let mut state = self.lock();
        state.promote_pending();
        state
            .models
            .iter()
            .position(|m| m.name == name)
            .map(|idx| ModelHandle(idx as u32))
    }

    fn links(&self, model: ModelHandle) -> Vec<LinkInfo> {
        let state = self.lock();
        state
            .models
            .get(model.0 as usize)
            .map(|m| {
                m.links
                    .iter()
                    .enumerate()
                    .map(|(index, name)| LinkInfo {
                        handle: LinkHandle {
                            model,
                            index: index as u32,
                        },
                        name: name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn create_joint(&self, spec: &JointSpec) -> Result<JointHandle, ContractError> {
        let mut state = self.lock();
        if !state.link_exists(spec.parent) || !state.link_exists(spec.child) {
            return Err(ContractError::simulation(
                "create_joint",
                format!("joint '{}' references an unknown link", spec.name),
            ));
        }
        state.joints.push(spec.clone());
        Ok(JointHandle(state.joints.len() as u32 - 1))
    }

    fn subscribe(
        &self,
        topic: &str,
        callback: SensorCallback,
    ) -> Result<SubscriptionId, ContractError> {
        let mut state = self.lock();
        if state.rejected_topics.contains(topic) {
            return Err(ContractError::subscribe(topic, "topic rejected"));
        }
        let id = state.next_subscription;
        state.next_subscription += 1;
        state
            .subscriptions
            .insert(id, (topic.to_string(), callback));
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().subscriptions.remove(&id);
    }

    fn publish_motor_command(
        &self,
        topic: &str,
        command: &MotorCommand,
    ) -> Result<(), ContractError> {
        if topic != self.motor_topic {
            return Err(ContractError::simulation(
                "publish_motor_command",
                format!("no actuator listens on '{topic}'"),
            ));
        }

        let mut state = self.lock();
        for (slot, value) in state.command.iter_mut().zip(&command.motor) {
            *slot = f64::from(*value);
        }
        state.motor_history.push(command.clone());
        Ok(())
    }
}
