//! BridgeConfig - Config Loader output
//!
//! Static configuration, parsed once at startup and read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

use crate::SensorKind;

/// Default SITL port
pub const DEFAULT_SITL_PORT: u16 = 9002;

/// Default receive buffer size for one action datagram
pub const DEFAULT_MAX_DATAGRAM_SIZE: usize = 1024;

/// Complete bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BridgeConfig {
    /// UDP endpoint
    #[validate(nested)]
    pub network: NetworkConfig,

    /// Enabled sensors, actuator count and topics
    #[validate(nested)]
    pub sensors: SensorConfig,

    /// Digital twin insertion
    #[validate(nested)]
    pub twin: TwinConfig,

    /// Reset settle tuning
    #[serde(default)]
    #[validate(nested)]
    pub settle: SettleConfig,

    /// Control loop tuning
    #[serde(default)]
    #[validate(nested)]
    pub controller: ControllerConfig,
}

impl BridgeConfig {
    /// Callback budget derived from the sensor configuration
    pub fn callback_budget(&self) -> CallbackBudget {
        self.sensors.callback_budget()
    }
}

/// UDP endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NetworkConfig {
    /// IPv4 bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: Ipv4Addr,

    /// UDP port
    #[serde(default = "default_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    /// Receive buffer size for one action datagram
    #[serde(default = "default_max_datagram_size")]
    #[validate(range(min = 16, max = 65507))]
    pub max_datagram_size: usize,
}

impl NetworkConfig {
    /// Socket address to bind
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.bind_addr, self.port))
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            max_datagram_size: default_max_datagram_size(),
        }
    }
}

fn default_bind_addr() -> Ipv4Addr {
    Ipv4Addr::LOCALHOST
}

fn default_port() -> u16 {
    DEFAULT_SITL_PORT
}

fn default_max_datagram_size() -> usize {
    DEFAULT_MAX_DATAGRAM_SIZE
}

/// Sensor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SensorConfig {
    /// Enabled sensor kinds
    pub enabled: BTreeSet<SensorKind>,

    /// Number of actuators (motors / ESCs)
    #[validate(range(max = 256))]
    pub actuator_count: usize,

    /// Topic names
    #[serde(default)]
    #[validate(nested)]
    pub topics: TopicConfig,
}

impl SensorConfig {
    /// Whether a sensor kind is enabled
    pub fn is_enabled(&self, kind: SensorKind) -> bool {
        self.enabled.contains(&kind)
    }

    /// Number of callbacks expected per tick
    pub fn callback_budget(&self) -> CallbackBudget {
        CallbackBudget::compute(&self.enabled, self.actuator_count)
    }
}

/// Topic name templates
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TopicConfig {
    /// Namespace that `~/` topics resolve under
    #[serde(default)]
    pub robot_namespace: String,

    /// IMU topic
    #[serde(default = "default_imu_topic")]
    #[validate(length(min = 1))]
    pub imu: String,

    /// ESC topic prefix; actuator `i` publishes on `<prefix>/<i>`
    #[serde(default = "default_esc_topic_prefix")]
    #[validate(length(min = 1))]
    pub esc_prefix: String,

    /// Motor command topic
    #[serde(default = "default_motor_command_topic")]
    #[validate(length(min = 1))]
    pub motor_command: String,
}

impl TopicConfig {
    /// Resolved IMU topic
    pub fn imu_topic(&self) -> String {
        self.resolve(&self.imu)
    }

    /// Resolved ESC topic of one actuator
    pub fn esc_topic(&self, actuator_id: usize) -> String {
        format!("{}/{}", self.resolve(&self.esc_prefix), actuator_id)
    }

    /// Resolved motor command topic
    pub fn motor_command_topic(&self) -> String {
        self.resolve(&self.motor_command)
    }

    /// Expand a leading `~` to the robot namespace
    fn resolve(&self, topic: &str) -> String {
        match topic.strip_prefix('~') {
            Some(rest) if self.robot_namespace.is_empty() => rest.to_string(),
            Some(rest) => format!("/{}{}", self.robot_namespace.trim_matches('/'), rest),
            None => topic.to_string(),
        }
    }
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            robot_namespace: String::new(),
            imu: default_imu_topic(),
            esc_prefix: default_esc_topic_prefix(),
            motor_command: default_motor_command_topic(),
        }
    }
}

fn default_imu_topic() -> String {
    "/aircraft/sensor/imu".to_string()
}

fn default_esc_topic_prefix() -> String {
    "/aircraft/sensor/esc".to_string()
}

fn default_motor_command_topic() -> String {
    "/aircraft/command/motor".to_string()
}

/// Digital twin insertion configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TwinConfig {
    /// Model definition file
    pub model_path: PathBuf,

    /// Training rig the twin is attached to
    #[serde(default)]
    #[validate(nested)]
    pub rig: RigConfig,
}

/// Training rig coupling
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RigConfig {
    /// Twin link attached to the rig (matched by name suffix)
    #[serde(default = "default_attach_link")]
    #[validate(length(min = 1))]
    pub attach_link: String,

    /// Training rig model name
    #[serde(default = "default_rig_model")]
    #[validate(length(min = 1))]
    pub rig_model: String,

    /// Rig link the joint pivots on
    #[serde(default = "default_pivot_link")]
    #[validate(length(min = 1))]
    pub pivot_link: String,

    /// Name of the created joint
    #[serde(default = "default_joint_name")]
    #[validate(length(min = 1))]
    pub joint_name: String,

    /// How long to wait for the inserted model to appear (ms)
    #[serde(default = "default_insert_timeout_ms")]
    #[validate(range(min = 1))]
    pub insert_timeout_ms: u64,

    /// Poll interval while waiting for the model (ms)
    #[serde(default = "default_insert_poll_ms")]
    #[validate(range(min = 1))]
    pub insert_poll_ms: u64,
}

impl RigConfig {
    /// Insertion timeout
    pub fn insert_timeout(&self) -> Duration {
        Duration::from_millis(self.insert_timeout_ms)
    }

    /// Insertion poll interval
    pub fn insert_poll_interval(&self) -> Duration {
        Duration::from_millis(self.insert_poll_ms)
    }
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            attach_link: default_attach_link(),
            rig_model: default_rig_model(),
            pivot_link: default_pivot_link(),
            joint_name: default_joint_name(),
            insert_timeout_ms: default_insert_timeout_ms(),
            insert_poll_ms: default_insert_poll_ms(),
        }
    }
}

fn default_attach_link() -> String {
    "cg".to_string()
}

fn default_rig_model() -> String {
    "attitude_control_training_rig".to_string()
}

fn default_pivot_link() -> String {
    "pivot".to_string()
}

fn default_joint_name() -> String {
    "ball_joint".to_string()
}

fn default_insert_timeout_ms() -> u64 {
    30_000
}

fn default_insert_poll_ms() -> u64 {
    100
}

/// Reset settle tuning
///
/// Both thresholds are empirical; neither is a correctness requirement.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SettleConfig {
    /// Max |angular velocity| per axis considered at rest (rad/s)
    #[serde(default = "default_settle_tolerance")]
    #[validate(range(min = 0.0))]
    pub tolerance: f64,

    /// Minimum IMU samples observed before a reading may count as settled
    #[serde(default = "default_settle_min_samples")]
    #[validate(range(min = 1))]
    pub min_samples: u64,

    /// Upper bound on settle ticks per reset
    #[serde(default = "default_settle_max_ticks")]
    #[validate(range(min = 1))]
    pub max_ticks: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            tolerance: default_settle_tolerance(),
            min_samples: default_settle_min_samples(),
            max_ticks: default_settle_max_ticks(),
        }
    }
}

fn default_settle_tolerance() -> f64 {
    // About 1 deg/s
    0.017
}

fn default_settle_min_samples() -> u64 {
    2
}

fn default_settle_max_ticks() -> u64 {
    10_000
}

/// Control loop tuning
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ControllerConfig {
    /// Max wait for one tick's sensor callbacks (ms, 0 = unbounded)
    #[serde(default = "default_sensor_timeout_ms")]
    pub sensor_timeout_ms: u64,

    /// Sleep between empty polls (µs, 0 = yield only)
    #[serde(default = "default_idle_backoff_us")]
    #[validate(range(max = 100_000))]
    pub idle_backoff_us: u64,
}

impl ControllerConfig {
    /// Sensor wait bound, `None` when unbounded
    pub fn sensor_timeout(&self) -> Option<Duration> {
        (self.sensor_timeout_ms > 0).then(|| Duration::from_millis(self.sensor_timeout_ms))
    }

    /// Sleep between empty polls
    pub fn idle_backoff(&self) -> Duration {
        Duration::from_micros(self.idle_backoff_us)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sensor_timeout_ms: default_sensor_timeout_ms(),
            idle_backoff_us: default_idle_backoff_us(),
        }
    }
}

fn default_sensor_timeout_ms() -> u64 {
    5_000
}

fn default_idle_backoff_us() -> u64 {
    100
}

/// Number of sensor callbacks expected after each tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackBudget {
    pub expected_per_step: u32,
}

impl CallbackBudget {
    /// `1` for the IMU plus one per actuator for the ESCs
    pub fn compute(enabled: &BTreeSet<SensorKind>, actuator_count: usize) -> Self {
        let expected = enabled
            .iter()
            .map(|kind| match kind {
                SensorKind::Imu => 1,
                SensorKind::Esc => actuator_count,
            })
            .sum::<usize>();

        Self {
            expected_per_step: u32::try_from(expected).unwrap_or(u32::MAX),
        }
    }
}
