//! State - controller reply
//!
//! Aggregated sensor snapshot for the most recent step.

use serde::{Deserialize, Serialize};

/// Reply status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    #[default]
    Ok,
    Error,
}

/// IMU reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImuReading {
    /// Angular velocity roll/pitch/yaw (rad/s)
    pub angular_velocity: [f32; 3],

    /// Orientation quaternion (w, x, y, z)
    pub orientation: [f32; 4],

    /// Linear acceleration x/y/z (m/s²)
    pub linear_acceleration: [f32; 3],
}

/// Per-actuator ESC telemetry
///
/// Every vector has one entry per actuator; entry `i` always belongs to
/// actuator id `i`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EscChannels {
    /// Motor angular velocity (rad/s)
    pub motor_angular_velocity: Vec<f32>,

    /// Temperature
    pub temperature: Vec<f32>,

    /// Current (A)
    pub current: Vec<f32>,

    /// Voltage (V)
    pub voltage: Vec<f32>,
}

impl EscChannels {
    /// Create channels filled with the given values
    pub fn filled(
        actuator_count: usize,
        motor_angular_velocity: f32,
        temperature: f32,
        current: f32,
        voltage: f32,
    ) -> Self {
        Self {
            motor_angular_velocity: vec![motor_angular_velocity; actuator_count],
            temperature: vec![temperature; actuator_count],
            current: vec![current; actuator_count],
            voltage: vec![voltage; actuator_count],
        }
    }

    /// Number of actuators covered
    pub fn len(&self) -> usize {
        self.motor_angular_velocity.len()
    }

    /// Whether no actuator is covered
    pub fn is_empty(&self) -> bool {
        self.motor_angular_velocity.is_empty()
    }
}

/// State reply sent to the agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Simulation time after the step (seconds)
    pub sim_time: f64,

    /// Reply status
    pub status: StatusCode,

    /// IMU channels, present iff the IMU sensor is enabled
    pub imu: Option<ImuReading>,

    /// ESC channels, present iff the ESC sensor is enabled
    pub esc: Option<EscChannels>,
}
