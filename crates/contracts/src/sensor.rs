//! Sensor messages published by the simulator
//!
//! The simulator delivers these from its own threads, in arbitrary order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// Sensor kinds the bridge can aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Inertial measurement unit, one message per tick
    Imu,
    /// Electronic speed controllers, one message per actuator per tick
    Esc,
}

impl SensorKind {
    /// Lowercase name used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imu => "imu",
            Self::Esc => "esc",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKind {
    type Err = ContractError;

    /// Case-insensitive parse of `imu` / `esc`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("imu") {
            Ok(Self::Imu)
        } else if trimmed.eq_ignore_ascii_case("esc") {
            Ok(Self::Esc)
        } else {
            Err(ContractError::config_parse(format!(
                "unknown sensor kind '{trimmed}'"
            )))
        }
    }
}

/// IMU message
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImuMessage {
    /// Angular velocity x/y/z (rad/s)
    pub angular_velocity: [f64; 3],

    /// Orientation quaternion (w, x, y, z)
    pub orientation: [f64; 4],

    /// Linear acceleration x/y/z (m/s²)
    pub linear_acceleration: [f64; 3],
}

/// ESC message for a single actuator
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EscMessage {
    /// Actuator id
    pub id: u32,

    /// Motor speed (rad/s)
    pub motor_speed: f64,

    /// Temperature
    pub temperature: f64,

    /// Current (A)
    pub current: f64,

    /// Voltage (V)
    pub voltage: f64,
}

/// Message delivered on a sensor topic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SensorMessage {
    Imu(ImuMessage),
    Esc(EscMessage),
}

impl SensorMessage {
    /// Kind of the sensor that produced this message
    pub fn kind(&self) -> SensorKind {
        match self {
            Self::Imu(_) => SensorKind::Imu,
            Self::Esc(_) => SensorKind::Esc,
        }
    }
}
