//! Protobuf message definitions
//!
//! Hand-written prost derives; the tags are the wire contract with agents.
//!
//! ```text
//! message Action {
//!   WorldControl world_control = 1;   // STEP = 0, RESET = 1
//!   repeated float motor = 2;         // packed
//! }
//!
//! message State {
//!   double sim_time = 1;
//!   StatusCode status_code = 2;       // OK = 0, ERROR = 1
//!   repeated float imu_angular_velocity_rpy = 3;
//!   repeated float imu_orientation_quat = 4;
//!   repeated float imu_linear_acceleration_xyz = 5;
//!   repeated float esc_motor_angular_velocity = 6;
//!   repeated float esc_temperature = 7;
//!   repeated float esc_current = 8;
//!   repeated float esc_voltage = 9;
//! }
//! ```

/// Simulation control command
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum WorldControl {
    Step = 0,
    Reset = 1,
}

/// Reply status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum StatusCode {
    Ok = 0,
    Error = 1,
}

/// Inbound action
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Action {
    #[prost(enumeration = "WorldControl", tag = "1")]
    pub world_control: i32,

    #[prost(float, repeated, tag = "2")]
    pub motor: Vec<f32>,
}

/// Outbound sensor state
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct State {
    #[prost(double, tag = "1")]
    pub sim_time: f64,

    #[prost(enumeration = "StatusCode", tag = "2")]
    pub status_code: i32,

    #[prost(float, repeated, tag = "3")]
    pub imu_angular_velocity_rpy: Vec<f32>,

    #[prost(float, repeated, tag = "4")]
    pub imu_orientation_quat: Vec<f32>,

    #[prost(float, repeated, tag = "5")]
    pub imu_linear_acceleration_xyz: Vec<f32>,

    #[prost(float, repeated, tag = "6")]
    pub esc_motor_angular_velocity: Vec<f32>,

    #[prost(float, repeated, tag = "7")]
    pub esc_temperature: Vec<f32>,

    #[prost(float, repeated, tag = "8")]
    pub esc_current: Vec<f32>,

    #[prost(float, repeated, tag = "9")]
    pub esc_voltage: Vec<f32>,
}
