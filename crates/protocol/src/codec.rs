//! Action / State codec
//!
//! Converts between the contract types and their protobuf representation.

use contracts::{Action, EscChannels, ImuReading, State, StatusCode, WorldControl};
use prost::Message;
use tracing::trace;

use crate::error::ProtocolError;
use crate::wire;

/// Decode one inbound datagram into an action
///
/// A zero-length buffer is a valid all-default message: a Step with no
/// motor values.
///
/// # Errors
/// - `Decode` for malformed or truncated protobuf
/// - `UnknownWorldControl` for an out-of-range command value
pub fn decode_action(buf: &[u8]) -> Result<Action, ProtocolError> {
    let msg = wire::Action::decode(buf).inspect_err(|e| {
        trace!(bytes = buf.len(), error = %e, "Action decode failed");
    })?;
    let command = match wire::WorldControl::try_from(msg.world_control) {
        Ok(wire::WorldControl::Step) => WorldControl::Step,
        Ok(wire::WorldControl::Reset) => WorldControl::Reset,
        Err(_) => {
            trace!(value = msg.world_control, "Unknown world_control");
            return Err(ProtocolError::UnknownWorldControl(msg.world_control));
        }
    };

    Ok(Action {
        command,
        actuator_commands: msg.motor,
    })
}

/// Encode an action (agent side)
pub fn encode_action(action: &Action) -> Vec<u8> {
    let world_control = match action.command {
        WorldControl::Step => wire::WorldControl::Step,
        WorldControl::Reset => wire::WorldControl::Reset,
    };

    wire::Action {
        world_control: world_control as i32,
        motor: action.actuator_commands.clone(),
    }
    .encode_to_vec()
}

/// Encode a state reply
///
/// Absent sensor groups are encoded as empty repeated fields.
pub fn encode_state(state: &State) -> Vec<u8> {
    let status = match state.status {
        StatusCode::Ok => wire::StatusCode::Ok,
        StatusCode::Error => wire::StatusCode::Error,
    };

    let mut msg = wire::State {
        sim_time: state.sim_time,
        status_code: status as i32,
        ..Default::default()
    };

    if let Some(imu) = &state.imu {
        msg.imu_angular_velocity_rpy = imu.angular_velocity.to_vec();
        msg.imu_orientation_quat = imu.orientation.to_vec();
        msg.imu_linear_acceleration_xyz = imu.linear_acceleration.to_vec();
    }

    if let Some(esc) = &state.esc {
        msg.esc_motor_angular_velocity = esc.motor_angular_velocity.clone();
        msg.esc_temperature = esc.temperature.clone();
        msg.esc_current = esc.current.clone();
        msg.esc_voltage = esc.voltage.clone();
    }

    msg.encode_to_vec()
}

/// Decode a state reply (agent side)
///
/// A sensor group whose repeated fields are all empty decodes as `None`, so
/// an ESC group with zero actuators does not survive the round trip.
pub fn decode_state(buf: &[u8]) -> Result<State, ProtocolError> {
    if buf.is_empty() {
        return Err(ProtocolError::Empty);
    }

    let msg = wire::State::decode(buf)?;
    let status = match wire::StatusCode::try_from(msg.status_code) {
        Ok(wire::StatusCode::Ok) => StatusCode::Ok,
        Ok(wire::StatusCode::Error) => StatusCode::Error,
        Err(_) => return Err(ProtocolError::UnknownStatusCode(msg.status_code)),
    };

    Ok(State {
        sim_time: msg.sim_time,
        status,
        imu: decode_imu(&msg)?,
        esc: decode_esc(msg)?,
    })
}

fn decode_imu(msg: &wire::State) -> Result<Option<ImuReading>, ProtocolError> {
    if msg.imu_angular_velocity_rpy.is_empty()
        && msg.imu_orientation_quat.is_empty()
        && msg.imu_linear_acceleration_xyz.is_empty()
    {
        return Ok(None);
    }

    Ok(Some(ImuReading {
        angular_velocity: fixed("imu_angular_velocity_rpy", &msg.imu_angular_velocity_rpy)?,
        orientation: fixed("imu_orientation_quat", &msg.imu_orientation_quat)?,
        linear_acceleration: fixed(
            "imu_linear_acceleration_xyz",
            &msg.imu_linear_acceleration_xyz,
        )?,
    }))
}

fn decode_esc(msg: wire::State) -> Result<Option<EscChannels>, ProtocolError> {
    let actuator_count = msg.esc_motor_angular_velocity.len();
    let channels = [
        ("esc_temperature", msg.esc_temperature.len()),
        ("esc_current", msg.esc_current.len()),
        ("esc_voltage", msg.esc_voltage.len()),
    ];
    for (field, actual) in channels {
        if actual != actuator_count {
            return Err(ProtocolError::FieldLength {
                field,
                expected: actuator_count,
                actual,
            });
        }
    }

    if actuator_count == 0 {
        return Ok(None);
    }

    Ok(Some(EscChannels {
        motor_angular_velocity: msg.esc_motor_angular_velocity,
        temperature: msg.esc_temperature,
        current: msg.esc_current,
        voltage: msg.esc_voltage,
    }))
}

fn fixed<const N: usize>(field: &'static str, values: &[f32]) -> Result<[f32; N], ProtocolError> {
    values
        .try_into()
        .map_err(|_| ProtocolError::FieldLength {
            field,
            expected: N,
            actual: values.len(),
        })
}
