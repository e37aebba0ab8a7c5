//! Protocol error types

use thiserror::Error;

/// Codec errors
///
/// None of these are fatal: the control loop drops the datagram and polls
/// again.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Zero-length state reply
    #[error("empty datagram")]
    Empty,

    /// Bytes are not a valid protobuf message
    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// `world_control` outside the known enum values
    #[error("unknown world_control value {0}")]
    UnknownWorldControl(i32),

    /// `status_code` outside the known enum values
    #[error("unknown status_code value {0}")]
    UnknownStatusCode(i32),

    /// Repeated field with an unexpected element count
    #[error("field '{field}' has {actual} elements, expected {expected}")]
    FieldLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl ProtocolError {
    /// Short label used as the drop-reason metric dimension
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Decode(_) => "decode",
            Self::UnknownWorldControl(_) => "unknown_command",
            Self::UnknownStatusCode(_) => "unknown_status",
            Self::FieldLength { .. } => "field_length",
        }
    }
}
