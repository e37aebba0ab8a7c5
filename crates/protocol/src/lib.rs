//! # Protocol
//!
//! Wire format between the control agent and the bridge.
//!
//! One datagram carries one protobuf message: an `Action` inbound, a `State`
//! outbound. Field tags are fixed; unknown fields are skipped on decode.

pub mod codec;
pub mod error;
pub mod wire;

pub use codec::{decode_action, decode_state, encode_action, encode_state};
pub use error::ProtocolError;
