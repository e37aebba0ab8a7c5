//! # Transport
//!
//! Non-blocking UDP datagram endpoint for the control connection.
//!
//! Only the most recent sender is remembered; replies always go to it.

mod error;
mod udp;

pub use error::TransportError;
pub use udp::UdpTransport;
