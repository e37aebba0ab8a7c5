//! Transport error types

use std::net::SocketAddr;

use thiserror::Error;

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// Socket creation, option or bind failure
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Reply requested before any datagram was received
    #[error("no peer address recorded yet")]
    NoPeer,

    /// Send failure
    #[error("failed to send to {peer}: {source}")]
    Send {
        peer: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Socket query failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
