//! Bridge error types

use ingestion::IngestionError;
use thiserror::Error;
use transport::TransportError;
use twin_factory::TwinError;

/// Bootstrap failures
///
/// Any of these aborts bootstrap before the control loop starts.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// UDP endpoint could not be set up
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Sensor topic subscription failed
    #[error("sensor subscription error: {0}")]
    Ingestion(#[from] IngestionError),

    /// Digital twin could not be inserted or attached
    #[error("digital twin error: {0}")]
    Twin(#[from] TwinError),

    /// Control loop thread could not be started
    #[error("failed to spawn control loop: {0}")]
    Spawn(#[source] std::io::Error),
}
