//! Ingestion error types

use contracts::ContractError;
use thiserror::Error;

/// Ingestion errors
#[derive(Debug, Error)]
pub enum IngestionError {
    /// The simulator refused a topic subscription
    #[error("failed to subscribe to '{topic}': {source}")]
    SubscribeFailed {
        /// Topic name
        topic: String,
        #[source]
        source: ContractError,
    },
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
