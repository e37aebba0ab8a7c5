//! Twin factory error types

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

/// Twin factory errors
///
/// All of them abort bootstrap.
#[derive(Debug, Error)]
pub enum TwinError {
    /// Model definition file does not exist
    #[error("digital twin model file not found: {}", path.display())]
    ModelFileMissing { path: PathBuf },

    /// Model definition file could not be read
    #[error("failed to read model file {}: {source}", path.display())]
    ModelRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Model definition lacks a usable model element
    #[error("malformed model definition {}: {reason}", path.display())]
    MalformedModel { path: PathBuf, reason: String },

    /// Simulator rejected the insertion request
    #[error("model insertion failed: {0}")]
    InsertFailed(#[source] ContractError),

    /// Inserted model never showed up in the world
    #[error("model '{name}' did not appear within {waited_ms} ms")]
    ModelNotAppeared { name: String, waited_ms: u64 },

    /// Model missing from the world
    #[error("model '{name}' not found in world")]
    ModelNotFound { name: String },

    /// No link with the requested suffix
    #[error("link '{link}' not found in model '{model}'")]
    LinkNotFound { model: String, link: String },

    /// Joint creation failed
    #[error("failed to create joint '{joint}': {source}")]
    JointFailed {
        joint: String,
        #[source]
        source: ContractError,
    },
}

/// Twin factory Result type alias
pub type Result<T> = std::result::Result<T, TwinError>;
