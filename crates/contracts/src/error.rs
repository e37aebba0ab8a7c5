//! Layered error definitions
//!
//! Categorized by source: config / simulation / general

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Required configuration value absent
    #[error("missing required configuration '{key}'")]
    ConfigMissing { key: String },

    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Simulation Errors =====
    /// Simulator rejected or failed an operation
    #[error("simulation error during '{operation}': {message}")]
    Simulation { operation: String, message: String },

    /// Topic subscription error
    #[error("failed to subscribe to topic '{topic}': {message}")]
    Subscribe { topic: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create missing configuration error
    pub fn config_missing(key: impl Into<String>) -> Self {
        Self::ConfigMissing { key: key.into() }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create simulation error
    pub fn simulation(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Simulation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create subscription error
    pub fn subscribe(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Subscribe {
            topic: topic.into(),
            message: message.into(),
        }
    }
}
