//! # Config Loader
//!
//! Configuration loading and validation.
//!
//! Responsibilities:
//! - Read the per-instance environment variables (port, twin model, actuator
//!   count, sensor list)
//! - Merge the optional plugin file (topics, rig coupling, tuning)
//! - Validate and produce an immutable `BridgeConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//!
//! let config = ConfigLoader::from_env().unwrap();
//! println!("port: {}", config.network.port);
//! ```

mod parser;
mod validator;

pub use contracts::BridgeConfig;
pub use parser::{
    parse_sensor_list, ConfigFormat, EnvVars, PluginFile, ENV_BIND_ADDR, ENV_DIGITAL_TWIN_SDF,
    ENV_NUM_ACTUATORS, ENV_PLUGIN_CONFIG, ENV_SITL_PORT, ENV_SUPPORTED_SENSORS,
};

use contracts::{
    ContractError, NetworkConfig, SensorConfig, TwinConfig, DEFAULT_MAX_DATAGRAM_SIZE,
    DEFAULT_SITL_PORT,
};
use std::path::Path;
use tracing::debug;

/// Configuration loader
///
/// Provides static methods to build a `BridgeConfig` from the process
/// environment or from explicit key/value pairs.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the process environment
    ///
    /// # Errors
    /// - Missing required variable
    /// - Unparsable value
    /// - Plugin file read/parse failure
    /// - Validation failure
    pub fn from_env() -> Result<BridgeConfig, ContractError> {
        Self::from_env_vars(EnvVars::from_os_pairs(std::env::vars_os())?)
    }

    /// Load configuration from explicit key/value pairs
    ///
    /// # Errors
    /// Same as [`ConfigLoader::from_env`].
    pub fn from_vars<I, K, V>(vars: I) -> Result<BridgeConfig, ContractError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_env_vars(EnvVars::from_pairs(vars))
    }

    fn from_env_vars(env: EnvVars) -> Result<BridgeConfig, ContractError> {
        let plugin = match env.plugin_config() {
            Some(path) => Self::load_plugin_file(&path)?,
            None => PluginFile::default(),
        };
        let config = Self::assemble(&env, plugin)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Load a plugin file
    ///
    /// Automatically detects format from file extension (.toml / .json).
    pub fn load_plugin_file(path: &Path) -> Result<PluginFile, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), ?format, "Loaded plugin file");
        parser::parse(&content, format)
    }

    /// Serialize a BridgeConfig to TOML
    pub fn to_toml(config: &BridgeConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize a BridgeConfig to JSON
    pub fn to_json(config: &BridgeConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer plugin file format from extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Combine environment values and plugin file sections
    fn assemble(env: &EnvVars, plugin: PluginFile) -> Result<BridgeConfig, ContractError> {
        let network = NetworkConfig {
            bind_addr: env.bind_addr()?,
            port: env.port(DEFAULT_SITL_PORT)?,
            max_datagram_size: plugin
                .max_datagram_size
                .unwrap_or(DEFAULT_MAX_DATAGRAM_SIZE),
        };

        let twin = TwinConfig {
            model_path: env.twin_model_path()?,
            rig: plugin.rig,
        };

        let sensors = SensorConfig {
            enabled: env.supported_sensors()?,
            actuator_count: env.actuator_count()?,
            topics: plugin.topics,
        };

        Ok(BridgeConfig {
            network,
            sensors,
            twin,
            settle: plugin.settle,
            controller: plugin.controller,
        })
    }
}
