//! Configuration parsing
//!
//! Environment variables carry the per-instance settings; an optional plugin
//! file (TOML primary, JSON accepted) carries topics and tuning.

use std::collections::{BTreeSet, HashMap};
use std::ffi::OsString;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::str::FromStr;

use contracts::{ContractError, ControllerConfig, RigConfig, SensorKind, SettleConfig, TopicConfig};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// UDP port
pub const ENV_SITL_PORT: &str = "STEPLINK_SITL_PORT";
/// IPv4 bind address
pub const ENV_BIND_ADDR: &str = "STEPLINK_BIND_ADDR";
/// Digital twin model file
pub const ENV_DIGITAL_TWIN_SDF: &str = "STEPLINK_DIGITAL_TWIN_SDF";
/// Actuator count
pub const ENV_NUM_ACTUATORS: &str = "STEPLINK_NUM_ACTUATORS";
/// Comma-separated sensor kinds
pub const ENV_SUPPORTED_SENSORS: &str = "STEPLINK_SUPPORTED_SENSORS";
/// Optional plugin file
pub const ENV_PLUGIN_CONFIG: &str = "STEPLINK_PLUGIN_CONFIG";

const ENV_PREFIX: &str = "STEPLINK_";

/// Plugin file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Plugin file contents
///
/// Every section is optional; absent sections keep their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PluginFile {
    /// Receive buffer size override
    pub max_datagram_size: Option<usize>,
    pub topics: TopicConfig,
    pub rig: RigConfig,
    pub settle: SettleConfig,
    pub controller: ControllerConfig,
}

/// Parse a TOML plugin file
pub fn parse_toml(content: &str) -> Result<PluginFile, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse a JSON plugin file
pub fn parse_json(content: &str) -> Result<PluginFile, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse a plugin file by format
pub fn parse(content: &str, format: ConfigFormat) -> Result<PluginFile, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

/// Snapshot of the environment variables relevant to the bridge
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    vars: HashMap<String, String>,
}

impl EnvVars {
    /// Collect from any key/value iterator
    pub fn from_pairs<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Collect from OS strings, as handed out by `std::env::vars_os`
    ///
    /// Variables outside the `STEPLINK_` namespace are skipped, whatever
    /// their encoding. A bridge variable that is not valid Unicode is a
    /// parse error.
    pub fn from_os_pairs<I>(vars: I) -> Result<Self, ContractError>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut collected = HashMap::new();
        for (key, value) in vars {
            let Some(key) = key.to_str().filter(|k| k.starts_with(ENV_PREFIX)) else {
                continue;
            };
            let value = value.into_string().map_err(|raw| {
                ContractError::config_parse(format!(
                    "{key}={}: not valid Unicode",
                    raw.to_string_lossy()
                ))
            })?;
            collected.insert(key.to_string(), value);
        }
        Ok(Self { vars: collected })
    }

    /// Raw value, empty strings count as unset
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Required raw value
    pub fn required(&self, key: &str) -> Result<&str, ContractError> {
        self.get(key).ok_or_else(|| ContractError::config_missing(key))
    }

    /// Optional typed value
    pub fn parse_optional<T>(&self, key: &str) -> Result<Option<T>, ContractError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|e| {
                    ContractError::config_parse(format!("{key}='{raw}': {e}"))
                })
            })
            .transpose()
    }

    /// Required typed value
    pub fn parse_required<T>(&self, key: &str) -> Result<T, ContractError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.parse_optional(key)?
            .ok_or_else(|| ContractError::config_missing(key))
    }

    /// UDP port, defaulting when unset
    pub fn port(&self, default: u16) -> Result<u16, ContractError> {
        Ok(self.parse_optional(ENV_SITL_PORT)?.unwrap_or(default))
    }

    /// Bind address, defaulting to loopback
    pub fn bind_addr(&self) -> Result<Ipv4Addr, ContractError> {
        Ok(self
            .parse_optional(ENV_BIND_ADDR)?
            .unwrap_or(Ipv4Addr::LOCALHOST))
    }

    /// Twin model path
    pub fn twin_model_path(&self) -> Result<PathBuf, ContractError> {
        self.required(ENV_DIGITAL_TWIN_SDF).map(PathBuf::from)
    }

    /// Actuator count
    pub fn actuator_count(&self) -> Result<usize, ContractError> {
        self.parse_required(ENV_NUM_ACTUATORS)
    }

    /// Enabled sensor kinds
    pub fn supported_sensors(&self) -> Result<BTreeSet<SensorKind>, ContractError> {
        self.required(ENV_SUPPORTED_SENSORS).map(parse_sensor_list)
    }

    /// Plugin file path, if configured
    pub fn plugin_config(&self) -> Option<PathBuf> {
        self.get(ENV_PLUGIN_CONFIG).map(PathBuf::from)
    }
}

/// Parse a comma-separated sensor list
///
/// Matching is case-insensitive; unrecognized entries are skipped with a
/// warning, duplicates collapse.
pub fn parse_sensor_list(raw: &str) -> BTreeSet<SensorKind> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse::<SensorKind>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                warn!(sensor = %entry, "Ignoring unsupported sensor kind");
                None
            }
        })
        .collect()
}
