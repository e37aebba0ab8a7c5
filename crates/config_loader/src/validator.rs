//! Configuration validation
//!
//! Rules:
//! - field ranges and non-empty topics (declared on the contract types)
//! - actuator count is bounded (declared on `SensorConfig`)
//! - topic names must be unique across sensors

use std::collections::HashSet;

use contracts::{BridgeConfig, ContractError, SensorKind};
use tracing::warn;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

/// Validate a BridgeConfig
///
/// Returns the first violation found, or Ok(()).
pub fn validate(config: &BridgeConfig) -> Result<(), ContractError> {
    validate_declared_rules(config)?;
    validate_sensor_selection(config)?;
    validate_unique_topics(config)?;
    Ok(())
}

/// Run the derive-declared field rules
fn validate_declared_rules(config: &BridgeConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let (field, message) = first_violation("", &errors)
            .unwrap_or_else(|| ("config".to_string(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

/// Check the enabled sensor set
///
/// An empty budget is legal (every step replies immediately) but almost
/// always a deployment mistake, so it is reported.
fn validate_sensor_selection(config: &BridgeConfig) -> Result<(), ContractError> {
    let sensors = &config.sensors;

    if sensors.enabled.is_empty() {
        warn!("No supported sensor enabled (expected any of: imu, esc); replies carry no sensor data");
    }

    if sensors.is_enabled(SensorKind::Esc) && sensors.actuator_count == 0 {
        warn!("ESC sensor enabled with zero actuators; no ESC topics will be subscribed");
    }

    Ok(())
}

/// Check that no two subscriptions share a topic
fn validate_unique_topics(config: &BridgeConfig) -> Result<(), ContractError> {
    let sensors = &config.sensors;
    let mut seen = HashSet::new();

    let mut topics = Vec::new();
    if sensors.is_enabled(SensorKind::Imu) {
        topics.push(sensors.topics.imu_topic());
    }
    if sensors.is_enabled(SensorKind::Esc) {
        topics.extend((0..sensors.actuator_count).map(|id| sensors.topics.esc_topic(id)));
    }

    for topic in topics {
        if !seen.insert(topic.clone()) {
            return Err(ContractError::config_validation(
                "sensors.topics",
                format!("duplicate sensor topic '{topic}'"),
            ));
        }
    }
    Ok(())
}

/// Walk nested validation errors depth-first, in field order
fn first_violation(prefix: &str, errors: &ValidationErrors) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        let found = match kind {
            ValidationErrorsKind::Field(list) => {
                list.first().map(|error| (path.clone(), describe(error)))
            }
            ValidationErrorsKind::Struct(inner) => first_violation(&path, inner),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(idx, inner)| first_violation(&format!("{path}[{idx}]"), inner)),
        };

        if found.is_some() {
            return found;
        }
    }
    None
}

fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let mut params: Vec<String> = error
        .params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    params.sort();
    format!("failed '{}' check ({})", error.code, params.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ControllerConfig, NetworkConfig, RigConfig, SensorConfig, SettleConfig, TopicConfig,
        TwinConfig,
    };
    use std::path::PathBuf;

    fn valid_config() -> BridgeConfig {
        BridgeConfig {
            network: NetworkConfig::default(),
            sensors: SensorConfig {
                enabled: [SensorKind::Imu, SensorKind::Esc].into_iter().collect(),
                actuator_count: 4,
                topics: TopicConfig::default(),
            },
            twin: TwinConfig {
                model_path: PathBuf::from("twin.sdf"),
                rig: RigConfig::default(),
            },
            settle: SettleConfig::default(),
            controller: ControllerConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_port_zero_rejected() {
        let mut config = valid_config();
        config.network.port = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("network.port"), "{err}");
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let mut config = valid_config();
        config.settle.tolerance = -0.1;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("settle.tolerance"), "{err}");
    }

    #[test]
    fn test_empty_budget_accepted() {
        let mut config = valid_config();
        config.sensors.enabled.clear();
        assert!(validate(&config).is_ok());
        assert_eq!(config.callback_budget().expected_per_step, 0);
    }

    #[test]
    fn test_imu_only_zero_actuators_accepted() {
        let mut config = valid_config();
        config.sensors.enabled = [SensorKind::Imu].into_iter().collect();
        config.sensors.actuator_count = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_duplicate_topic_rejected() {
        let mut config = valid_config();
        // IMU topic collides with the ESC topic of actuator 0
        config.sensors.topics.imu = "/aircraft/sensor/esc/0".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_empty_topic_rejected() {
        let mut config = valid_config();
        config.sensors.topics.motor_command = String::new();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("motor_command"), "{err}");
    }

    #[test]
    fn test_oversized_actuator_count_rejected_before_topic_expansion() {
        let mut config = valid_config();
        config.sensors.actuator_count = 400_000_000;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("sensors.actuator_count"), "{err}");
    }
}
