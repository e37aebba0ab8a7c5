//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{BridgeConfig, SensorKind};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    addr: String,
    actuator_count: usize,
    sensors: Vec<String>,
    expected_per_step: u32,
    model_path: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!("Validating configuration");

    let result = into_result(config_loader::ConfigLoader::from_env());

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn into_result(loaded: Result<BridgeConfig, contracts::ContractError>) -> ValidationResult {
    match loaded {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    addr: config.network.socket_addr().to_string(),
                    actuator_count: config.sensors.actuator_count,
                    sensors: config
                        .sensors
                        .enabled
                        .iter()
                        .map(|kind| kind.to_string())
                        .collect(),
                    expected_per_step: config.callback_budget().expected_per_step,
                    model_path: config.twin.model_path.display().to_string(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &BridgeConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.sensors.enabled.is_empty() {
        warnings.push("No sensors enabled - replies will carry no sensor data".to_string());
    }

    if config.sensors.is_enabled(SensorKind::Esc) && config.sensors.actuator_count == 0 {
        warnings.push("ESC enabled with zero actuators - no ESC topics".to_string());
    }

    if !config.twin.model_path.exists() {
        warnings.push(format!(
            "Digital twin model not found: {}",
            config.twin.model_path.display()
        ));
    }

    if config.controller.sensor_timeout().is_none() {
        warnings.push(
            "controller.sensor_timeout_ms is 0 - a silent sensor blocks the loop forever"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid");

        if let Some(ref summary) = result.summary {
            println!("\n  Address: {}", summary.addr);
            println!("  Actuators: {}", summary.actuator_count);
            println!("  Sensors: {}", summary.sensors.join(", "));
            println!("  Callbacks per step: {}", summary.expected_per_step);
            println!("  Twin model: {}", summary.model_path);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid");
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
