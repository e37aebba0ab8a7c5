//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{BridgeConfig, SensorKind};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Resolved configuration for JSON output
#[derive(Serialize)]
struct ConfigInfo<'a> {
    addr: String,
    topics: TopicInfo,
    expected_per_step: u32,
    config: &'a BridgeConfig,
}

#[derive(Serialize)]
struct TopicInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    imu: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    esc: Vec<String>,
    motor_command: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!("Loading configuration info");

    let config =
        config_loader::ConfigLoader::from_env().context("Failed to load configuration")?;
    let info = build_config_info(&config);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &BridgeConfig) -> ConfigInfo<'_> {
    let sensors = &config.sensors;
    ConfigInfo {
        addr: config.network.socket_addr().to_string(),
        topics: TopicInfo {
            imu: sensors
                .is_enabled(SensorKind::Imu)
                .then(|| sensors.topics.imu_topic()),
            esc: if sensors.is_enabled(SensorKind::Esc) {
                (0..sensors.actuator_count)
                    .map(|id| sensors.topics.esc_topic(id))
                    .collect()
            } else {
                Vec::new()
            },
            motor_command: sensors.topics.motor_command_topic(),
        },
        expected_per_step: config.callback_budget().expected_per_step,
        config,
    }
}

fn print_config_info(info: &ConfigInfo<'_>) {
    let config = info.config;

    println!("\n=== steplink Configuration ===\n");
    println!("Network:");
    println!("  Address: {}", info.addr);
    println!("  Max datagram: {} bytes", config.network.max_datagram_size);

    println!("\nSensors:");
    let enabled: Vec<String> = config
        .sensors
        .enabled
        .iter()
        .map(|kind| kind.to_string())
        .collect();
    println!("  Enabled: {}", enabled.join(", "));
    println!("  Actuators: {}", config.sensors.actuator_count);
    println!("  Callbacks per step: {}", info.expected_per_step);

    println!("\nTopics:");
    if let Some(ref imu) = info.topics.imu {
        println!("  IMU: {}", imu);
    }
    for topic in &info.topics.esc {
        println!("  ESC: {}", topic);
    }
    println!("  Motor command: {}", info.topics.motor_command);

    let rig = &config.twin.rig;
    println!("\nDigital twin:");
    println!("  Model: {}", config.twin.model_path.display());
    println!(
        "  Joint: {} ({}::{} <-> twin::{})",
        rig.joint_name, rig.rig_model, rig.pivot_link, rig.attach_link
    );
    println!("  Insert timeout: {} ms", rig.insert_timeout_ms);

    println!("\nSettle:");
    println!("  Tolerance: {} rad/s", config.settle.tolerance);
    println!("  Min samples: {}", config.settle.min_samples);
    println!("  Max ticks: {}", config.settle.max_ticks);

    println!("\nController:");
    match config.controller.sensor_timeout() {
        Some(timeout) => println!("  Sensor timeout: {} ms", timeout.as_millis()),
        None => println!("  Sensor timeout: unbounded"),
    }
    println!("  Idle backoff: {} µs", config.controller.idle_backoff_us);

    println!();
}
