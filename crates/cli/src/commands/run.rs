//! `run` command implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{BridgeConfig, Simulator};
use controller::Bridge;
use tracing::{info, warn};
use twin_factory::{MockWorld, MockWorldConfig};

use crate::cli::RunArgs;
use crate::stats::RunStats;

const STEP_LIMIT_POLL: Duration = Duration::from_millis(20);

/// Why the run ended
#[derive(Debug)]
enum StopReason {
    Signal,
    MaxSteps,
    Timeout,
}

/// Execute the `run` command
pub async fn run_bridge(args: &RunArgs) -> Result<()> {
    let config =
        config_loader::ConfigLoader::from_env().context("Failed to load configuration")?;

    info!(
        addr = %config.network.socket_addr(),
        actuators = config.sensors.actuator_count,
        sensors = ?config.sensors.enabled,
        model = %config.twin.model_path.display(),
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let world = Arc::new(MockWorld::new(mock_world_config(&config, args)));
    let simulator: Arc<dyn Simulator> = world.clone();

    // Twin insertion polls; keep it off the runtime threads
    let bridge = tokio::task::spawn_blocking(move || Bridge::bootstrap(&config, simulator))
        .await
        .context("Bootstrap task failed")?
        .context("Failed to bootstrap bridge")?;

    info!(addr = %bridge.local_addr(), "Waiting for agent actions");
    let started = Instant::now();

    let reason = tokio::select! {
        _ = shutdown_signal() => StopReason::Signal,
        _ = step_limit(&bridge, args.max_steps) => StopReason::MaxSteps,
        _ = run_timeout(args.timeout) => StopReason::Timeout,
    };
    info!(reason = ?reason, "Stopping bridge");

    let metrics = Arc::clone(bridge.metrics());
    tokio::task::spawn_blocking(move || bridge.shutdown())
        .await
        .context("Shutdown task failed")?;

    let stats = RunStats {
        duration: started.elapsed(),
        controller: metrics.snapshot(),
        ticks: world.tick_count(),
    };
    info!(
        steps = stats.controller.steps,
        resets = stats.controller.resets,
        duration_secs = stats.duration.as_secs_f64(),
        "steplink finished"
    );
    stats.print_summary();

    Ok(())
}

fn mock_world_config(config: &BridgeConfig, args: &RunArgs) -> MockWorldConfig {
    MockWorldConfig {
        actuator_count: config.sensors.actuator_count,
        topics: config.sensors.topics.clone(),
        async_delivery: !args.sync_delivery,
        ..Default::default()
    }
}

/// Resolve once `max_steps` replies were sent; never for 0
async fn step_limit(bridge: &Bridge, max_steps: u64) {
    if max_steps == 0 {
        return std::future::pending().await;
    }
    let mut interval = tokio::time::interval(STEP_LIMIT_POLL);
    loop {
        interval.tick().await;
        if bridge.metrics().replies() >= max_steps {
            return;
        }
        if !bridge.is_running() {
            warn!("Control loop exited unexpectedly");
            return;
        }
    }
}

async fn run_timeout(secs: u64) {
    if secs == 0 {
        return std::future::pending().await;
    }
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

/// Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::TopicConfig;

    #[test]
    fn test_mock_world_follows_config() {
        let mut config = config_loader::ConfigLoader::from_vars([
            ("STEPLINK_DIGITAL_TWIN_SDF", "/tmp/quad.sdf"),
            ("STEPLINK_NUM_ACTUATORS", "6"),
            ("STEPLINK_SUPPORTED_SENSORS", "imu,esc"),
        ])
        .unwrap();
        config.sensors.topics = TopicConfig {
            robot_namespace: "hex".to_string(),
            imu: "~/imu".to_string(),
            ..Default::default()
        };
        let args = RunArgs {
            metrics_port: 0,
            max_steps: 0,
            timeout: 0,
            sync_delivery: true,
        };

        let world = mock_world_config(&config, &args);
        assert_eq!(world.actuator_count, 6);
        assert_eq!(world.topics.imu_topic(), "/hex/imu");
        assert!(!world.async_delivery);
    }

    #[tokio::test]
    async fn test_run_timeout_zero_never_fires() {
        let fired = tokio::time::timeout(Duration::from_millis(20), run_timeout(0)).await;
        assert!(fired.is_err());
    }
}
