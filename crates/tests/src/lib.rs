//! # Integration Tests
//!
//! End-to-end tests over real localhost UDP against the mock world.
//!
//! Covers:
//! - configuration loading through the environment and plugin file
//! - Step / Reset exchanges with a bootstrapped bridge
//! - datagrams that must not be answered

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::net::{SocketAddr, UdpSocket};
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{Action, BridgeConfig, Simulator, State, StatusCode};
    use controller::Bridge;
    use tempfile::NamedTempFile;
    use twin_factory::{MockWorld, MockWorldConfig};

    const QUAD_SDF: &str = r#"<?xml version="1.0"?>
<sdf version="1.9">
  <model name="quadrotor">
    <link name="base_link"/>
    <link name="cg"/>
  </model>
</sdf>
"#;

    const REPLY_TIMEOUT: Duration = Duration::from_secs(5);
    const SILENCE: Duration = Duration::from_millis(300);

    struct Harness {
        world: Arc<MockWorld>,
        bridge: Bridge,
        agent: UdpSocket,
        addr: SocketAddr,
        _model: NamedTempFile,
        _plugin: Option<NamedTempFile>,
    }

    impl Harness {
        fn start(sensors: &str, actuators: usize, plugin: Option<&str>) -> Self {
            let mut model = NamedTempFile::new().unwrap();
            model.write_all(QUAD_SDF.as_bytes()).unwrap();

            let plugin = plugin.map(|content| {
                let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
                file.write_all(content.as_bytes()).unwrap();
                file
            });

            let mut vars = vec![
                (
                    "STEPLINK_DIGITAL_TWIN_SDF".to_string(),
                    model.path().display().to_string(),
                ),
                ("STEPLINK_NUM_ACTUATORS".to_string(), actuators.to_string()),
                ("STEPLINK_SUPPORTED_SENSORS".to_string(), sensors.to_string()),
            ];
            if let Some(file) = &plugin {
                vars.push((
                    "STEPLINK_PLUGIN_CONFIG".to_string(),
                    file.path().display().to_string(),
                ));
            }

            let mut config = config_loader::ConfigLoader::from_vars(vars).unwrap();
            // Ephemeral port so tests can run in parallel
            config.network.port = 0;

            let world = Arc::new(MockWorld::new(mock_world_config(&config)));
            let bridge = Bridge::bootstrap(&config, world.clone()).unwrap();
            let addr = bridge.local_addr();

            let agent = UdpSocket::bind("127.0.0.1:0").unwrap();
            agent.set_read_timeout(Some(REPLY_TIMEOUT)).unwrap();

            Self {
                world,
                bridge,
                agent,
                addr,
                _model: model,
                _plugin: plugin,
            }
        }

        fn send(&self, action: &Action) {
            self.send_raw(&protocol::encode_action(action));
        }

        fn send_raw(&self, payload: &[u8]) {
            self.agent.send_to(payload, self.addr).unwrap();
        }

        fn recv(&self) -> State {
            let mut buf = [0u8; 2048];
            let (len, from) = self.agent.recv_from(&mut buf).unwrap();
            assert_eq!(from, self.addr);
            protocol::decode_state(&buf[..len]).unwrap()
        }

        fn exchange(&self, action: &Action) -> State {
            self.send(action);
            self.recv()
        }

        fn expect_silence(&self) {
            self.agent.set_read_timeout(Some(SILENCE)).unwrap();
            let mut buf = [0u8; 2048];
            let result = self.agent.recv_from(&mut buf);
            self.agent.set_read_timeout(Some(REPLY_TIMEOUT)).unwrap();
            assert!(result.is_err(), "unexpected reply to a dropped datagram");
        }
    }

    fn mock_world_config(config: &BridgeConfig) -> MockWorldConfig {
        MockWorldConfig {
            actuator_count: config.sensors.actuator_count,
            topics: config.sensors.topics.clone(),
            ..Default::default()
        }
    }

    #[test]
    fn test_step_advances_one_tick() {
        let h = Harness::start("imu,esc", 4, None);

        let state = h.exchange(&Action::step(vec![0.6, 0.4, 0.6, 0.4]));

        assert_eq!(state.status, StatusCode::Ok);
        assert_eq!(h.world.tick_count(), 1);
        assert!((state.sim_time - 0.001).abs() < 1e-9);
        let esc = state.esc.unwrap();
        assert_eq!(esc.len(), 4);
        assert_eq!(esc.voltage.len(), 4);
        assert!(esc.motor_angular_velocity.iter().all(|w| *w > 0.0));
        assert!(state.imu.is_some());
        assert_eq!(h.world.motor_commands().len(), 1);
    }

    #[test]
    fn test_consecutive_steps() {
        let h = Harness::start("imu,esc", 4, None);

        let mut last_time = 0.0;
        for i in 1..=10u64 {
            let state = h.exchange(&Action::step(vec![0.5; 4]));
            assert_eq!(state.status, StatusCode::Ok);
            assert!(state.sim_time > last_time);
            assert_eq!(h.world.tick_count(), i);
            last_time = state.sim_time;
        }
        assert_eq!(h.bridge.metrics().snapshot().steps, 10);
    }

    #[test]
    fn test_reset_settles() {
        let h = Harness::start("imu,esc", 4, None);
        h.exchange(&Action::step(vec![1.0, 0.0, 1.0, 0.0]));

        let state = h.exchange(&Action::reset());

        assert_eq!(state.status, StatusCode::Ok);
        let imu = state.imu.unwrap();
        assert!(imu.angular_velocity.iter().all(|w| w.abs() <= 0.017));
        // Every reset is followed by exactly one tick
        let settle_ticks = h.world.tick_count() - 1;
        assert!(settle_ticks >= 1);
        assert!(settle_ticks <= 10_000);
        assert_eq!(h.world.reset_count(), settle_ticks);
        assert!((state.sim_time - 0.001).abs() < 1e-9);
        // Reset forwards no actuator command
        assert_eq!(h.world.motor_commands().len(), 1);
    }

    #[test]
    fn test_malformed_datagrams_get_no_reply() {
        let h = Harness::start("imu,esc", 4, None);

        h.send_raw(&[0xFF, 0xFF, 0xFF]);
        h.expect_silence();
        // Unknown world_control value
        h.send_raw(&[0x08, 0x07]);
        h.expect_silence();
        assert_eq!(h.world.tick_count(), 0);

        // The loop keeps serving afterwards
        let state = h.exchange(&Action::step(vec![0.0; 4]));
        assert_eq!(state.status, StatusCode::Ok);
        assert_eq!(h.bridge.metrics().snapshot().packets_dropped, 2);
    }

    #[test]
    fn test_actuator_count_mismatch() {
        let h = Harness::start("imu,esc", 4, None);

        let state = h.exchange(&Action::step(vec![0.5, 0.5]));

        assert_eq!(state.status, StatusCode::Error);
        assert_eq!(h.world.tick_count(), 0);
        assert!(h.world.motor_commands().is_empty());
    }

    #[test]
    fn test_imu_only_reply() {
        let h = Harness::start("IMU", 4, None);

        let state = h.exchange(&Action::step(vec![0.1; 4]));

        assert_eq!(state.status, StatusCode::Ok);
        assert!(state.imu.is_some());
        assert!(state.esc.is_none());
        assert_eq!(h.world.subscription_count(), 1);
    }

    #[test]
    fn test_namespaced_topics_from_plugin_file() {
        let plugin = r#"
[topics]
robot_namespace = "hexa"
imu = "~/imu"
esc_prefix = "~/esc"
motor_command = "~/motors"

[settle]
tolerance = 0.01
"#;
        let h = Harness::start("imu,esc", 6, Some(plugin));

        let state = h.exchange(&Action::step(vec![0.3; 6]));
        assert_eq!(state.status, StatusCode::Ok);
        assert_eq!(state.esc.unwrap().len(), 6);
        assert_eq!(h.world.subscription_count(), 7);

        let state = h.exchange(&Action::reset());
        assert_eq!(state.status, StatusCode::Ok);
        assert!(state
            .imu
            .unwrap()
            .angular_velocity
            .iter()
            .all(|w| w.abs() <= 0.01));
    }

    #[test]
    fn test_shutdown_releases_simulator() {
        let h = Harness::start("imu,esc", 4, None);
        assert!(h.bridge.is_running());
        assert!(h.world.is_paused());

        let Harness { world, bridge, .. } = h;
        bridge.shutdown();
        assert_eq!(world.subscription_count(), 0);
    }

    #[test]
    fn test_zero_actuator_step() {
        let h = Harness::start("imu", 0, None);

        // All-default Step encodes to an empty datagram
        let state = h.exchange(&Action::step(Vec::new()));
        assert_eq!(state.status, StatusCode::Ok);
        assert_eq!(h.world.tick_count(), 1);
        assert!(state.imu.is_some());
        assert!(state.esc.is_none());

        let state = h.exchange(&Action::reset());
        assert_eq!(state.status, StatusCode::Ok);
        assert_eq!(h.bridge.metrics().snapshot().packets_dropped, 0);
    }

    #[test]
    fn test_empty_datagram_with_actuators_is_a_short_step() {
        let h = Harness::start("imu,esc", 4, None);

        h.send_raw(&[]);
        let state = h.recv();

        assert_eq!(state.status, StatusCode::Error);
        assert_eq!(h.world.tick_count(), 0);
    }
}
