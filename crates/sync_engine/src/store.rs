//! Sensor state store
//!
//! Latest value of every tracked channel. Callbacks overwrite only the slots
//! they own; the controller reads the whole thing into a `State`.

use std::collections::BTreeSet;

use contracts::{
    EscChannels, EscMessage, ImuMessage, ImuReading, SensorKind, SettleConfig, State, StatusCode,
};
use tracing::trace;

use crate::error::SyncError;

/// Angular velocity seeded before any real IMU data arrives (rad/s, per axis)
pub const SENTINEL_ANGULAR_VELOCITY: f32 = 1.0;

const SENTINEL_ESC_SPEED: f32 = 100.0;
const SENTINEL_ESC_TEMPERATURE: f32 = 10_000.0;
const SENTINEL_ESC_CURRENT: f32 = -1.0;
const SENTINEL_ESC_VOLTAGE: f32 = -1.0;

/// Latest-value snapshot of all sensor channels
#[derive(Debug, Clone)]
pub struct SensorStateStore {
    enabled: BTreeSet<SensorKind>,
    imu: ImuReading,
    esc: EscChannels,
    imu_samples: u64,
}

impl SensorStateStore {
    /// Create a store sized for `actuator_count` ESC channels, seeded with
    /// sentinels
    pub fn new(enabled: BTreeSet<SensorKind>, actuator_count: usize) -> Self {
        let mut store = Self {
            enabled,
            imu: ImuReading::default(),
            esc: EscChannels::filled(actuator_count, 0.0, 0.0, 0.0, 0.0),
            imu_samples: 0,
        };
        store.seed_sentinels();
        store
    }

    /// Overwrite every channel with an artificial "still moving" reading
    ///
    /// A settle check against the seeded values always fails, which forces
    /// at least one warm-up tick.
    pub fn seed_sentinels(&mut self) {
        self.imu = ImuReading {
            angular_velocity: [SENTINEL_ANGULAR_VELOCITY; 3],
            orientation: [0.0; 4],
            linear_acceleration: [0.0; 3],
        };
        self.esc = EscChannels::filled(
            self.esc.len(),
            SENTINEL_ESC_SPEED,
            SENTINEL_ESC_TEMPERATURE,
            SENTINEL_ESC_CURRENT,
            SENTINEL_ESC_VOLTAGE,
        );
    }

    /// Replace all IMU fields
    pub fn apply_imu(&mut self, msg: &ImuMessage) {
        self.imu = ImuReading {
            angular_velocity: msg.angular_velocity.map(|v| v as f32),
            orientation: msg.orientation.map(|v| v as f32),
            linear_acceleration: msg.linear_acceleration.map(|v| v as f32),
        };
        self.imu_samples += 1;
        trace!(samples = self.imu_samples, "IMU updated");
    }

    /// Replace index `msg.id` of every ESC channel
    pub fn apply_esc(&mut self, msg: &EscMessage) -> Result<(), SyncError> {
        let idx = msg.id as usize;
        if idx >= self.esc.len() {
            return Err(SyncError::EscIdOutOfRange {
                id: msg.id,
                actuator_count: self.esc.len(),
            });
        }

        self.esc.motor_angular_velocity[idx] = msg.motor_speed as f32;
        self.esc.temperature[idx] = msg.temperature as f32;
        self.esc.current[idx] = msg.current as f32;
        self.esc.voltage[idx] = msg.voltage as f32;
        trace!(id = msg.id, "ESC updated");
        Ok(())
    }

    /// IMU messages observed since the store was created
    pub fn imu_samples(&self) -> u64 {
        self.imu_samples
    }

    /// Latest IMU reading
    pub fn imu(&self) -> &ImuReading {
        &self.imu
    }

    /// Latest ESC channels
    pub fn esc(&self) -> &EscChannels {
        &self.esc
    }

    /// Whether a sensor kind is enabled
    pub fn is_enabled(&self, kind: SensorKind) -> bool {
        self.enabled.contains(&kind)
    }

    /// Build a reply; only enabled sensor groups are included
    pub fn snapshot(&self, sim_time: f64, status: StatusCode) -> State {
        State {
            sim_time,
            status,
            imu: self.is_enabled(SensorKind::Imu).then_some(self.imu),
            esc: self
                .is_enabled(SensorKind::Esc)
                .then(|| self.esc.clone()),
        }
    }

    /// Enough IMU samples seen and all angular-velocity axes near zero
    pub fn is_settled(&self, settle: &SettleConfig) -> bool {
        self.imu_samples >= settle.min_samples
            && self
                .imu
                .angular_velocity
                .iter()
                .all(|w| f64::from(w.abs()) <= settle.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_sensors() -> BTreeSet<SensorKind> {
        [SensorKind::Imu, SensorKind::Esc].into_iter().collect()
    }

    fn still_imu() -> ImuMessage {
        ImuMessage {
            angular_velocity: [0.001, -0.002, 0.0],
            orientation: [1.0, 0.0, 0.0, 0.0],
            linear_acceleration: [0.0, 0.0, 9.81],
        }
    }

    #[test]
    fn test_sentinels_never_settled() {
        let mut store = SensorStateStore::new(all_sensors(), 4);
        let settle = SettleConfig::default();
        assert!(!store.is_settled(&settle));

        // Even with plenty of samples recorded, re-seeding un-settles
        store.apply_imu(&still_imu());
        store.apply_imu(&still_imu());
        assert!(store.is_settled(&settle));
        store.seed_sentinels();
        assert!(!store.is_settled(&settle));

        let lenient = SettleConfig {
            tolerance: 0.999,
            ..settle
        };
        assert!(!store.is_settled(&lenient));
    }

    #[test]
    fn test_sentinel_values() {
        let store = SensorStateStore::new(all_sensors(), 2);
        let state = store.snapshot(0.0, StatusCode::Ok);
        let imu = state.imu.unwrap();
        assert_eq!(imu.angular_velocity, [1.0; 3]);
        assert_eq!(imu.orientation, [0.0; 4]);
        let esc = state.esc.unwrap();
        assert_eq!(esc.motor_angular_velocity, vec![100.0; 2]);
        assert_eq!(esc.temperature, vec![10_000.0; 2]);
        assert_eq!(esc.current, vec![-1.0; 2]);
        assert_eq!(esc.voltage, vec![-1.0; 2]);
    }

    #[test]
    fn test_min_samples_guard() {
        let mut store = SensorStateStore::new(all_sensors(), 0);
        let settle = SettleConfig::default();
        store.apply_imu(&still_imu());
        assert!(!store.is_settled(&settle));
        store.apply_imu(&still_imu());
        assert!(store.is_settled(&settle));
        assert_eq!(store.imu_samples(), 2);
    }

    #[test]
    fn test_esc_updates_only_own_index() {
        let mut store = SensorStateStore::new(all_sensors(), 4);
        store
            .apply_esc(&EscMessage {
                id: 2,
                motor_speed: 350.0,
                temperature: 40.0,
                current: 1.5,
                voltage: 16.8,
            })
            .unwrap();

        let esc = store.esc();
        assert_eq!(esc.motor_angular_velocity, vec![100.0, 100.0, 350.0, 100.0]);
        assert_eq!(esc.voltage, vec![-1.0, -1.0, 16.8, -1.0]);
    }

    #[test]
    fn test_esc_out_of_range_rejected() {
        let mut store = SensorStateStore::new(all_sensors(), 4);
        let err = store
            .apply_esc(&EscMessage {
                id: 4,
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(
            err,
            SyncError::EscIdOutOfRange {
                id: 4,
                actuator_count: 4
            }
        );
    }

    #[test]
    fn test_snapshot_respects_enabled_kinds() {
        let imu_only = SensorStateStore::new([SensorKind::Imu].into_iter().collect(), 4);
        let state = imu_only.snapshot(1.5, StatusCode::Error);
        assert_eq!(state.sim_time, 1.5);
        assert_eq!(state.status, StatusCode::Error);
        assert!(state.imu.is_some());
        assert!(state.esc.is_none());

        let esc_only = SensorStateStore::new([SensorKind::Esc].into_iter().collect(), 4);
        let state = esc_only.snapshot(0.0, StatusCode::Ok);
        assert!(state.imu.is_none());
        assert_eq!(state.esc.unwrap().len(), 4);
    }
}
