//! SharedSensorState - store and completion counter behind one lock
//!
//! Sensor threads apply a message and count the arrival inside the same
//! critical section, so the controller never sees a completed counter with a
//! store that is missing the matching update.

use std::collections::BTreeSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use contracts::{SensorKind, SensorMessage, SettleConfig, State, StatusCode};
use tracing::{debug, warn};

use crate::barrier::CompletionCounter;
use crate::error::SyncError;
use crate::store::SensorStateStore;

#[derive(Debug)]
struct Inner {
    store: SensorStateStore,
    counter: CompletionCounter,
}

/// Sensor state shared between the control loop and sensor callbacks
#[derive(Debug)]
pub struct SharedSensorState {
    inner: Mutex<Inner>,
    arrived: Condvar,
}

impl SharedSensorState {
    /// Create with a sentinel-seeded store and a complete counter
    pub fn new(enabled: BTreeSet<SensorKind>, actuator_count: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                store: SensorStateStore::new(enabled, actuator_count),
                counter: CompletionCounter::default(),
            }),
            arrived: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking callback must not wedge the control loop
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Expect `expected` arrivals for the next tick
    ///
    /// Must be called before the tick that produces them.
    pub fn arm(&self, expected: u32) {
        self.lock().counter.arm(expected);
    }

    /// Count one arrival without touching the store
    pub fn signal_arrival(&self) {
        self.lock().counter.record_arrival();
        self.arrived.notify_all();
    }

    /// Apply one sensor message and count it
    ///
    /// Rejected messages are not counted.
    pub fn apply(&self, message: SensorMessage) -> Result<(), SyncError> {
        {
            let mut inner = self.lock();
            if !inner.store.is_enabled(message.kind()) {
                return Err(SyncError::SensorDisabled(message.kind()));
            }
            match &message {
                SensorMessage::Imu(imu) => inner.store.apply_imu(imu),
                SensorMessage::Esc(esc) => inner.store.apply_esc(esc)?,
            }
            inner.counter.record_arrival();
        }
        self.arrived.notify_all();
        Ok(())
    }

    /// Block until every armed arrival has been counted
    ///
    /// Returns immediately when armed with zero.
    pub fn await_completion(&self) {
        let guard = self.lock();
        let _guard = self
            .arrived
            .wait_while(guard, |inner| !inner.counter.is_complete())
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Bounded variant of [`await_completion`](Self::await_completion)
    ///
    /// Returns `false` if the deadline passed with arrivals still missing.
    pub fn await_completion_timeout(&self, timeout: Duration) -> bool {
        let started = Instant::now();
        let guard = self.lock();
        let (guard, result) = self
            .arrived
            .wait_timeout_while(guard, timeout, |inner| !inner.counter.is_complete())
            .unwrap_or_else(PoisonError::into_inner);

        if result.timed_out() && !guard.counter.is_complete() {
            warn!(
                outstanding = guard.counter.outstanding(),
                waited_ms = started.elapsed().as_millis() as u64,
                "Sensor wait timed out"
            );
            return false;
        }
        true
    }

    /// Wait with an optional bound; `None` waits forever
    pub fn await_with(&self, timeout: Option<Duration>) -> bool {
        match timeout {
            Some(timeout) => self.await_completion_timeout(timeout),
            None => {
                self.await_completion();
                true
            }
        }
    }

    /// Re-seed every channel with sentinels
    pub fn seed_sentinels(&self) {
        self.lock().store.seed_sentinels();
        debug!("Sensor store seeded with sentinels");
    }

    /// Compose a reply from the current store
    pub fn snapshot(&self, sim_time: f64, status: StatusCode) -> State {
        self.lock().store.snapshot(sim_time, status)
    }

    /// Settle check against the current store
    pub fn is_settled(&self, settle: &SettleConfig) -> bool {
        self.lock().store.is_settled(settle)
    }

    /// IMU messages observed so far
    pub fn imu_samples(&self) -> u64 {
        self.lock().store.imu_samples()
    }

    /// Arrivals still missing for the armed tick
    pub fn outstanding(&self) -> u64 {
        self.lock().counter.outstanding()
    }
}
