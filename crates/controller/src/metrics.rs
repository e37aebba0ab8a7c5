//! Control loop metrics
//!
//! In-process counters for tests and the run summary. Every update is also
//! forwarded to the `metrics` facade through `observability`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use contracts::StatusCode;
use observability::{RunningStats, StatsSummary};

/// Counters of one control loop
#[derive(Debug, Default)]
pub struct ControllerMetrics {
    /// Step actions served
    steps: AtomicU64,
    /// Reset actions served
    resets: AtomicU64,
    /// Ticks spent settling across all resets
    settle_ticks: AtomicU64,
    /// Datagrams dropped without a reply
    packets_dropped: AtomicU64,
    /// Sensor waits that gave up
    barrier_timeouts: AtomicU64,
    /// Replies with status Ok
    replies_ok: AtomicU64,
    /// Replies with status Error
    replies_error: AtomicU64,
    /// Replies that could not be sent
    send_failures: AtomicU64,
    /// Sensor wait durations (ms)
    sensor_wait_ms: Mutex<RunningStats>,
}

impl ControllerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_step(&self) {
        self.steps.fetch_add(1, Ordering::Relaxed);
        observability::record_step();
    }

    pub fn record_reset(&self, settle_ticks: u64) {
        self.resets.fetch_add(1, Ordering::Relaxed);
        self.settle_ticks.fetch_add(settle_ticks, Ordering::Relaxed);
        observability::record_reset(settle_ticks);
    }

    pub fn record_dropped(&self, reason: &'static str) {
        self.packets_dropped.fetch_add(1, Ordering::Relaxed);
        observability::record_packet_dropped(reason);
    }

    pub fn record_sensor_wait(&self, elapsed: Duration, completed: bool) {
        self.sensor_wait_ms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(elapsed.as_secs_f64() * 1000.0);
        observability::record_sensor_wait(elapsed);

        if !completed {
            self.barrier_timeouts.fetch_add(1, Ordering::Relaxed);
            observability::record_barrier_timeout();
        }
    }

    pub fn record_reply(&self, status: StatusCode) {
        match status {
            StatusCode::Ok => self.replies_ok.fetch_add(1, Ordering::Relaxed),
            StatusCode::Error => self.replies_error.fetch_add(1, Ordering::Relaxed),
        };
        observability::record_reply(status);
    }

    pub fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Replies sent, whatever their status
    pub fn replies(&self) -> u64 {
        self.replies_ok.load(Ordering::Relaxed) + self.replies_error.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            steps: self.steps.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            settle_ticks: self.settle_ticks.load(Ordering::Relaxed),
            packets_dropped: self.packets_dropped.load(Ordering::Relaxed),
            barrier_timeouts: self.barrier_timeouts.load(Ordering::Relaxed),
            replies_ok: self.replies_ok.load(Ordering::Relaxed),
            replies_error: self.replies_error.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            sensor_wait_ms: self
                .sensor_wait_ms
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .summary(),
        }
    }
}

/// Snapshot of control loop metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub steps: u64,
    pub resets: u64,
    pub settle_ticks: u64,
    pub packets_dropped: u64,
    pub barrier_timeouts: u64,
    pub replies_ok: u64,
    pub replies_error: u64,
    pub send_failures: u64,
    pub sensor_wait_ms: StatsSummary,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== steplink Summary ===")?;
        writeln!(f, "Steps: {}", self.steps)?;
        writeln!(
            f,
            "Resets: {} ({} settle ticks)",
            self.resets, self.settle_ticks
        )?;
        writeln!(
            f,
            "Replies: {} ok, {} error, {} failed to send",
            self.replies_ok, self.replies_error, self.send_failures
        )?;
        writeln!(f, "Dropped datagrams: {}", self.packets_dropped)?;
        writeln!(f, "Sensor wait timeouts: {}", self.barrier_timeouts)?;
        write!(f, "Sensor wait (ms): {}", self.sensor_wait_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = ControllerMetrics::new();
        metrics.record_step();
        metrics.record_step();
        metrics.record_reset(4);
        metrics.record_reset(2);
        metrics.record_dropped("decode");
        metrics.record_reply(StatusCode::Ok);
        metrics.record_reply(StatusCode::Error);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.steps, 2);
        assert_eq!(snapshot.resets, 2);
        assert_eq!(snapshot.settle_ticks, 6);
        assert_eq!(snapshot.packets_dropped, 1);
        assert_eq!(metrics.replies(), 2);
    }

    #[test]
    fn test_sensor_wait_and_timeouts() {
        let metrics = ControllerMetrics::new();
        metrics.record_sensor_wait(Duration::from_millis(2), true);
        metrics.record_sensor_wait(Duration::from_millis(4), false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.barrier_timeouts, 1);
        assert_eq!(snapshot.sensor_wait_ms.count, 2);
        assert!((snapshot.sensor_wait_ms.mean - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_display() {
        let metrics = ControllerMetrics::new();
        metrics.record_step();
        let text = metrics.snapshot().to_string();
        assert!(text.contains("Steps: 1"));
        assert!(text.contains("Sensor wait (ms): N/A"));
    }
}
