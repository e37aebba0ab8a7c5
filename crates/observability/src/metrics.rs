//! Bridge metrics
//!
//! Thin helpers over the `metrics` facade so metric names live in one place.
//! Without an installed recorder every call is a no-op.

use std::time::Duration;

use contracts::{SensorKind, StatusCode};
use metrics::{counter, histogram};

/// One Step action served
pub fn record_step() {
    counter!("steplink_steps_total").increment(1);
}

/// One Reset action served, with the ticks its settle sequence took
pub fn record_reset(settle_ticks: u64) {
    counter!("steplink_resets_total").increment(1);
    histogram!("steplink_settle_ticks").record(settle_ticks as f64);
}

/// Datagram dropped without a reply
pub fn record_packet_dropped(reason: &'static str) {
    counter!("steplink_packets_dropped_total", "reason" => reason).increment(1);
}

/// Time the control loop spent blocked on sensor callbacks
pub fn record_sensor_wait(elapsed: Duration) {
    histogram!("steplink_sensor_wait_ms").record(elapsed.as_secs_f64() * 1000.0);
}

/// Sensor wait gave up with arrivals outstanding
pub fn record_barrier_timeout() {
    counter!("steplink_barrier_timeouts_total").increment(1);
}

/// Reply sent to the agent
pub fn record_reply(status: StatusCode) {
    let status = match status {
        StatusCode::Ok => "ok",
        StatusCode::Error => "error",
    };
    counter!("steplink_replies_total", "status" => status).increment(1);
}

/// Sensor message applied to the store
pub fn record_sensor_message(kind: SensorKind) {
    counter!("steplink_sensor_messages_total", "kind" => kind.as_str()).increment(1);
}

/// Sensor message rejected by the store
pub fn record_sensor_rejected(kind: SensorKind) {
    counter!("steplink_sensor_messages_rejected_total", "kind" => kind.as_str()).increment(1);
}

/// Summary of a [`RunningStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean / variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
