//! Run statistics.

use std::time::Duration;

use controller::MetricsSnapshot;

/// Statistics from one bridge run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Control loop counters at shutdown
    pub controller: MetricsSnapshot,

    /// Simulation ticks advanced by the mock world
    pub ticks: u64,
}

impl RunStats {
    /// Replies per wall-clock second
    pub fn replies_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            (self.controller.replies_ok + self.controller.replies_error) as f64 / secs
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!();
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Ticks: {}", self.ticks);
        println!("Replies/s: {:.1}", self.replies_per_sec());
        println!("{}", self.controller);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replies_per_sec() {
        let stats = RunStats {
            duration: Duration::from_secs(2),
            controller: MetricsSnapshot {
                replies_ok: 30,
                replies_error: 10,
                ..Default::default()
            },
            ticks: 40,
        };
        assert!((stats.replies_per_sec() - 20.0).abs() < 1e-9);
        assert_eq!(RunStats::default().replies_per_sec(), 0.0);
    }
}
