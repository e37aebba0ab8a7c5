//! Completion counter
//!
//! Signed counter biased negative by the number of expected arrivals. The
//! tick is complete once it climbs back to zero. Not synchronized on its own;
//! `SharedSensorState` keeps it under the store lock.

/// Running arrival counter for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionCounter {
    value: i64,
}

impl CompletionCounter {
    /// Expect `expected` arrivals
    pub fn arm(&mut self, expected: u32) {
        self.value = -i64::from(expected);
    }

    /// Count one arrival
    pub fn record_arrival(&mut self) {
        self.value = self.value.saturating_add(1);
    }

    /// All expected arrivals seen
    pub fn is_complete(&self) -> bool {
        self.value >= 0
    }

    /// Arrivals still missing
    pub fn outstanding(&self) -> u64 {
        if self.value < 0 {
            self.value.unsigned_abs()
        } else {
            0
        }
    }

    /// Raw counter value
    pub fn value(&self) -> i64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_zero_is_complete() {
        let mut counter = CompletionCounter::default();
        counter.arm(0);
        assert!(counter.is_complete());
        assert_eq!(counter.outstanding(), 0);
    }

    #[test]
    fn test_completes_on_kth_arrival() {
        let mut counter = CompletionCounter::default();
        counter.arm(3);
        for outstanding in [3, 2, 1] {
            assert!(!counter.is_complete());
            assert_eq!(counter.outstanding(), outstanding);
            counter.record_arrival();
        }
        assert!(counter.is_complete());
    }

    #[test]
    fn test_late_arrivals_keep_counter_complete() {
        let mut counter = CompletionCounter::default();
        counter.arm(1);
        counter.record_arrival();
        counter.record_arrival();
        assert!(counter.is_complete());
        assert_eq!(counter.value(), 1);

        // Re-arming discards the surplus
        counter.arm(2);
        assert_eq!(counter.value(), -2);
    }
}
