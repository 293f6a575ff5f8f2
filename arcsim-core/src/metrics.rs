use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wall-clock timings of one or more ticks, split by phase.
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimMetrics {
    pub total_ticks: u64,
    pub total_time: Duration,
    /// Building and province processing of owned provinces
    pub provinces_time: Duration,
    /// Cycle counts, foreign income, and the three limit passes
    pub limits_time: Duration,
    pub buildable_time: Duration,
}

impl SimMetrics {
    pub fn tick_avg_ms(&self) -> f64 {
        if self.total_ticks == 0 {
            0.0
        } else {
            self.total_time.as_secs_f64() * 1000.0 / self.total_ticks as f64
        }
    }

    /// Folds another run's timings into this one.
    pub fn absorb(&mut self, other: &SimMetrics) {
        self.total_ticks += other.total_ticks;
        self.total_time += other.total_time;
        self.provinces_time += other.provinces_time;
        self.limits_time += other.limits_time;
        self.buildable_time += other.buildable_time;
    }
}
