//! Adaptive poll interval
//!
//! Each cycle costs two match-history calls per tracked pair, so the interval
//! grows with the pair count to keep steady-state traffic under a safety
//! margin of the API quota. Up to 20 pairs the interval is stepped; beyond
//! that it grows linearly, which holds the call rate constant.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper pair count of each step and its interval in seconds
const INTERVAL_STEPS: [(usize, u64); 5] = [(4, 30), (8, 45), (12, 60), (16, 90), (20, 120)];

/// Per-pair interval once the steps are exhausted
const LINEAR_INTERVAL_PER_PAIR: Duration = Duration::from_millis(7500);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollIntervalPolicy {
    /// Used when no pairs are tracked
    pub base_interval: Duration,
    /// Calls allowed per quota window
    pub quota_calls: u32,
    pub quota_window: Duration,
    /// Share of the quota polling may use
    pub safety_margin: f64,
    /// History calls per pair per cycle
    pub calls_per_pair: u32,
    /// Relative change needed before the timer is recreated
    pub reschedule_threshold: f64,
}

impl Default for PollIntervalPolicy {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(60),
            quota_calls: 100,
            quota_window: Duration::from_secs(120),
            safety_margin: 0.8,
            calls_per_pair: 2,
            reschedule_threshold: 0.10,
        }
    }
}

impl PollIntervalPolicy {
    pub fn with_base_interval(base_interval: Duration) -> Self {
        Self {
            base_interval,
            ..Self::default()
        }
    }

    /// Interval for the given number of tracked pairs
    pub fn ideal_interval(&self, pairs: usize) -> Duration {
        if pairs == 0 {
            return self.base_interval;
        }

        INTERVAL_STEPS
            .iter()
            .find(|(max_pairs, _)| pairs <= *max_pairs)
            .map(|(_, secs)| Duration::from_secs(*secs))
            .unwrap_or_else(|| LINEAR_INTERVAL_PER_PAIR * pairs as u32)
    }

    /// True when the ideal interval differs from the current one by more
    /// than the threshold
    pub fn should_reschedule(&self, current: Duration, ideal: Duration) -> bool {
        let current_secs = current.as_secs_f64();
        if current_secs == 0.0 {
            return ideal != current;
        }
        (ideal.as_secs_f64() - current_secs).abs() > current_secs * self.reschedule_threshold
    }

    /// Steady-state history calls per minute at the ideal interval
    pub fn estimated_calls_per_minute(&self, pairs: usize) -> f64 {
        let interval = self.ideal_interval(pairs).as_secs_f64();
        if interval == 0.0 {
            return f64::INFINITY;
        }
        (pairs as f64 * self.calls_per_pair as f64) * 60.0 / interval
    }

    /// Calls per minute polling is allowed to use
    pub fn call_budget_per_minute(&self) -> f64 {
        let window_minutes = self.quota_window.as_secs_f64() / 60.0;
        if window_minutes == 0.0 {
            return 0.0;
        }
        self.safety_margin * self.quota_calls as f64 / window_minutes
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.base_interval.is_zero() {
            return Err(anyhow::anyhow!("Base poll interval must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&self.safety_margin) || self.safety_margin == 0.0 {
            return Err(anyhow::anyhow!(
                "Safety margin must be in (0, 1], got {}",
                self.safety_margin
            ));
        }
        if self.quota_calls == 0 || self.quota_window.is_zero() {
            return Err(anyhow::anyhow!("Rate-limit quota must be positive"));
        }
        if self.reschedule_threshold < 0.0 {
            return Err(anyhow::anyhow!("Reschedule threshold cannot be negative"));
        }
        Ok(())
    }
}
