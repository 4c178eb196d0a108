//! Per-sample processor trait and real-time budget metrics

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Core trait for stateful stages on the per-sample path
pub trait SampleProcessor {
    /// Consume one sample and return the processed value
    fn process_sample(&mut self, input: f64) -> f64;

    /// Get processor name/identifier
    fn name(&self) -> &str;

    /// Zero all internal state
    fn reset(&mut self);

    /// True while every piece of internal state is finite
    fn is_finite(&self) -> bool {
        true
    }
}

/// Timing of the work done at one window boundary
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    /// Time spent aggregating and classifying, in microseconds
    pub processing_time_us: u64,
    /// Allowed time (one sampling period), in microseconds
    pub budget_us: u64,
}

impl ProcessingMetrics {
    /// Start timing a window boundary against a sampling-period budget
    pub fn start_timing(budget: Duration) -> ProcessingTimer {
        ProcessingTimer {
            start_time: Instant::now(),
            budget_us: budget.as_micros() as u64,
        }
    }

    /// Check if the boundary work fit inside one sampling period
    pub fn within_budget(&self) -> bool {
        self.processing_time_us <= self.budget_us
    }

    /// Fraction of the budget used
    pub fn utilization(&self) -> f64 {
        if self.budget_us == 0 {
            return f64::INFINITY;
        }
        self.processing_time_us as f64 / self.budget_us as f64
    }
}

/// Helper for timing processing operations
pub struct ProcessingTimer {
    start_time: Instant,
    budget_us: u64,
}

impl ProcessingTimer {
    /// Finish timing and return metrics
    pub fn finish(self) -> ProcessingMetrics {
        ProcessingMetrics {
            processing_time_us: self.start_time.elapsed().as_micros() as u64,
            budget_us: self.budget_us,
        }
    }
}

/// Aggregate timing over the windows processed so far
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelinePerformance {
    pub windows_processed: u64,
    pub samples_processed: u64,
    pub budget_overruns: u64,
    pub max_window_time_us: u64,
    pub total_window_time_us: u64,
}

impl PipelinePerformance {
    /// Fold one boundary's metrics in; returns true when it overran
    pub fn record(&mut self, metrics: &ProcessingMetrics) -> bool {
        self.windows_processed += 1;
        self.total_window_time_us += metrics.processing_time_us;
        self.max_window_time_us = self.max_window_time_us.max(metrics.processing_time_us);

        let overran = !metrics.within_budget();
        if overran {
            self.budget_overruns += 1;
        }
        overran
    }

    pub fn avg_window_time_us(&self) -> u64 {
        if self.windows_processed == 0 {
            0
        } else {
            self.total_window_time_us / self.windows_processed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_metrics() {
        let timer = ProcessingMetrics::start_timing(Duration::from_secs(10));
        std::thread::sleep(Duration::from_millis(1));
        let metrics = timer.finish();

        assert!(metrics.processing_time_us > 0);
        assert_eq!(metrics.budget_us, 10_000_000);
        assert!(metrics.within_budget());
        assert!(metrics.utilization() < 1.0);
    }

    #[test]
    fn test_performance_tracks_overruns() {
        let mut performance = PipelinePerformance::default();

        let fast = ProcessingMetrics { processing_time_us: 100, budget_us: 3906 };
        let slow = ProcessingMetrics { processing_time_us: 5000, budget_us: 3906 };

        assert!(!performance.record(&fast));
        assert!(performance.record(&slow));

        assert_eq!(performance.windows_processed, 2);
        assert_eq!(performance.budget_overruns, 1);
        assert_eq!(performance.max_window_time_us, 5000);
        assert_eq!(performance.avg_window_time_us(), 2550);
    }
}
