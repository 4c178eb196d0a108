//! Per-window feature derivation
//!
//! `SpikeDetector` runs on every tick; `FeatureExtractor` runs once per
//! completed window and turns the buffer plus the per-tick accumulators into
//! a `WindowFeatures` set.

use crate::config::{AnalysisConfig, BandCandidates};
use crate::spectral::sweep_band;
use crate::window::WindowBuffer;
use eeg_core::{BandPower, WindowFeatures};
use tracing::trace;

/// Rising-edge counter over a fixed amplitude threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeDetector {
    threshold: f64,
    was_above: bool,
    count: u32,
}

impl SpikeDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold, was_above: false, count: 0 }
    }

    /// Feed one filtered sample; returns true on a rising edge.
    ///
    /// An edge is previous <= threshold and current > threshold.
    pub fn update(&mut self, sample: f64) -> bool {
        let above = sample > self.threshold;
        let rising = above && !self.was_above;
        if rising {
            self.count = self.count.saturating_add(1);
        }
        self.was_above = above;
        rising
    }

    /// Spikes counted in the current window
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Read the window's count and start a new one.
    ///
    /// Edge state carries over, so a level held across the boundary is not
    /// counted twice.
    pub fn take_count(&mut self) -> u32 {
        std::mem::take(&mut self.count)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn reset(&mut self) {
        self.was_above = false;
        self.count = 0;
    }
}

/// `power / (power + rms² + epsilon)`
#[inline]
pub fn band_index(power: f64, rms: f64, epsilon: f64) -> f64 {
    power / (power + rms * rms + epsilon)
}

/// Window aggregator: RMS, band sweeps and normalized indices
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    sampling_rate: f64,
    index_epsilon: f64,
    theta: BandCandidates,
    delta: BandCandidates,
    beta: BandCandidates,
}

impl FeatureExtractor {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            sampling_rate: config.sampling_rate,
            index_epsilon: config.index_epsilon,
            theta: config.theta,
            delta: config.delta,
            beta: config.beta,
        }
    }

    fn sweep<const N: usize>(&self, candidates: &BandCandidates, window: &WindowBuffer<N>, rms: f64) -> BandPower {
        let peak = sweep_band(&candidates.frequencies_hz, window, self.sampling_rate);
        trace!(band = %candidates.band, power = peak.power, dominant_hz = peak.dominant_hz, "band sweep");
        BandPower {
            power: peak.power,
            index: band_index(peak.power, rms, self.index_epsilon),
            dominant_hz: peak.dominant_hz,
        }
    }

    /// Derive the feature set of a completed window.
    ///
    /// `alpha_power` comes from the continuous accumulator; theta, delta and
    /// beta are swept over the buffer here.
    pub fn extract<const N: usize>(
        &self,
        window: &WindowBuffer<N>,
        alpha_power: f64,
        spike_count: u32,
        second: u64,
    ) -> WindowFeatures {
        let rms = window.rms();

        WindowFeatures {
            second,
            rms,
            spike_count,
            alpha_power,
            attention: band_index(alpha_power, rms, self.index_epsilon),
            theta: self.sweep(&self.theta, window, rms),
            delta: self.sweep(&self.delta, window, rms),
            beta: self.sweep(&self.beta, window, rms),
        }
    }
}
