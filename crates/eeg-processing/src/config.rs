//! Analysis parameters for the EEG pipeline
//!
//! Every fixed parameter of the deployed analysis lives here with its
//! documented default. Tests and the monitor binary may load alternatives
//! from JSON; the pipeline itself never mutates them after construction.

use crate::filters::{BiquadCoeffs, CASCADE_SECTIONS, EEG_BANDPASS_256HZ};
use eeg_core::{config_error, Band, EegError, EegResult};
use serde::{Deserialize, Serialize};

/// Sampling rate of the acquisition front end
pub const SAMPLING_RATE_HZ: usize = 256;

/// Analysis window: one second of samples
pub const WINDOW_LEN: usize = SAMPLING_RATE_HZ;

/// Candidate frequencies evaluated per swept band
pub const CANDIDATES_PER_BAND: usize = 5;

/// Additive guard in every band index denominator
pub const INDEX_EPSILON: f64 = 1e-6;

/// Candidate frequencies for one swept band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandCandidates {
    pub band: Band,
    pub frequencies_hz: [f64; CANDIDATES_PER_BAND],
}

impl BandCandidates {
    pub fn theta() -> Self {
        Self { band: Band::Theta, frequencies_hz: [4.0, 5.0, 6.0, 7.0, 8.0] }
    }

    pub fn delta() -> Self {
        Self { band: Band::Delta, frequencies_hz: [0.5, 1.0, 2.0, 3.0, 4.0] }
    }

    pub fn beta() -> Self {
        Self { band: Band::Beta, frequencies_hz: [13.0, 15.0, 20.0, 25.0, 30.0] }
    }
}

/// Thresholds of the state decision list.
///
/// All comparisons are strict; see `StateClassifier` for rule order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    /// RMS above this is movement (default 50)
    pub moving_rms: f64,
    /// More spikes than this in one window is movement (default 3)
    pub moving_spike_count: u32,
    /// Attention tiers for the focus states (defaults 0.95 / 0.90 / 0.85)
    pub highly_focused_attention: f64,
    pub fully_focused_attention: f64,
    pub focused_attention: f64,
    /// Fully relaxed: theta index, attention, max RMS (defaults 0.98 / 0.95 / 5)
    pub fully_relaxed_theta_index: f64,
    pub fully_relaxed_attention: f64,
    pub fully_relaxed_rms: f64,
    /// Relaxed: theta index and attention (defaults 0.95 / 0.90)
    pub relaxed_theta_index: f64,
    pub relaxed_attention: f64,
    /// Deep sleep: delta index and max RMS (defaults 0.98 / 3)
    pub deep_sleep_delta_index: f64,
    pub deep_sleep_rms: f64,
    /// Semi-relaxed: theta index or attention (defaults 0.90 / 0.85)
    pub semi_relaxed_theta_index: f64,
    pub semi_relaxed_attention: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            moving_rms: 50.0,
            moving_spike_count: 3,
            highly_focused_attention: 0.95,
            fully_focused_attention: 0.90,
            focused_attention: 0.85,
            fully_relaxed_theta_index: 0.98,
            fully_relaxed_attention: 0.95,
            fully_relaxed_rms: 5.0,
            relaxed_theta_index: 0.95,
            relaxed_attention: 0.90,
            deep_sleep_delta_index: 0.98,
            deep_sleep_rms: 3.0,
            semi_relaxed_theta_index: 0.90,
            semi_relaxed_attention: 0.85,
        }
    }
}

impl ClassifierThresholds {
    /// Index thresholds must lie in [0, 1]; RMS limits must be non-negative
    pub fn validate(&self) -> EegResult<()> {
        let indices = [
            ("highly_focused_attention", self.highly_focused_attention),
            ("fully_focused_attention", self.fully_focused_attention),
            ("focused_attention", self.focused_attention),
            ("fully_relaxed_theta_index", self.fully_relaxed_theta_index),
            ("fully_relaxed_attention", self.fully_relaxed_attention),
            ("relaxed_theta_index", self.relaxed_theta_index),
            ("relaxed_attention", self.relaxed_attention),
            ("deep_sleep_delta_index", self.deep_sleep_delta_index),
            ("semi_relaxed_theta_index", self.semi_relaxed_theta_index),
            ("semi_relaxed_attention", self.semi_relaxed_attention),
        ];
        for (name, value) in indices {
            if !(0.0..=1.0).contains(&value) {
                return Err(config_error!("{} must be within [0, 1], got {}", name, value));
            }
        }

        let amplitudes = [
            ("moving_rms", self.moving_rms),
            ("fully_relaxed_rms", self.fully_relaxed_rms),
            ("deep_sleep_rms", self.deep_sleep_rms),
        ];
        for (name, value) in amplitudes {
            if !(value.is_finite() && value >= 0.0) {
                return Err(config_error!("{} must be a non-negative number, got {}", name, value));
            }
        }

        Ok(())
    }
}

/// Complete analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Configuration name/profile
    pub name: String,
    /// Sampling rate in Hz
    pub sampling_rate: f64,
    /// Amplitude above which a rising edge counts as a spike
    pub spike_threshold: f64,
    /// Frequency tracked by the continuous alpha estimator
    pub alpha_target_hz: f64,
    pub theta: BandCandidates,
    pub delta: BandCandidates,
    pub beta: BandCandidates,
    /// Additive guard in index denominators
    pub index_epsilon: f64,
    /// Bandpass sections in cascade order
    pub filter_sections: [BiquadCoeffs; CASCADE_SECTIONS],
    pub thresholds: ClassifierThresholds,
}

impl AnalysisConfig {
    /// BioAmp EEG front end: 256 Hz, one-second windows
    pub fn bioamp_256hz() -> Self {
        Self {
            name: "BioAmp EEG 256 Hz".to_string(),
            sampling_rate: SAMPLING_RATE_HZ as f64,
            spike_threshold: 50.0,
            alpha_target_hz: 10.0,
            theta: BandCandidates::theta(),
            delta: BandCandidates::delta(),
            beta: BandCandidates::beta(),
            index_epsilon: INDEX_EPSILON,
            filter_sections: EEG_BANDPASS_256HZ,
            thresholds: ClassifierThresholds::default(),
        }
    }

    /// Swept bands in evaluation order
    pub fn swept_bands(&self) -> [&BandCandidates; 3] {
        [&self.theta, &self.delta, &self.beta]
    }

    /// Validate the configuration for a given window length
    pub fn validate(&self, window_len: usize) -> EegResult<()> {
        if window_len == 0 {
            return Err(config_error!("window length must be greater than 0"));
        }

        if !(self.sampling_rate.is_finite() && self.sampling_rate > 0.0) {
            return Err(config_error!("sampling rate must be positive, got {}", self.sampling_rate));
        }

        let nyquist = self.sampling_rate / 2.0;
        if !(self.alpha_target_hz > 0.0 && self.alpha_target_hz < nyquist) {
            return Err(config_error!(
                "alpha target {} Hz must lie between 0 and Nyquist ({} Hz)",
                self.alpha_target_hz,
                nyquist
            ));
        }

        let expected = [Band::Theta, Band::Delta, Band::Beta];
        for (candidates, band) in self.swept_bands().iter().zip(expected) {
            if candidates.band != band {
                return Err(config_error!(
                    "candidate set for {} is labelled {}",
                    band,
                    candidates.band
                ));
            }
            for &freq in &candidates.frequencies_hz {
                if !(freq > 0.0 && freq < nyquist) {
                    return Err(config_error!(
                        "{} candidate {} Hz must lie between 0 and Nyquist ({} Hz)",
                        band,
                        freq,
                        nyquist
                    ));
                }
            }
        }

        if !self.spike_threshold.is_finite() {
            return Err(config_error!("spike threshold must be finite"));
        }

        if !(self.index_epsilon.is_finite() && self.index_epsilon > 0.0) {
            return Err(config_error!("index epsilon must be positive, got {}", self.index_epsilon));
        }

        for (i, section) in self.filter_sections.iter().enumerate() {
            if !section.is_stable() {
                return Err(config_error!("filter section {} is unstable: {:?}", i + 1, section));
            }
        }

        self.thresholds.validate()
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> EegResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EegError::ConfigurationError {
            message: format!("Failed to serialize configuration: {}", e),
        })
    }

    /// Import configuration from JSON
    pub fn from_json(json: &str) -> EegResult<Self> {
        serde_json::from_str(json).map_err(|e| EegError::ConfigurationError {
            message: format!("Failed to deserialize configuration: {}", e),
        })
    }

    /// One sampling period, truncated to whole microseconds
    pub fn sample_period_us(&self) -> u64 {
        (1_000_000.0 / self.sampling_rate).trunc() as u64
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::bioamp_256hz()
    }
}
