//! Raw EEG front-end simulator
//!
//! Emits readings the way a 10-bit ADC behind a biopotential amplifier
//! would: centred on mid-scale, quantized and clipped to the converter range.

use crate::signal_patterns::RhythmPattern;
use eeg_core::{EegError, EegResult, SampleSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// ADC model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdcConfig {
    /// Converter resolution; full scale is `2^bits - 1`
    pub resolution_bits: u32,
    /// Round to whole counts
    pub quantize: bool,
}

impl AdcConfig {
    pub fn full_scale(&self) -> f64 {
        ((1u64 << self.resolution_bits) - 1) as f64
    }

    /// Resting level of the amplifier output
    pub fn mid_scale(&self) -> f64 {
        (1u64 << (self.resolution_bits - 1)) as f64
    }
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self { resolution_bits: 10, quantize: true }
    }
}

/// Noise configuration for realistic EEG simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation in counts (0.0 = no noise)
    pub gaussian_std: f64,
    /// Baseline wander amplitude in counts
    pub baseline_wander: f64,
    /// Baseline wander frequency
    pub wander_hz: f64,
    /// Per-sample probability of an isolated artifact (0.0 to 1.0)
    pub artifact_prob: f64,
    /// Artifact amplitude in counts
    pub artifact_amp: f64,
}

impl NoiseConfig {
    /// Clean signal
    pub fn none() -> Self {
        Self {
            gaussian_std: 0.0,
            baseline_wander: 0.0,
            wander_hz: 0.0,
            artifact_prob: 0.0,
            artifact_amp: 0.0,
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 2.0,
            baseline_wander: 5.0,
            wander_hz: 0.1,
            artifact_prob: 0.0,
            artifact_amp: 150.0,
        }
    }
}

/// Configuration for EEG simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EegSimulatorConfig {
    /// Sampling rate in Hz
    pub sampling_rate: f64,
    /// Rhythm to generate
    pub pattern: RhythmPattern,
    pub noise: NoiseConfig,
    pub adc: AdcConfig,
    /// Power line interference (50/60Hz) and its amplitude in counts
    pub powerline: Option<(f64, f64)>,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for EegSimulatorConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 256.0,
            pattern: RhythmPattern::rest(),
            noise: NoiseConfig::default(),
            adc: AdcConfig::default(),
            powerline: Some((50.0, 3.0)),
            seed: None,
        }
    }
}

impl EegSimulatorConfig {
    /// Noise-free, interference-free trace of a single pattern
    pub fn clean(pattern: RhythmPattern) -> Self {
        Self {
            pattern,
            noise: NoiseConfig::none(),
            powerline: None,
            seed: Some(0),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> EegResult<()> {
        if !(self.sampling_rate.is_finite() && self.sampling_rate > 0.0) {
            return Err(EegError::ConfigurationError {
                message: format!("Invalid sampling rate: {}", self.sampling_rate),
            });
        }
        if !(1..=24).contains(&self.adc.resolution_bits) {
            return Err(EegError::ConfigurationError {
                message: format!("ADC resolution must be 1-24 bits, got {}", self.adc.resolution_bits),
            });
        }
        let noise = &self.noise;
        if !(noise.gaussian_std.is_finite() && noise.gaussian_std >= 0.0) {
            return Err(EegError::ConfigurationError {
                message: format!("Noise standard deviation must be finite and non-negative, got {}", noise.gaussian_std),
            });
        }
        for (name, value) in [
            ("baseline wander", noise.baseline_wander),
            ("wander frequency", noise.wander_hz),
            ("artifact amplitude", noise.artifact_amp),
        ] {
            if !value.is_finite() {
                return Err(EegError::ConfigurationError {
                    message: format!("Noise {} must be finite, got {}", name, value),
                });
            }
        }
        if let Some((freq, amplitude)) = self.powerline {
            if !(freq.is_finite() && amplitude.is_finite()) {
                return Err(EegError::ConfigurationError {
                    message: format!("Invalid power line interference: {} Hz, {} counts", freq, amplitude),
                });
            }
        }
        if !(0.0..=1.0).contains(&noise.artifact_prob) {
            return Err(EegError::ConfigurationError {
                message: format!("Artifact probability must be within [0, 1], got {}", noise.artifact_prob),
            });
        }
        Ok(())
    }
}

/// EEG signal simulator
pub struct EegSimulator {
    config: EegSimulatorConfig,
    rng: StdRng,
    normal_dist: Normal<f64>,
    sample_index: u64,
    sample_limit: Option<u64>,
}

impl EegSimulator {
    /// Create new EEG simulator with configuration
    pub fn new(config: EegSimulatorConfig) -> EegResult<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let normal_dist = Normal::new(0.0, config.noise.gaussian_std).map_err(|e| EegError::ConfigurationError {
            message: format!("Failed to create normal distribution: {}", e),
        })?;

        debug!(pattern = config.pattern.description(), seed = ?config.seed, "EEG simulator created");

        Ok(Self {
            config,
            rng,
            normal_dist,
            sample_index: 0,
            sample_limit: None,
        })
    }

    /// Stop yielding samples (as a `SampleSource`) after `limit` readings
    pub fn with_sample_limit(mut self, limit: u64) -> Self {
        self.sample_limit = Some(limit);
        self
    }

    /// Next raw reading
    pub fn next_raw(&mut self) -> f64 {
        let time = self.sample_index as f64 / self.config.sampling_rate;
        self.sample_index += 1;

        let mut value = self.config.adc.mid_scale() + self.config.pattern.value_at_time(time);
        value += self.add_noise(time);

        if let Some((freq, amplitude)) = self.config.powerline {
            value += amplitude * (2.0 * PI * freq * time).sin();
        }

        if self.config.adc.quantize {
            value = value.round();
        }
        value.clamp(0.0, self.config.adc.full_scale())
    }

    fn add_noise(&mut self, time: f64) -> f64 {
        let noise = &self.config.noise;
        let mut value = 0.0;

        if noise.gaussian_std > 0.0 {
            value += self.normal_dist.sample(&mut self.rng);
        }

        // slow electrode drift
        value += noise.baseline_wander * (2.0 * PI * noise.wander_hz * time).sin();

        if noise.artifact_prob > 0.0 && self.rng.gen::<f64>() < noise.artifact_prob {
            value += noise.artifact_amp * self.rng.gen_range(-1.0..1.0);
        }

        value
    }

    /// Generate `count` consecutive readings
    pub fn generate_samples(&mut self, count: usize) -> Vec<f64> {
        (0..count).map(|_| self.next_raw()).collect()
    }

    /// Generate readings for `duration` seconds
    pub fn generate(&mut self, duration: f64) -> Vec<f64> {
        let count = (duration * self.config.sampling_rate).round().max(0.0) as usize;
        self.generate_samples(count)
    }

    /// Readings produced so far
    pub fn samples_generated(&self) -> u64 {
        self.sample_index
    }
}

impl SampleSource for EegSimulator {
    fn next_sample(&mut self) -> EegResult<Option<f64>> {
        if self.sample_limit.is_some_and(|limit| self.sample_index >= limit) {
            return Ok(None);
        }
        Ok(Some(self.next_raw()))
    }

    fn name(&self) -> &str {
        self.config.pattern.description()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eeg_core::{BrainState, FeatureRecord};
    use eeg_processing::EegPipeline;

    /// States of windows 16-22, after the power-on transient of the mid-scale step
    fn settled_states(pattern: RhythmPattern) -> Vec<BrainState> {
        let mut simulator = EegSimulator::new(EegSimulatorConfig::clean(pattern))
            .unwrap()
            .with_sample_limit(256 * 22);
        let mut pipeline: EegPipeline = EegPipeline::default();
        let mut records: Vec<FeatureRecord> = Vec::new();

        pipeline.drive(&mut simulator, &mut records, None).unwrap();
        assert_eq!(records.len(), 22);
        records[15..].iter().map(|r| r.state()).collect()
    }

    #[test]
    fn test_generate_length_and_range() {
        let config = EegSimulatorConfig { seed: Some(3), ..Default::default() };
        let mut simulator = EegSimulator::new(config).unwrap();

        let samples = simulator.generate(2.0);
        assert_eq!(samples.len(), 512);
        assert_eq!(simulator.samples_generated(), 512);
        assert!(samples.iter().all(|&x| (0.0..=1023.0).contains(&x) && x.fract() == 0.0));

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!((mean - 512.0).abs() < 10.0, "mean {}", mean);
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let config = EegSimulatorConfig { seed: Some(42), ..Default::default() };
        let a = EegSimulator::new(config.clone()).unwrap().generate_samples(1000);
        let b = EegSimulator::new(config).unwrap().generate_samples(1000);
        assert_eq!(a, b);

        let other = EegSimulatorConfig { seed: Some(43), ..Default::default() };
        let c = EegSimulator::new(other).unwrap().generate_samples(1000);
        assert_ne!(a, c);
    }

    #[test]
    fn test_clipping_at_rails() {
        let config = EegSimulatorConfig::clean(RhythmPattern::Rest {
            alpha: crate::Oscillation::new(10.0, 2_000.0),
        });
        let samples = EegSimulator::new(config).unwrap().generate(1.0);
        assert!(samples.contains(&0.0));
        assert!(samples.contains(&1023.0));
    }

    #[test]
    fn test_sample_limit() {
        let mut simulator = EegSimulator::new(EegSimulatorConfig::clean(RhythmPattern::Flat))
            .unwrap()
            .with_sample_limit(3);
        assert_eq!(simulator.next_sample().unwrap(), Some(512.0));
        simulator.next_sample().unwrap();
        simulator.next_sample().unwrap();
        assert_eq!(simulator.next_sample().unwrap(), None);
    }

    #[test]
    fn test_invalid_config() {
        let config = EegSimulatorConfig { sampling_rate: 0.0, ..Default::default() };
        assert!(EegSimulator::new(config).is_err());

        let mut config = EegSimulatorConfig::default();
        config.noise.gaussian_std = -1.0;
        assert!(EegSimulator::new(config).is_err());

        let mut config = EegSimulatorConfig::default();
        config.adc.resolution_bits = 0;
        assert!(EegSimulator::new(config).is_err());

        let mut config = EegSimulatorConfig::default();
        config.noise.gaussian_std = f64::NAN;
        assert!(EegSimulator::new(config).is_err());

        let mut config = EegSimulatorConfig::default();
        config.noise.baseline_wander = f64::INFINITY;
        assert!(EegSimulator::new(config).is_err());

        let mut config = EegSimulatorConfig::default();
        config.noise.wander_hz = f64::NAN;
        assert!(EegSimulator::new(config).is_err());

        let mut config = EegSimulatorConfig::default();
        config.noise.artifact_amp = f64::NEG_INFINITY;
        assert!(EegSimulator::new(config).is_err());

        let mut config = EegSimulatorConfig::default();
        config.powerline = Some((50.0, f64::NAN));
        assert!(EegSimulator::new(config).is_err());

        // zero noise is valid
        let config = EegSimulatorConfig { noise: NoiseConfig::none(), ..Default::default() };
        assert!(EegSimulator::new(config).is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = EegSimulatorConfig { seed: Some(9), ..Default::default() };
        let json = serde_json::to_string(&config).unwrap();
        let restored: EegSimulatorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.pattern, config.pattern);
        assert_eq!(restored.seed, Some(9));
    }

    #[test]
    fn test_presets_through_pipeline() {
        let expected = [
            (RhythmPattern::rest(), BrainState::Relaxed),
            (RhythmPattern::drowsy(), BrainState::Relaxed),
            (RhythmPattern::deep_sleep(), BrainState::DeepSleep),
            (RhythmPattern::focus(), BrainState::HighlyFocused),
            (RhythmPattern::movement(), BrainState::Moving),
            (RhythmPattern::Flat, BrainState::Unknown),
        ];

        for (pattern, state) in expected {
            let description = pattern.description();
            let states = settled_states(pattern);
            assert!(states.iter().all(|&s| s == state), "{}: {:?}", description, states);
        }
    }
}
