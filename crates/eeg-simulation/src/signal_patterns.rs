//! Pre-defined EEG rhythm patterns for simulation

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// One sinusoidal component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oscillation {
    pub frequency_hz: f64,
    /// Peak amplitude in ADC counts
    pub amplitude: f64,
}

impl Oscillation {
    pub const fn new(frequency_hz: f64, amplitude: f64) -> Self {
        Self { frequency_hz, amplitude }
    }

    pub fn value_at(&self, time: f64) -> f64 {
        self.amplitude * (2.0 * PI * self.frequency_hz * time).sin()
    }
}

/// Deterministic part of a simulated EEG trace, centred on zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RhythmPattern {
    /// No activity
    Flat,
    /// Eyes-closed rest: dominant alpha
    Rest { alpha: Oscillation },
    /// Drowsiness: dominant theta
    Drowsy { theta: Oscillation },
    /// Slow-wave sleep: low-amplitude delta
    DeepSleep { delta: Oscillation },
    /// Concentration: beta over a weaker alpha
    Focus { beta: Oscillation, alpha: Oscillation },
    /// Periodic half-sine blips standing in for motion artifacts
    Movement {
        amplitude: f64,
        bursts_per_second: f64,
        burst_duration: f64,
    },
    /// Arbitrary sum of oscillations
    Mixed { components: Vec<Oscillation> },
}

impl RhythmPattern {
    /// Signal value at `time` seconds
    pub fn value_at_time(&self, time: f64) -> f64 {
        match self {
            RhythmPattern::Flat => 0.0,
            RhythmPattern::Rest { alpha } => alpha.value_at(time),
            RhythmPattern::Drowsy { theta } => theta.value_at(time),
            RhythmPattern::DeepSleep { delta } => delta.value_at(time),
            RhythmPattern::Focus { beta, alpha } => beta.value_at(time) + alpha.value_at(time),
            RhythmPattern::Movement { amplitude, bursts_per_second, burst_duration } => {
                if *bursts_per_second <= 0.0 || *burst_duration <= 0.0 {
                    return 0.0;
                }
                let phase = time % (1.0 / bursts_per_second);
                if phase < *burst_duration {
                    amplitude * (PI * phase / burst_duration).sin()
                } else {
                    0.0
                }
            }
            RhythmPattern::Mixed { components } => components.iter().map(|c| c.value_at(time)).sum(),
        }
    }

    /// Get pattern description
    pub fn description(&self) -> &'static str {
        match self {
            RhythmPattern::Flat => "Flat line",
            RhythmPattern::Rest { .. } => "Eyes-closed rest (alpha)",
            RhythmPattern::Drowsy { .. } => "Drowsiness (theta)",
            RhythmPattern::DeepSleep { .. } => "Deep sleep (delta)",
            RhythmPattern::Focus { .. } => "Concentration (beta)",
            RhythmPattern::Movement { .. } => "Movement artifacts",
            RhythmPattern::Mixed { .. } => "Mixed rhythms",
        }
    }

    pub fn rest() -> Self {
        RhythmPattern::Rest { alpha: Oscillation::new(10.0, 20.0) }
    }

    pub fn drowsy() -> Self {
        RhythmPattern::Drowsy { theta: Oscillation::new(6.0, 10.0) }
    }

    /// 1.5 Hz sits on the 1 Hz delta candidate bin
    pub fn deep_sleep() -> Self {
        RhythmPattern::DeepSleep { delta: Oscillation::new(1.5, 4.0) }
    }

    pub fn focus() -> Self {
        RhythmPattern::Focus {
            beta: Oscillation::new(20.0, 15.0),
            alpha: Oscillation::new(10.0, 10.0),
        }
    }

    pub fn movement() -> Self {
        RhythmPattern::Movement {
            amplitude: 300.0,
            bursts_per_second: 2.0,
            burst_duration: 0.1,
        }
    }

    /// Create common preset patterns
    pub fn presets() -> Vec<(&'static str, RhythmPattern)> {
        vec![
            ("rest", RhythmPattern::rest()),
            ("drowsy", RhythmPattern::drowsy()),
            ("deep-sleep", RhythmPattern::deep_sleep()),
            ("focus", RhythmPattern::focus()),
            ("movement", RhythmPattern::movement()),
            ("flat", RhythmPattern::Flat),
        ]
    }

    /// Look up a preset by name
    pub fn from_preset(name: &str) -> Option<Self> {
        RhythmPattern::presets()
            .into_iter()
            .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
            .map(|(_, pattern)| pattern)
    }
}
