//! Per-window feature records and state labels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::error::{EegError, EegResult};

/// Canonical EEG frequency bands tracked by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    /// 8-13 Hz, tracked continuously at a single target frequency
    Alpha,
    /// 4-8 Hz
    Theta,
    /// 0.5-4 Hz
    Delta,
    /// 13-30 Hz
    Beta,
}

impl Band {
    /// Lower-case band name
    pub fn name(&self) -> &'static str {
        match self {
            Band::Alpha => "alpha",
            Band::Theta => "theta",
            Band::Delta => "delta",
            Band::Beta => "beta",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Discrete mental/physical state assigned to one window.
///
/// Variants are declared in the order the classifier evaluates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrainState {
    #[serde(rename = "Moving")]
    Moving,
    #[serde(rename = "Highly Focused")]
    HighlyFocused,
    #[serde(rename = "Fully Focused")]
    FullyFocused,
    #[serde(rename = "Focused")]
    Focused,
    #[serde(rename = "Fully Relaxed")]
    FullyRelaxed,
    #[serde(rename = "Relaxed")]
    Relaxed,
    #[serde(rename = "Deep Sleep / Meditation")]
    DeepSleep,
    #[serde(rename = "Semi-Relaxed")]
    SemiRelaxed,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl BrainState {
    pub const ALL: [BrainState; 9] = [
        BrainState::Moving,
        BrainState::HighlyFocused,
        BrainState::FullyFocused,
        BrainState::Focused,
        BrainState::FullyRelaxed,
        BrainState::Relaxed,
        BrainState::DeepSleep,
        BrainState::SemiRelaxed,
        BrainState::Unknown,
    ];

    /// Human-readable label as it appears in the report line
    pub fn label(&self) -> &'static str {
        match self {
            BrainState::Moving => "Moving",
            BrainState::HighlyFocused => "Highly Focused",
            BrainState::FullyFocused => "Fully Focused",
            BrainState::Focused => "Focused",
            BrainState::FullyRelaxed => "Fully Relaxed",
            BrainState::Relaxed => "Relaxed",
            BrainState::DeepSleep => "Deep Sleep / Meditation",
            BrainState::SemiRelaxed => "Semi-Relaxed",
            BrainState::Unknown => "Unknown",
        }
    }

    /// True for the three focus tiers
    pub fn is_focused(&self) -> bool {
        matches!(self, BrainState::HighlyFocused | BrainState::FullyFocused | BrainState::Focused)
    }
}

impl fmt::Display for BrainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BrainState {
    type Err = EegError;

    fn from_str(s: &str) -> EegResult<Self> {
        let label = s.trim();
        BrainState::ALL
            .iter()
            .copied()
            .find(|state| state.label() == label)
            .ok_or_else(|| EegError::ReportParseError {
                reason: format!("unknown state label '{}'", label),
            })
    }
}

/// Representative power of a swept band
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BandPower {
    /// Maximum Goertzel power over the band's candidate frequencies
    pub power: f64,
    /// power / (power + RMS² + ε), in [0, 1)
    pub index: f64,
    /// Candidate frequency that produced `power` (0 when every candidate was 0)
    pub dominant_hz: f64,
}

/// Numeric features derived from one completed window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowFeatures {
    /// 1-based window counter (one window per second)
    pub second: u64,
    pub rms: f64,
    pub spike_count: u32,
    pub alpha_power: f64,
    /// Alpha index, reported under its own name
    pub attention: f64,
    pub theta: BandPower,
    pub delta: BandPower,
    pub beta: BandPower,
}

/// Complete per-window record handed to the report sink
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(flatten)]
    features: WindowFeatures,
    state: BrainState,
}

impl FeatureRecord {
    pub fn new(features: WindowFeatures, state: BrainState) -> Self {
        Self { features, state }
    }

    pub fn features(&self) -> &WindowFeatures {
        &self.features
    }

    pub fn state(&self) -> BrainState {
        self.state
    }

    pub fn second(&self) -> u64 {
        self.features.second
    }
}
