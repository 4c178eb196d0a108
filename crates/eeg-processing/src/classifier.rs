//! Rule-based state classification

use crate::config::ClassifierThresholds;
use eeg_core::{BrainState, WindowFeatures};

/// Ordered decision list over one window's features.
///
/// Stateless: every window is classified from its own features only.
/// Rules are evaluated top to bottom and the first match wins.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StateClassifier {
    thresholds: ClassifierThresholds,
}

impl StateClassifier {
    pub fn new(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    pub fn classify(&self, features: &WindowFeatures) -> BrainState {
        let t = &self.thresholds;
        let rms = features.rms;
        let attention = features.attention;
        let theta_index = features.theta.index;

        if rms > t.moving_rms || features.spike_count > t.moving_spike_count {
            return BrainState::Moving;
        }

        let beta_dominant = features.beta.power > features.theta.power
            && features.beta.power > features.delta.power;
        if beta_dominant {
            if attention > t.highly_focused_attention {
                return BrainState::HighlyFocused;
            }
            if attention > t.fully_focused_attention {
                return BrainState::FullyFocused;
            }
            if attention > t.focused_attention {
                return BrainState::Focused;
            }
        }

        if theta_index > t.fully_relaxed_theta_index
            && attention > t.fully_relaxed_attention
            && rms < t.fully_relaxed_rms
        {
            return BrainState::FullyRelaxed;
        }

        if theta_index > t.relaxed_theta_index && attention > t.relaxed_attention {
            return BrainState::Relaxed;
        }

        if features.delta.index > t.deep_sleep_delta_index && rms < t.deep_sleep_rms {
            return BrainState::DeepSleep;
        }

        if theta_index > t.semi_relaxed_theta_index || attention > t.semi_relaxed_attention {
            return BrainState::SemiRelaxed;
        }

        BrainState::Unknown
    }
}
