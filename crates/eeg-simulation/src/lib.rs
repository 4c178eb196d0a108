//! EEG-Simulation: Synthetic single-channel EEG for testing and development
//!
//! Produces raw ADC-style readings with configurable rhythms, noise and
//! artifacts, usable anywhere a `SampleSource` is expected.

pub mod signal_patterns;
pub mod eeg_simulator;

pub use eeg_simulator::*;
pub use signal_patterns::*;
