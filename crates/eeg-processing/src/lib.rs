//! EEG-Processing: Real-time single-channel EEG analysis
//!
//! Bandpass filtering, sliding-window statistics, Goertzel band power and
//! rule-based state classification, driven one sample per tick.

pub mod classifier;
pub mod clock;
pub mod config;
pub mod features;
pub mod filters;
pub mod pipeline;
pub mod processor;
pub mod spectral;
pub mod window;

pub use classifier::StateClassifier;
pub use clock::SampleClock;
pub use config::{
    AnalysisConfig, BandCandidates, ClassifierThresholds, INDEX_EPSILON, SAMPLING_RATE_HZ, WINDOW_LEN,
};
pub use features::{band_index, FeatureExtractor, SpikeDetector};
pub use filters::{BandpassCascade, BiquadCoeffs, BiquadSection, EEG_BANDPASS_256HZ};
pub use pipeline::{DriveSummary, EegPipeline};
pub use processor::{PipelinePerformance, ProcessingMetrics, SampleProcessor};
pub use spectral::{goertzel_power, sweep_band, window_power, BandPeak, GoertzelAccumulator, GoertzelCoefficient};
pub use window::WindowBuffer;
