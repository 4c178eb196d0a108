//! Per-sample EEG pipeline
//!
//! Owns every piece of persistent state: filter memory, the window buffer,
//! the spike detector and the continuous alpha accumulator. Each call to
//! [`EegPipeline::push_raw`] runs one full tick; every `N` ticks the window
//! is aggregated and classified.

use crate::classifier::StateClassifier;
use crate::config::{AnalysisConfig, WINDOW_LEN};
use crate::features::{FeatureExtractor, SpikeDetector};
use crate::filters::BandpassCascade;
use crate::processor::{PipelinePerformance, ProcessingMetrics, SampleProcessor};
use crate::spectral::{GoertzelAccumulator, GoertzelCoefficient};
use crate::window::WindowBuffer;
use eeg_core::{EegError, EegResult, FaultStage, FeatureRecord, NumericFault, ReportSink, SampleSource};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Relative drift above which a resync is logged
const DRIFT_WARN_RATIO: f64 = 1e-9;

/// Totals of one [`EegPipeline::drive`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveSummary {
    pub samples: u64,
    pub records: u64,
    /// True when the source ran dry before the sample limit
    pub source_exhausted: bool,
}

/// Single-channel EEG pipeline over windows of `N` samples
#[derive(Debug, Clone)]
pub struct EegPipeline<const N: usize = WINDOW_LEN> {
    config: AnalysisConfig,
    filter: BandpassCascade,
    window: WindowBuffer<N>,
    spikes: SpikeDetector,
    alpha: GoertzelAccumulator,
    extractor: FeatureExtractor,
    classifier: StateClassifier,
    /// Ticks since the last window boundary
    ticks: usize,
    /// Completed windows
    seconds: u64,
    fault: Option<NumericFault>,
    halted: bool,
    budget: Duration,
    performance: PipelinePerformance,
}

impl<const N: usize> EegPipeline<N> {
    /// Build a pipeline from a validated configuration
    pub fn new(config: AnalysisConfig) -> EegResult<Self> {
        config.validate(N)?;
        info!(
            config = %config.name,
            sampling_rate = config.sampling_rate,
            window_len = N,
            "EEG pipeline created"
        );
        Ok(Self::build(config))
    }

    /// Pipeline with the default 256 Hz configuration
    pub fn with_defaults() -> Self {
        Self::build(AnalysisConfig::default())
    }

    fn build(config: AnalysisConfig) -> Self {
        let alpha = GoertzelCoefficient::new(config.alpha_target_hz, N, config.sampling_rate);
        Self {
            filter: BandpassCascade::new(config.filter_sections),
            window: WindowBuffer::new(),
            spikes: SpikeDetector::new(config.spike_threshold),
            alpha: GoertzelAccumulator::new(alpha),
            extractor: FeatureExtractor::new(&config),
            classifier: StateClassifier::new(config.thresholds),
            ticks: 0,
            seconds: 0,
            fault: None,
            halted: false,
            budget: Duration::from_micros(config.sample_period_us()),
            performance: PipelinePerformance::default(),
            config,
        }
    }

    /// Run one tick on a raw reading.
    ///
    /// Returns `Ok(Some(record))` on every N-th tick. A window in which any
    /// non-finite value appeared ends in `Err(NumericalFault)` instead of a
    /// record, and every later call fails with `PipelineHalted` until
    /// [`reset`](Self::reset).
    pub fn push_raw(&mut self, raw: f64) -> EegResult<Option<FeatureRecord>> {
        if self.halted {
            return Err(EegError::PipelineHalted {
                window: self.fault.map_or(self.seconds, |f| f.window),
            });
        }

        let filtered = self.filter.process_sample(raw);

        if self.fault.is_none() {
            self.window.push(filtered);
            self.spikes.update(filtered);
            self.alpha.update(filtered);

            if let Some(stage) = self.find_non_finite(filtered) {
                let fault = NumericFault {
                    window: self.seconds + 1,
                    tick: self.ticks,
                    stage,
                    value: self.stage_value(stage, filtered),
                };
                error!(window = fault.window, tick = fault.tick, stage = %stage, "non-finite value in pipeline");
                self.fault = Some(fault);
            }
        }

        self.ticks += 1;
        self.performance.samples_processed += 1;

        if self.ticks < N {
            return Ok(None);
        }
        self.complete_window()
    }

    fn find_non_finite(&self, filtered: f64) -> Option<FaultStage> {
        if let Some(section) = self.filter.first_non_finite_section() {
            return Some(FaultStage::FilterState { section });
        }
        if !filtered.is_finite() {
            return Some(FaultStage::FilterOutput);
        }
        if !self.window.sum_of_squares().is_finite() {
            return Some(FaultStage::WindowEnergy);
        }
        None
    }

    fn stage_value(&self, stage: FaultStage, filtered: f64) -> f64 {
        match stage {
            FaultStage::FilterState { section } => {
                let (z1, z2) = self.filter.sections()[section].delay_state();
                if z1.is_finite() { z2 } else { z1 }
            }
            FaultStage::FilterOutput => filtered,
            FaultStage::WindowEnergy => self.window.sum_of_squares(),
        }
    }

    fn complete_window(&mut self) -> EegResult<Option<FeatureRecord>> {
        self.ticks = 0;
        self.seconds += 1;

        if let Some(fault) = self.fault {
            self.halted = true;
            warn!(window = fault.window, "window discarded after numerical fault; pipeline halted");
            return Err(EegError::NumericalFault { fault });
        }

        let timer = ProcessingMetrics::start_timing(self.budget);

        // the running sum drifts by cancellation; report RMS from an exact one
        self.resync_window_energy();
        let spike_count = self.spikes.take_count();
        let features = self.extractor.extract(&self.window, self.alpha.power(), spike_count, self.seconds);
        let state = self.classifier.classify(&features);
        self.alpha.reset();

        let metrics = timer.finish();
        if self.performance.record(&metrics) {
            warn!(
                second = self.seconds,
                elapsed_us = metrics.processing_time_us,
                budget_us = metrics.budget_us,
                "window boundary overran the sampling period"
            );
        }

        debug!(
            second = features.second,
            rms = features.rms,
            spikes = features.spike_count,
            attention = features.attention,
            state = %state,
            "window complete"
        );

        Ok(Some(FeatureRecord::new(features, state)))
    }

    /// Replace the running sum of squares with a full rescan.
    ///
    /// Runs at every window boundary; returns the drift that was removed.
    pub fn resync_window_energy(&mut self) -> f64 {
        let drift = self.window.resync();
        if drift.abs() > DRIFT_WARN_RATIO * self.window.sum_of_squares().max(1.0) {
            debug!(drift, second = self.seconds, "window energy drift corrected");
        }
        drift
    }

    /// Zero all buffers, accumulators and counters; clears a latched fault
    pub fn reset(&mut self) {
        self.filter.reset();
        self.window.clear();
        self.spikes.reset();
        self.alpha.reset();
        self.ticks = 0;
        self.seconds = 0;
        self.fault = None;
        self.halted = false;
        self.performance = PipelinePerformance::default();
        info!("EEG pipeline reset");
    }

    /// Pull samples from `source` and hand every record to `sink`.
    ///
    /// Stops when the source is exhausted or after `max_samples`. Errors from
    /// either collaborator or the pipeline end the run.
    pub fn drive<S, K>(&mut self, source: &mut S, sink: &mut K, max_samples: Option<u64>) -> EegResult<DriveSummary>
    where
        S: SampleSource + ?Sized,
        K: ReportSink + ?Sized,
    {
        let mut summary = DriveSummary::default();

        while max_samples.map_or(true, |limit| summary.samples < limit) {
            let Some(raw) = source.next_sample()? else {
                debug!(source = source.name(), "sample source exhausted");
                summary.source_exhausted = true;
                break;
            };
            summary.samples += 1;

            if let Some(record) = self.push_raw(raw)? {
                sink.emit(&record)?;
                summary.records += 1;
            }
        }

        sink.flush()?;
        Ok(summary)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn window(&self) -> &WindowBuffer<N> {
        &self.window
    }

    pub fn filter(&self) -> &BandpassCascade {
        &self.filter
    }

    /// Ticks accumulated toward the current window
    pub fn ticks_in_window(&self) -> usize {
        self.ticks
    }

    /// Completed windows since construction or the last reset
    pub fn windows_completed(&self) -> u64 {
        self.seconds
    }

    pub fn fault(&self) -> Option<&NumericFault> {
        self.fault.as_ref()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn performance(&self) -> &PipelinePerformance {
        &self.performance
    }

    /// Alpha power accumulated so far in the current window
    pub fn alpha_power(&self) -> f64 {
        self.alpha.power()
    }
}

impl Default for EegPipeline<WINDOW_LEN> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::window_power;
    use eeg_core::BrainState;
    use std::f64::consts::PI;

    struct SignalSource {
        signal: Box<dyn Fn(usize) -> f64>,
        index: usize,
        len: usize,
    }

    impl SignalSource {
        fn new(len: usize, signal: impl Fn(usize) -> f64 + 'static) -> Self {
            Self { signal: Box::new(signal), index: 0, len }
        }
    }

    impl SampleSource for SignalSource {
        fn next_sample(&mut self) -> EegResult<Option<f64>> {
            if self.index >= self.len {
                return Ok(None);
            }
            let x = (self.signal)(self.index);
            self.index += 1;
            Ok(Some(x))
        }
    }

    fn sine(freq: f64, amplitude: f64) -> impl Fn(usize) -> f64 {
        move |i| amplitude * (2.0 * PI * freq * i as f64 / 256.0).sin()
    }

    fn default_pipeline() -> EegPipeline {
        EegPipeline::default()
    }

    fn run(pipeline: &mut EegPipeline, samples: impl IntoIterator<Item = f64>) -> Vec<FeatureRecord> {
        samples
            .into_iter()
            .filter_map(|x| pipeline.push_raw(x).unwrap())
            .collect()
    }

    #[test]
    fn test_emits_one_record_per_window() {
        let mut pipeline = default_pipeline();

        for _ in 0..255 {
            assert_eq!(pipeline.push_raw(0.0).unwrap(), None);
        }
        assert_eq!(pipeline.ticks_in_window(), 255);

        let record = pipeline.push_raw(0.0).unwrap().unwrap();
        assert_eq!(record.second(), 1);
        assert_eq!(pipeline.ticks_in_window(), 0);

        let records = run(&mut pipeline, std::iter::repeat(0.0).take(256 * 3));
        let seconds: Vec<u64> = records.iter().map(|r| r.second()).collect();
        assert_eq!(seconds, vec![2, 3, 4]);
        assert_eq!(pipeline.windows_completed(), 4);
        assert_eq!(pipeline.performance().windows_processed, 4);
        assert_eq!(pipeline.performance().samples_processed, 256 * 4);
    }

    #[test]
    fn test_zero_input_is_unknown() {
        let mut pipeline = default_pipeline();
        let records = run(&mut pipeline, std::iter::repeat(0.0).take(256 * 2));

        for record in records {
            let f = record.features();
            assert_eq!(f.rms, 0.0);
            assert_eq!(f.spike_count, 0);
            assert_eq!(f.alpha_power, 0.0);
            assert_eq!(f.attention, 0.0);
            assert_eq!((f.theta.power, f.theta.index, f.theta.dominant_hz), (0.0, 0.0, 0.0));
            assert_eq!((f.delta.power, f.delta.index, f.delta.dominant_hz), (0.0, 0.0, 0.0));
            assert_eq!((f.beta.power, f.beta.index, f.beta.dominant_hz), (0.0, 0.0, 0.0));
            assert_eq!(record.state(), BrainState::Unknown);
        }
    }

    #[test]
    fn test_constant_input_settles() {
        let mut pipeline = default_pipeline();
        let records = run(&mut pipeline, std::iter::repeat(512.0).take(256 * 30));

        // the step at power-on is a large transient
        assert_eq!(records[0].state(), BrainState::Moving);
        assert_eq!(records[0].features().spike_count, 2);
        assert!(records[1..].iter().all(|r| r.features().spike_count == 0));

        let window = pipeline.window();
        assert_eq!(window.sum_of_squares(), window.recomputed_sum_of_squares());

        let last = records[29].features();
        let newest = window.newest();
        assert!(last.rms < 1e-4, "rms {}", last.rms);
        assert!((last.rms - newest.abs()).abs() < 1e-9);
        assert_eq!(records[29].state(), BrainState::Unknown);
    }

    #[test]
    fn test_alpha_sinusoid_end_to_end() {
        let amplitude = 20.0;
        let mut pipeline = default_pipeline();
        let signal = sine(10.0, amplitude);
        let records = run(&mut pipeline, (0..256 * 5).map(signal));
        assert_eq!(records.len(), 5);

        let expected_rms = amplitude / 2f64.sqrt();
        for record in &records {
            let f = record.features();
            assert!((f.rms - expected_rms).abs() < 0.01 * expected_rms, "rms {}", f.rms);
            assert!(f.alpha_power > f.theta.power);
            assert!(f.alpha_power > f.delta.power);
            assert!(f.alpha_power > f.beta.power);
            assert!(f.attention > 0.99);
            assert_eq!(f.spike_count, 0);
        }

        // theta leakage from 10 Hz still dwarfs the window energy
        assert_eq!(records[4].state(), BrainState::Relaxed);
        assert_eq!(records[4].features().theta.dominant_hz, 8.0);
    }

    #[test]
    fn test_continuous_alpha_matches_batch() {
        let mut pipeline = default_pipeline();
        let signal = sine(9.0, 15.0);

        for i in 0..256 * 2 - 1 {
            pipeline.push_raw(signal(i)).unwrap();
        }
        // the last tick of window 2 is pushed by hand so the buffer can be
        // inspected before the accumulator resets
        let record = pipeline.push_raw(signal(256 * 2 - 1)).unwrap().unwrap();
        assert_eq!(pipeline.window().cursor(), 0);

        let batch = window_power(10.0, pipeline.window(), 256.0);
        assert_eq!(record.features().alpha_power.to_bits(), batch.to_bits());
        assert_eq!(pipeline.alpha_power(), 0.0);
    }

    #[test]
    fn test_numerical_fault_halts_until_reset() {
        let mut pipeline = default_pipeline();
        for _ in 0..100 {
            pipeline.push_raw(0.0).unwrap();
        }

        // the fault is latched silently and reported at the window boundary
        assert_eq!(pipeline.push_raw(f64::NAN).unwrap(), None);
        assert!(pipeline.fault().is_some());
        for _ in 101..255 {
            assert_eq!(pipeline.push_raw(0.0).unwrap(), None);
        }

        match pipeline.push_raw(0.0) {
            Err(EegError::NumericalFault { fault }) => {
                assert_eq!(fault.window, 1);
                assert_eq!(fault.tick, 100);
                assert_eq!(fault.stage, FaultStage::FilterState { section: 0 });
                assert!(fault.value.is_nan());
            }
            other => panic!("expected numerical fault, got {:?}", other),
        }

        assert!(pipeline.is_halted());
        assert_eq!(pipeline.push_raw(0.0), Err(EegError::PipelineHalted { window: 1 }));

        pipeline.reset();
        assert!(!pipeline.is_halted());
        let records = run(&mut pipeline, std::iter::repeat(0.0).take(256));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].second(), 1);
        assert_eq!(records[0].state(), BrainState::Unknown);
    }

    #[test]
    fn test_energy_overflow_is_a_fault() {
        let mut pipeline = default_pipeline();
        pipeline.push_raw(1e300).unwrap();

        let fault = pipeline.fault().copied().unwrap();
        assert_eq!(fault.stage, FaultStage::WindowEnergy);
        assert_eq!(fault.tick, 0);
        assert!(fault.value.is_infinite());
    }

    #[test]
    fn test_drive_source_into_sink() {
        let mut pipeline = default_pipeline();
        let mut source = SignalSource::new(256 * 3 + 10, sine(10.0, 20.0));
        let mut sink: Vec<FeatureRecord> = Vec::new();

        let summary = pipeline.drive(&mut source, &mut sink, None).unwrap();
        assert_eq!(summary, DriveSummary { samples: 256 * 3 + 10, records: 3, source_exhausted: true });
        assert_eq!(sink.len(), 3);
        assert_eq!(pipeline.ticks_in_window(), 10);

        let mut source = SignalSource::new(usize::MAX, sine(10.0, 20.0));
        let summary = pipeline.drive(&mut source, &mut sink, Some(246)).unwrap();
        assert_eq!(summary, DriveSummary { samples: 246, records: 1, source_exhausted: false });
        assert_eq!(sink.last().map(|r| r.second()), Some(4));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = AnalysisConfig::default();
        config.alpha_target_hz = 200.0;
        let result: EegResult<EegPipeline> = EegPipeline::new(config);
        assert!(matches!(result, Err(EegError::ConfigurationError { .. })));
    }

    #[test]
    fn test_smaller_window() {
        let config = AnalysisConfig::default();
        let mut pipeline: EegPipeline<64> = EegPipeline::new(config).unwrap();
        let mut records = Vec::new();
        for _ in 0..128 {
            if let Some(record) = pipeline.push_raw(0.0).unwrap() {
                records.push(record);
            }
        }
        assert_eq!(records.len(), 2);
        assert_eq!(pipeline.window().len(), 64);
    }

    #[test]
    fn test_resync_is_harmless_on_clean_data() {
        let mut pipeline = default_pipeline();
        run(&mut pipeline, (0..300).map(sine(6.0, 30.0)));
        let before = pipeline.window().sum_of_squares();
        let drift = pipeline.resync_window_energy();
        assert!(drift.abs() <= 1e-9 * before.max(1.0));
    }
}
