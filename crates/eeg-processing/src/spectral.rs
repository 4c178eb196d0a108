//! Goertzel single-frequency power estimation
//!
//! Two lifecycles share the same recurrence: a continuous accumulator fed
//! once per sample and reset at window boundaries, and a pure batch
//! evaluation over a whole window buffer.

use crate::window::WindowBuffer;
use std::f64::consts::PI;

/// Frequency-dependent constants of the recurrence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoertzelCoefficient {
    omega: f64,
    coeff: f64,
    cos_omega: f64,
    sin_omega: f64,
}

impl GoertzelCoefficient {
    /// Coefficient for `target_hz` over a window of `window_len` samples.
    ///
    /// The bin is `k = 0.5 + N * f / fs`, left unrounded.
    pub fn new(target_hz: f64, window_len: usize, sampling_rate: f64) -> Self {
        let n = window_len as f64;
        let k = 0.5 + (n * target_hz) / sampling_rate;
        let omega = (2.0 * PI * k) / n;
        let cos_omega = omega.cos();

        Self {
            omega,
            coeff: 2.0 * cos_omega,
            cos_omega,
            sin_omega: omega.sin(),
        }
    }

    pub fn omega(&self) -> f64 {
        self.omega
    }

    /// Squared magnitude from the final two recurrence terms
    pub fn power(&self, q1: f64, q2: f64) -> f64 {
        let real = q1 - q2 * self.cos_omega;
        let imag = q2 * self.sin_omega;
        real * real + imag * imag
    }
}

/// Running (Q1, Q2) state for one target frequency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoertzelAccumulator {
    coefficient: GoertzelCoefficient,
    q1: f64,
    q2: f64,
}

impl GoertzelAccumulator {
    pub fn new(coefficient: GoertzelCoefficient) -> Self {
        Self { coefficient, q1: 0.0, q2: 0.0 }
    }

    /// Advance the recurrence by one sample
    #[inline]
    pub fn update(&mut self, sample: f64) {
        let q0 = self.coefficient.coeff * self.q1 - self.q2 + sample;
        self.q2 = self.q1;
        self.q1 = q0;
    }

    /// Power of everything fed since the last reset
    pub fn power(&self) -> f64 {
        self.coefficient.power(self.q1, self.q2)
    }

    pub fn reset(&mut self) {
        self.q1 = 0.0;
        self.q2 = 0.0;
    }

    pub fn terms(&self) -> (f64, f64) {
        (self.q1, self.q2)
    }

    pub fn coefficient(&self) -> &GoertzelCoefficient {
        &self.coefficient
    }
}

/// Goertzel power of `samples` at `target_hz`; the window length is the
/// number of samples yielded.
pub fn goertzel_power<I>(target_hz: f64, samples: I, sampling_rate: f64) -> f64
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: ExactSizeIterator,
{
    let samples = samples.into_iter();
    let window_len = samples.len();
    if window_len == 0 {
        return 0.0;
    }

    let mut acc = GoertzelAccumulator::new(GoertzelCoefficient::new(target_hz, window_len, sampling_rate));
    for sample in samples {
        acc.update(sample);
    }
    acc.power()
}

/// Goertzel power of a window buffer, oldest sample first
pub fn window_power<const N: usize>(target_hz: f64, window: &WindowBuffer<N>, sampling_rate: f64) -> f64 {
    let mut acc = GoertzelAccumulator::new(GoertzelCoefficient::new(target_hz, N, sampling_rate));
    for sample in window.iter_chronological() {
        acc.update(sample);
    }
    acc.power()
}

/// Strongest candidate of a band sweep
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandPeak {
    pub power: f64,
    pub dominant_hz: f64,
}

/// Evaluate every candidate frequency and keep the strictly largest power.
///
/// Starts from (0, 0): an all-zero window reports zero power at 0 Hz, and
/// on ties the earlier candidate wins.
pub fn sweep_band<const N: usize>(
    candidates: &[f64],
    window: &WindowBuffer<N>,
    sampling_rate: f64,
) -> BandPeak {
    let mut peak = BandPeak::default();
    for &freq in candidates {
        let power = window_power(freq, window, sampling_rate);
        if power > peak.power {
            peak = BandPeak { power, dominant_hz: freq };
        }
    }
    peak
}
