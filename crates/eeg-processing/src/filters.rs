//! Fixed-coefficient bandpass cascade for EEG

use crate::processor::SampleProcessor;
use serde::{Deserialize, Serialize};

/// Number of second-order sections in the bandpass cascade
pub const CASCADE_SECTIONS: usize = 4;

/// Biquad coefficients, normalized so that a0 = 1.
///
/// Difference equation in direct form II:
/// w[n] = x[n] - a1*w[n-1] - a2*w[n-2]
/// y[n] = b0*w[n] + b1*w[n-1] + b2*w[n-2]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    pub const fn new(b0: f64, b1: f64, b2: f64, a1: f64, a2: f64) -> Self {
        Self { b0, b1, b2, a1, a2 }
    }

    /// Both poles strictly inside the unit circle (stability triangle)
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }

    /// Gain at 0 Hz, or infinity when a pole sits on z = 1
    pub fn dc_gain(&self) -> f64 {
        let den = 1.0 + self.a1 + self.a2;
        if den == 0.0 {
            return f64::INFINITY;
        }
        (self.b0 + self.b1 + self.b2) / den
    }
}

/// 0.5-29.5 Hz bandpass at 256 Hz: two lowpass sections followed by two
/// highpass sections.
pub const EEG_BANDPASS_256HZ: [BiquadCoeffs; CASCADE_SECTIONS] = [
    BiquadCoeffs::new(0.00735282, 0.01470564, 0.00735282, -0.95391350, 0.25311356),
    BiquadCoeffs::new(1.0, 2.0, 1.0, -1.20596630, 0.60558332),
    BiquadCoeffs::new(1.0, -2.0, 1.0, -1.97690645, 0.97706395),
    BiquadCoeffs::new(1.0, -2.0, 1.0, -1.99071687, 0.99086813),
];

/// Single biquad section (2nd order) with its own delay line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadSection {
    coeffs: BiquadCoeffs,
    z1: f64,
    z2: f64,
}

impl BiquadSection {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self { coeffs, z1: 0.0, z2: 0.0 }
    }

    pub fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }

    /// Current delay terms (w[n-1], w[n-2])
    pub fn delay_state(&self) -> (f64, f64) {
        (self.z1, self.z2)
    }
}

impl SampleProcessor for BiquadSection {
    fn process_sample(&mut self, input: f64) -> f64 {
        let c = &self.coeffs;
        let w = input - c.a1 * self.z1 - c.a2 * self.z2;
        let output = c.b0 * w + c.b1 * self.z1 + c.b2 * self.z2;

        self.z2 = self.z1;
        self.z1 = w;

        output
    }

    fn name(&self) -> &str {
        "Biquad Section"
    }

    fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    fn is_finite(&self) -> bool {
        self.z1.is_finite() && self.z2.is_finite()
    }
}

/// Four biquads applied in fixed order, each consuming the previous output
#[derive(Debug, Clone, PartialEq)]
pub struct BandpassCascade {
    sections: [BiquadSection; CASCADE_SECTIONS],
}

impl BandpassCascade {
    pub fn new(coeffs: [BiquadCoeffs; CASCADE_SECTIONS]) -> Self {
        Self {
            sections: coeffs.map(BiquadSection::new),
        }
    }

    /// Default 0.5-29.5 Hz design for 256 Hz sampling
    pub fn eeg_256hz() -> Self {
        Self::new(EEG_BANDPASS_256HZ)
    }

    pub fn sections(&self) -> &[BiquadSection; CASCADE_SECTIONS] {
        &self.sections
    }

    /// Index of the first section holding a non-finite delay term
    pub fn first_non_finite_section(&self) -> Option<usize> {
        self.sections.iter().position(|s| !s.is_finite())
    }
}

impl Default for BandpassCascade {
    fn default() -> Self {
        Self::eeg_256hz()
    }
}

impl SampleProcessor for BandpassCascade {
    fn process_sample(&mut self, input: f64) -> f64 {
        self.sections
            .iter_mut()
            .fold(input, |sample, section| section.process_sample(sample))
    }

    fn name(&self) -> &str {
        "EEG Bandpass Cascade"
    }

    fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }

    fn is_finite(&self) -> bool {
        self.first_non_finite_section().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const FS: f64 = 256.0;

    fn steady_state_amplitude(freq: f64) -> f64 {
        let mut cascade = BandpassCascade::eeg_256hz();
        let n = 256 * 20;
        let mut peak: f64 = 0.0;
        for i in 0..n {
            let y = cascade.process_sample((2.0 * PI * freq * i as f64 / FS).sin());
            if i >= n - 256 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn test_default_sections_are_stable() {
        for coeffs in EEG_BANDPASS_256HZ.iter() {
            assert!(coeffs.is_stable(), "unstable section: {:?}", coeffs);
        }
        assert!(!BiquadCoeffs::new(1.0, 0.0, 0.0, -2.0, 1.0).is_stable());
    }

    #[test]
    fn test_highpass_sections_block_dc() {
        assert_eq!(EEG_BANDPASS_256HZ[2].dc_gain(), 0.0);
        assert_eq!(EEG_BANDPASS_256HZ[3].dc_gain(), 0.0);
        // the two lowpass sections together are roughly unity at DC
        let lowpass_gain = EEG_BANDPASS_256HZ[0].dc_gain() * EEG_BANDPASS_256HZ[1].dc_gain();
        assert!((lowpass_gain - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_constant_input_settles_to_zero() {
        let mut cascade = BandpassCascade::eeg_256hz();
        let mut last = f64::NAN;
        for _ in 0..256 * 30 {
            last = cascade.process_sample(512.0);
        }
        assert!(last.abs() < 1e-6, "output did not settle: {}", last);

        // every section reaches its own fixed point: identical state on the next tick
        let before: Vec<(f64, f64)> = cascade.sections().iter().map(|s| s.delay_state()).collect();
        cascade.process_sample(512.0);
        for (section, (z1, z2)) in cascade.sections().iter().zip(before) {
            let (n1, n2) = section.delay_state();
            assert!((n1 - z1).abs() < 1e-6 * z1.abs().max(1.0));
            assert!((n2 - z2).abs() < 1e-6 * z2.abs().max(1.0));
        }
    }

    #[test]
    fn test_passband_and_stopband() {
        let alpha = steady_state_amplitude(10.0);
        let line_noise = steady_state_amplitude(60.0);
        let drift = steady_state_amplitude(0.05);

        assert!(alpha > 0.8 && alpha < 1.2, "10 Hz gain {}", alpha);
        assert!(line_noise < 0.1, "60 Hz gain {}", line_noise);
        assert!(drift < 0.1, "0.05 Hz gain {}", drift);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut cascade = BandpassCascade::eeg_256hz();
        for i in 0..100 {
            cascade.process_sample(i as f64);
        }
        cascade.reset();
        assert_eq!(cascade, BandpassCascade::eeg_256hz());
    }

    #[test]
    fn test_non_finite_state_is_reported() {
        let mut cascade = BandpassCascade::eeg_256hz();
        assert!(cascade.is_finite());

        cascade.process_sample(f64::NAN);
        assert!(!cascade.is_finite());
        assert_eq!(cascade.first_non_finite_section(), Some(0));
    }
}
