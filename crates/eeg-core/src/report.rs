//! Report line codec and rolling report history
//!
//! One line per completed window, flat `key:value` pairs in a fixed order:
//!
//! ```text
//! second:12, RMS:14.14, spikeCount:0, alphaPower:2678182.93, attention:1.00, ...
//! ```

use std::collections::VecDeque;
use std::str::FromStr;
use crate::error::{EegError, EegResult};
use crate::parse_error;
use crate::record::{BandPower, BrainState, FeatureRecord, WindowFeatures};

/// Field names in emission order
pub const REPORT_FIELDS: [&str; 15] = [
    "second",
    "RMS",
    "spikeCount",
    "alphaPower",
    "attention",
    "thetaPower",
    "thetaIndex",
    "dominantThetaFreq",
    "deltaPower",
    "deltaIndex",
    "dominantDeltaFreq",
    "betaPower",
    "betaIndex",
    "dominantBetaFreq",
    "state",
];

const FIELD_SEPARATOR: &str = ", ";

/// Presentation settings for report lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportFormat {
    /// Decimal places for real-valued fields
    pub precision: usize,
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self { precision: 2 }
    }
}

impl ReportFormat {
    /// Render a record as one report line (no trailing newline)
    pub fn format(&self, record: &FeatureRecord) -> String {
        let f = record.features();
        let p = self.precision;
        let values = [
            f.second.to_string(),
            format!("{:.*}", p, f.rms),
            f.spike_count.to_string(),
            format!("{:.*}", p, f.alpha_power),
            format!("{:.*}", p, f.attention),
            format!("{:.*}", p, f.theta.power),
            format!("{:.*}", p, f.theta.index),
            format!("{:.*}", p, f.theta.dominant_hz),
            format!("{:.*}", p, f.delta.power),
            format!("{:.*}", p, f.delta.index),
            format!("{:.*}", p, f.delta.dominant_hz),
            format!("{:.*}", p, f.beta.power),
            format!("{:.*}", p, f.beta.index),
            format!("{:.*}", p, f.beta.dominant_hz),
            record.state().label().to_string(),
        ];

        REPORT_FIELDS
            .iter()
            .zip(values.iter())
            .map(|(key, value)| format!("{}:{}", key, value))
            .collect::<Vec<_>>()
            .join(FIELD_SEPARATOR)
    }
}

/// Render a record with the default two-decimal format
pub fn format_report_line(record: &FeatureRecord) -> String {
    ReportFormat::default().format(record)
}

/// Parse a report line back into a record.
///
/// Field names and order must match exactly; values are read at whatever
/// precision they were printed with.
pub fn parse_report_line(line: &str) -> EegResult<FeatureRecord> {
    let line = line.trim();
    let parts: Vec<&str> = line.splitn(REPORT_FIELDS.len(), FIELD_SEPARATOR).collect();
    if parts.len() != REPORT_FIELDS.len() {
        return Err(parse_error!(
            "expected {} fields, found {}",
            REPORT_FIELDS.len(),
            parts.len()
        ));
    }

    let mut values = Vec::with_capacity(REPORT_FIELDS.len());
    for (part, expected) in parts.iter().zip(REPORT_FIELDS.iter()) {
        let (key, value) = part
            .split_once(':')
            .ok_or_else(|| parse_error!("field '{}' has no ':' separator", part))?;
        if key != *expected {
            return Err(parse_error!("expected field '{}', found '{}'", expected, key));
        }
        values.push(value);
    }

    let real = |idx: usize| -> EegResult<f64> {
        values[idx]
            .parse::<f64>()
            .map_err(|e| parse_error!("{} '{}': {}", REPORT_FIELDS[idx], values[idx], e))
    };
    let band = |base: usize| -> EegResult<BandPower> {
        Ok(BandPower {
            power: real(base)?,
            index: real(base + 1)?,
            dominant_hz: real(base + 2)?,
        })
    };

    let features = WindowFeatures {
        second: values[0]
            .parse()
            .map_err(|e| parse_error!("second '{}': {}", values[0], e))?,
        rms: real(1)?,
        spike_count: values[2]
            .parse()
            .map_err(|e| parse_error!("spikeCount '{}': {}", values[2], e))?,
        alpha_power: real(3)?,
        attention: real(4)?,
        theta: band(5)?,
        delta: band(8)?,
        beta: band(11)?,
    };
    let state: BrainState = values[14].parse()?;

    Ok(FeatureRecord::new(features, state))
}

impl FromStr for FeatureRecord {
    type Err = EegError;

    fn from_str(s: &str) -> EegResult<Self> {
        parse_report_line(s)
    }
}

/// Rolling history of the most recent reports (one minute by default)
#[derive(Debug, Clone)]
pub struct ReportHistory {
    records: VecDeque<FeatureRecord>,
    capacity: usize,
}

impl ReportHistory {
    pub const DEFAULT_CAPACITY: usize = 60;

    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record, dropping the oldest when full
    pub fn push(&mut self, record: FeatureRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&FeatureRecord> {
        self.records.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureRecord> {
        self.records.iter()
    }

    /// Extract one numeric series, oldest first
    pub fn series<F>(&self, field: F) -> Vec<f64>
    where
        F: Fn(&WindowFeatures) -> f64,
    {
        self.records.iter().map(|r| field(r.features())).collect()
    }

    /// Occurrences of every state, in classifier order
    pub fn state_counts(&self) -> Vec<(BrainState, usize)> {
        BrainState::ALL
            .iter()
            .map(|state| {
                let count = self.records.iter().filter(|r| r.state() == *state).count();
                (*state, count)
            })
            .collect()
    }

    /// Share of records in any focus tier (0 when empty)
    pub fn focused_fraction(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let focused = self.records.iter().filter(|r| r.state().is_focused()).count();
        focused as f64 / self.records.len() as f64
    }

    /// Most frequent state; ties go to the state listed first
    pub fn dominant_state(&self) -> Option<BrainState> {
        if self.records.is_empty() {
            return None;
        }
        let mut best: Option<(BrainState, usize)> = None;
        for (state, count) in self.state_counts() {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((state, count));
            }
        }
        best.map(|(state, _)| state)
    }
}

impl Default for ReportHistory {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
