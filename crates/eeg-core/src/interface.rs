//! Interfaces to the pipeline's external collaborators

use crate::error::EegResult;
use crate::record::FeatureRecord;

/// Supplies one raw reading per call (ADC counts or microvolts)
pub trait SampleSource {
    /// Next raw sample, or `None` once the source is exhausted.
    ///
    /// Must not block for longer than one sampling period.
    fn next_sample(&mut self) -> EegResult<Option<f64>>;

    /// Short identifier for logging
    fn name(&self) -> &str {
        "sample source"
    }
}

/// Receives one feature record per completed window
pub trait ReportSink {
    fn emit(&mut self, record: &FeatureRecord) -> EegResult<()>;

    /// Flush buffered output; called once when the run ends
    fn flush(&mut self) -> EegResult<()> {
        Ok(())
    }
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn next_sample(&mut self) -> EegResult<Option<f64>> {
        (**self).next_sample()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<K: ReportSink + ?Sized> ReportSink for Box<K> {
    fn emit(&mut self, record: &FeatureRecord) -> EegResult<()> {
        (**self).emit(record)
    }

    fn flush(&mut self) -> EegResult<()> {
        (**self).flush()
    }
}

/// Collects records in memory
impl ReportSink for Vec<FeatureRecord> {
    fn emit(&mut self, record: &FeatureRecord) -> EegResult<()> {
        self.push(*record);
        Ok(())
    }
}
