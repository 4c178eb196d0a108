//! Source -> pipeline -> sink loops

use eeg_core::{ReportSink, SampleSource};
use eeg_processing::{DriveSummary, EegPipeline, SampleClock};
use std::future::Future;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info};

/// As fast as the source can deliver
pub fn run_batch<S, K, const N: usize>(
    pipeline: &mut EegPipeline<N>,
    source: &mut S,
    sink: &mut K,
    max_samples: Option<u64>,
) -> anyhow::Result<DriveSummary>
where
    S: SampleSource + ?Sized,
    K: ReportSink + ?Sized,
{
    Ok(pipeline.drive(source, sink, max_samples)?)
}

/// Paced by the sample clock at the configured sampling rate.
///
/// Between ticks the task sleeps until the next one is due; `shutdown`
/// completing ends the run after the current tick.
pub async fn run_realtime<S, K, F, const N: usize>(
    pipeline: &mut EegPipeline<N>,
    source: &mut S,
    sink: &mut K,
    max_samples: Option<u64>,
    shutdown: F,
) -> anyhow::Result<DriveSummary>
where
    S: SampleSource + ?Sized,
    K: ReportSink + ?Sized,
    F: Future<Output = ()>,
{
    let mut clock = SampleClock::new(pipeline.config().sample_period_us());
    let start = Instant::now();
    let mut summary = DriveSummary::default();
    tokio::pin!(shutdown);

    info!(period_us = clock.period_us(), source = source.name(), "real-time acquisition started");

    while max_samples.map_or(true, |limit| summary.samples < limit) {
        let now_us = start.elapsed().as_micros() as u64;
        if !clock.poll(now_us) {
            let wait = Duration::from_micros(clock.until_due(now_us).max(1));
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(samples = summary.samples, "shutdown requested");
                    break;
                }
                _ = sleep(wait) => continue,
            }
        }

        let Some(raw) = source.next_sample()? else {
            debug!("sample source exhausted");
            summary.source_exhausted = true;
            break;
        };
        summary.samples += 1;

        if let Some(record) = pipeline.push_raw(raw)? {
            sink.emit(&record)?;
            summary.records += 1;
        }
    }

    sink.flush()?;
    Ok(summary)
}
