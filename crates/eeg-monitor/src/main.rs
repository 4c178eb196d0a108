//! EEG Monitor - single-channel EEG state monitor
//!
//! Signal Flow: sample source -> bandpass -> window features -> state -> report

mod runner;
mod sinks;
mod sources;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use eeg_core::{ReportFormat, ReportHistory, ReportSink, SampleSource};
use eeg_processing::{AnalysisConfig, EegPipeline};
use eeg_simulation::{EegSimulator, EegSimulatorConfig, NoiseConfig, RhythmPattern};
use sinks::{JsonLinesSink, LineSink, RecordingSink};
use sources::ReplaySource;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// `key:value` report lines
    Line,
    /// One JSON object per window
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "eeg-monitor", version, about = "Single-channel EEG state monitor")]
struct Cli {
    /// Replay raw readings from a file instead of simulating
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Simulated rhythm: rest, drowsy, deep-sleep, focus, movement or flat
    #[arg(long, default_value = "rest")]
    preset: String,

    /// Simulator seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Simulate without noise or mains interference
    #[arg(long)]
    clean: bool,

    /// Analysis configuration (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the default analysis configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Report output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Line)]
    format: OutputFormat,

    /// Decimal places in report lines
    #[arg(long, default_value_t = 2)]
    precision: usize,

    /// Stop after this many seconds of signal
    #[arg(long)]
    seconds: Option<u64>,

    /// Stop after this many samples
    #[arg(long, conflicts_with = "seconds")]
    samples: Option<u64>,

    /// Pace acquisition at the sampling rate instead of running flat out
    #[arg(long)]
    realtime: bool,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AnalysisConfig> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    let config = AnalysisConfig::from_json(&json)
        .with_context(|| format!("invalid configuration {}", path.display()))?;
    info!(path = %path.display(), name = %config.name, "configuration loaded");
    Ok(config)
}

fn build_source(cli: &Cli, sampling_rate: f64) -> anyhow::Result<Box<dyn SampleSource>> {
    if let Some(path) = &cli.replay {
        return Ok(Box::new(ReplaySource::open(path)?));
    }

    let Some(pattern) = RhythmPattern::from_preset(&cli.preset) else {
        let names: Vec<&str> = RhythmPattern::presets().iter().map(|(name, _)| *name).collect();
        bail!("unknown preset '{}'; expected one of: {}", cli.preset, names.join(", "));
    };

    let mut config = EegSimulatorConfig { sampling_rate, pattern, seed: cli.seed, ..Default::default() };
    if cli.clean {
        config.noise = NoiseConfig::none();
        config.powerline = None;
    }
    Ok(Box::new(EegSimulator::new(config)?))
}

fn build_sink(format: OutputFormat, precision: usize) -> Box<dyn ReportSink> {
    let stdout = BufWriter::new(io::stdout());
    match format {
        OutputFormat::Line => Box::new(LineSink::new(stdout, ReportFormat { precision })),
        OutputFormat::Json => Box::new(JsonLinesSink::new(stdout)),
    }
}

fn log_summary(history: &ReportHistory, total: u64) {
    if history.is_empty() {
        warn!("no complete window was processed");
        return;
    }

    info!(windows = total, recent = history.len(), "session summary");
    for (state, count) in history.state_counts() {
        if count > 0 {
            info!(state = %state, windows = count, "recent state distribution");
        }
    }
    if let Some(state) = history.dominant_state() {
        info!(state = %state, focused = history.focused_fraction(), "dominant recent state");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Reports go to stdout; logs to stderr
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eeg_monitor=info,eeg_processing=info".into()),
        )
        .init();

    if cli.print_config {
        println!("{}", AnalysisConfig::default().to_json()?);
        return Ok(());
    }

    info!("eeg-monitor v{} starting", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_ref())?;
    let sampling_rate = config.sampling_rate;
    let mut pipeline: EegPipeline = EegPipeline::new(config).context("failed to build pipeline")?;

    let max_samples = cli
        .samples
        .or_else(|| cli.seconds.map(|s| (s as f64 * sampling_rate).round() as u64));

    let mut source = build_source(&cli, sampling_rate)?;
    let mut sink = RecordingSink::new(build_sink(cli.format, cli.precision), ReportHistory::DEFAULT_CAPACITY);

    let outcome = if cli.realtime {
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        runner::run_realtime(&mut pipeline, &mut source, &mut sink, max_samples, shutdown).await
    } else {
        runner::run_batch(&mut pipeline, &mut source, &mut sink, max_samples)
    };
    let summary = outcome.context("monitoring stopped")?;

    let performance = pipeline.performance();
    info!(
        samples = summary.samples,
        records = summary.records,
        avg_window_us = performance.avg_window_time_us(),
        max_window_us = performance.max_window_time_us,
        overruns = performance.budget_overruns,
        "run finished"
    );
    log_summary(sink.history(), sink.total());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["eeg-monitor", "--preset", "focus", "--seconds", "10", "--format", "json"]);
        assert_eq!(cli.preset, "focus");
        assert_eq!(cli.seconds, Some(10));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(!cli.realtime);

        assert!(Cli::try_parse_from(["eeg-monitor", "--seconds", "1", "--samples", "5"]).is_err());
    }

    #[test]
    fn test_unknown_preset_is_rejected() {
        let cli = Cli::parse_from(["eeg-monitor", "--preset", "gamma"]);
        let err = build_source(&cli, 256.0).err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err.contains("unknown preset 'gamma'"));
    }

    #[test]
    fn test_missing_config_file() {
        let path = PathBuf::from("/nonexistent/eeg-config.json");
        assert!(load_config(Some(&path)).is_err());
        assert_eq!(load_config(None).unwrap(), AnalysisConfig::default());
    }
}
