use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use tofstream::config::IngestConfig;
use tofstream::engine::IngestLoop;
use tofstream::logging::init_logging;
use tofstream::resilience::FramePolicy;
use tofstream::source::SourceRegistry;
use tofstream::visualization::{ConsumerContext, LatestValueHandoff, SummarySink};

/// Live time-of-flight waveform reduction
#[derive(Parser, Debug)]
#[command(name = "tofstream", version, about)]
struct Args {
    /// JSON config file; missing fields use built-in defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source address, e.g. tcp://127.0.0.1:8011 or mock://demo?interval_ms=100
    #[arg(short, long)]
    source: Option<String>,

    /// First waveform index kept
    #[arg(long)]
    start_index: Option<usize>,

    /// Number of samples kept per frame
    #[arg(long)]
    count: Option<usize>,

    /// What to do with a frame that fails to reduce
    #[arg(long, value_enum)]
    policy: Option<FramePolicy>,

    /// Log a plot summary every N delivered plots
    #[arg(long, default_value_t = 50)]
    summary_every: u64,
}

fn build_config(args: &Args) -> Result<IngestConfig> {
    let mut config = match &args.config {
        Some(path) => IngestConfig::load(path)?,
        None => IngestConfig::default(),
    };

    if let Some(source) = &args.source {
        config.source = source.clone();
    }
    if let Some(start_index) = args.start_index {
        config.start_index = start_index;
    }
    if let Some(count) = args.count {
        config.count = count;
    }
    if let Some(policy) = args.policy {
        config.frame_policy = policy;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let config = build_config(&args)?;

    info!(
        source = %config.source,
        start_index = config.start_index,
        count = config.count,
        policy = config.frame_policy.name(),
        "starting tofstream"
    );

    let (mut context, handle) = ConsumerContext::new(SummarySink::new(args.summary_every));
    let registry = SourceRegistry::for_config(&config);
    let ingest = IngestLoop::new(config, registry, LatestValueHandoff::new(handle)).spawn()?;

    // the ingest loop holds the only handle, so this returns once it stops
    context.run_until_closed();

    let report = ingest.join()?;
    info!(
        delivered = report.frames_delivered,
        rendered = context.state().updates(),
        overwritten = report.handoff.overwritten,
        "consumer finished"
    );

    if report.state.is_faulted() {
        info!(state = report.state.name(), "exiting after fault");
        bail!("ingest loop faulted");
    }
    Ok(())
}
