use anyhow::{anyhow, Result};
use serde::Serialize;
use std::io::Write;
use std::thread::{self, JoinHandle};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::config::IngestConfig;
use crate::core::ReducedRecord;
use crate::engine::state::{IngestState, StopReason};
use crate::engine::ReductionPipeline;
use crate::error::PipelineError;
use crate::observability::{HandoffSnapshot, MonitorSnapshot, PerformanceMonitor};
use crate::resilience::FramePolicy;
use crate::source::SourceRegistry;
use crate::visualization::{LatestValueHandoff, PlotSink};

/// Final accounting of one ingest run
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub state: IngestState,
    pub frames_delivered: u64,
    pub frames_skipped: u64,
    /// `None` if the loop never got to construct its monitor
    pub monitor: Option<MonitorSnapshot>,
    pub handoff: HandoffSnapshot,
}

/// The producer side: pulls records from the pipeline, feeds the monitor
/// and pushes plots into the handoff.
pub struct IngestLoop<C> {
    config: IngestConfig,
    registry: SourceRegistry,
    handoff: LatestValueHandoff<C>,
    status_out: Option<Box<dyn Write + Send>>,
    state: IngestState,
    frames_delivered: u64,
    frames_skipped: u64,
}

impl<C: PlotSink + 'static> IngestLoop<C> {
    pub fn new(config: IngestConfig, registry: SourceRegistry, handoff: LatestValueHandoff<C>) -> Self {
        Self {
            config,
            registry,
            handoff,
            status_out: None,
            state: IngestState::Starting,
            frames_delivered: 0,
            frames_skipped: 0,
        }
    }

    /// Send the monitor's status lines somewhere other than stdout
    pub fn with_status_output(mut self, out: Box<dyn Write + Send>) -> Self {
        self.status_out = Some(out);
        self
    }

    pub fn state(&self) -> &IngestState {
        &self.state
    }

    /// Transition to a new state with validation
    pub fn transition_to(&mut self, new_state: IngestState) -> Result<()> {
        if !self.state.can_transition_to(&new_state) {
            return Err(anyhow!(
                "Invalid state transition: {} -> {}",
                self.state.name(),
                new_state.name()
            ));
        }
        info!(from = self.state.name(), to = new_state.name(), "ingest state change");
        self.state = new_state;
        Ok(())
    }

    fn fault(&mut self, err: &PipelineError) -> Result<()> {
        error!(error = %err, "ingest loop faulted");
        self.transition_to(IngestState::Faulted {
            error_msg: err.to_string(),
        })
    }

    /// Drive the loop until the stream ends, a fault occurs, or `shutdown`
    /// fires.
    ///
    /// A fault is not an `Err`: it is reported through the final state.
    /// `Err` means the loop itself misbehaved.
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) -> Result<IngestReport> {
        let mut pipeline = tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => {
                self.transition_to(IngestState::Terminated { reason: StopReason::Shutdown })?;
                return Ok(self.report(None));
            }
            connected = ReductionPipeline::connect(&self.registry, &self.config) => match connected {
                Ok(pipeline) => pipeline,
                Err(e) => {
                    self.fault(&e)?;
                    return Ok(self.report(None));
                }
            },
        };

        let mut monitor = match self.status_out.take() {
            Some(out) => PerformanceMonitor::with_writer(self.config.loop_budget(), out),
            None => PerformanceMonitor::new(self.config.loop_budget()),
        };

        self.transition_to(IngestState::Running {
            endpoint: pipeline.endpoint().to_string(),
        })?;

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => {
                    self.transition_to(IngestState::Terminated { reason: StopReason::Shutdown })?;
                    break;
                }
                next = pipeline.next_record() => next,
            };

            let outcome = match next {
                None => {
                    self.transition_to(IngestState::Terminated {
                        reason: StopReason::EndOfStream,
                    })?;
                    break;
                }
                Some(record) => record.and_then(|record| self.handle_record(&mut monitor, record)),
            };

            match outcome {
                Ok(()) => self.frames_delivered += 1,
                Err(e) if e.is_per_frame() && self.config.frame_policy == FramePolicy::SkipFrame => {
                    self.frames_skipped += 1;
                    warn!(error = %e, skipped = self.frames_skipped, "skipping frame");
                }
                Err(e) => {
                    self.fault(&e)?;
                    break;
                }
            }
        }

        if let Err(e) = pipeline.close().await {
            warn!(error = %e, "error closing source");
        }

        let report = self.report(Some(monitor.snapshot()));
        info!(
            state = report.state.name(),
            delivered = report.frames_delivered,
            skipped = report.frames_skipped,
            overwritten = report.handoff.overwritten,
            "ingest loop stopped"
        );
        Ok(report)
    }

    /// One loop body: time it, publish the plot, account for the id.
    fn handle_record(
        &mut self,
        monitor: &mut PerformanceMonitor,
        record: ReducedRecord,
    ) -> std::result::Result<(), PipelineError> {
        monitor.iteration();

        record.validate(self.config.count)?;
        self.handoff.write(record.plot_data());
        self.handoff.schedule_consume(|sink: &mut C, plot| sink.update(&plot));

        monitor.update_acquisition_id(&record.acquisition_id);
        monitor.record_loop_duration();
        Ok(())
    }

    fn report(&self, monitor: Option<MonitorSnapshot>) -> IngestReport {
        IngestReport {
            state: self.state.clone(),
            frames_delivered: self.frames_delivered,
            frames_skipped: self.frames_skipped,
            monitor,
            handoff: self.handoff.metrics(),
        }
    }

    /// Run the loop on its own thread with a dedicated current-thread
    /// runtime.
    pub fn spawn(mut self) -> std::io::Result<IngestHandle> {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let thread = thread::Builder::new()
            .name("tofstream-ingest".to_string())
            .spawn(move || -> Result<IngestReport> {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()?;
                runtime.block_on(self.run(shutdown_rx))
            })?;

        Ok(IngestHandle { shutdown_tx, thread })
    }
}

/// Resolves when a shutdown is sent. A dropped sender is not a shutdown.
async fn shutdown_requested(rx: &mut broadcast::Receiver<()>) {
    match rx.recv().await {
        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
        Err(broadcast::error::RecvError::Closed) => std::future::pending().await,
    }
}

/// Owner's view of a spawned ingest loop
pub struct IngestHandle {
    shutdown_tx: broadcast::Sender<()>,
    thread: JoinHandle<Result<IngestReport>>,
}

impl IngestHandle {
    /// Ask the loop to stop after the frame it is handling
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn join(self) -> Result<IngestReport> {
        self.thread
            .join()
            .map_err(|_| anyhow!("ingest thread panicked"))?
    }
}
