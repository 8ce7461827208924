use crate::core::PlotData;
use tracing::{debug, info};

/// Rendering collaborator: receives the newest plot on the consumer thread.
pub trait PlotSink {
    fn update(&mut self, plot: &PlotData);
}

/// Keeps the last delivered plot; handy for tests and for UIs that draw
/// on their own timer.
#[derive(Debug, Default)]
pub struct LatestPlot {
    pub last: Option<PlotData>,
    pub updates: u64,
}

impl PlotSink for LatestPlot {
    fn update(&mut self, plot: &PlotData) {
        self.last = Some(plot.clone());
        self.updates += 1;
    }
}

/// Logs where the deepest peak of each delivered trace is.
#[derive(Debug, Default)]
pub struct SummarySink {
    updates: u64,
    log_every: u64,
}

impl SummarySink {
    pub fn new(log_every: u64) -> Self {
        Self {
            updates: 0,
            log_every: log_every.max(1),
        }
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }
}

/// (index on the x axis, value) of the minimum sample
pub fn deepest_peak(plot: &PlotData) -> Option<(usize, f64)> {
    plot.x_axis
        .iter()
        .zip(plot.waveform.iter())
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(x, y)| (*x, *y))
}

impl PlotSink for SummarySink {
    fn update(&mut self, plot: &PlotData) {
        self.updates += 1;
        let peak = deepest_peak(plot);
        debug!(samples = plot.len(), ?peak, "plot delivered");
        if self.updates % self.log_every == 0 {
            if let Some((x, y)) = peak {
                info!(updates = self.updates, peak_index = x, peak_value = y, "waveform refreshed");
            }
        }
    }
}
