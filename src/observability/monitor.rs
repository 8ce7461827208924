use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::warn;

pub const DEFAULT_LOOP_BUDGET: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopClassification {
    Ok,
    TooLong,
}

impl fmt::Display for LoopClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::TooLong => f.write_str("TOO LONG"),
        }
    }
}

/// Contents of one status line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorReport {
    pub avg_frequency_hz: f64,
    pub skip_count: u64,
    pub skip_percent: f64,
    pub iteration: u64,
    pub acquisition_id: String,
    pub budget_percent: f64,
    pub classification: LoopClassification,
}

impl fmt::Display for MonitorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frequency: {:.1} Hz  |  skipped: {} ( {:.1} %)  |  n: {}/{}  |  Loop benchmark: {:.1} % (OK if <100%) - {}",
            self.avg_frequency_hz,
            self.skip_count,
            self.skip_percent,
            self.iteration,
            self.acquisition_id,
            self.budget_percent,
            self.classification,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorSnapshot {
    /// Zero-based index of the last iteration, `None` before the first
    pub iteration: Option<u64>,
    pub skip_count: u64,
    pub running_avg_interval: f64,
    pub avg_frequency_hz: f64,
    pub loop_body_duration: Duration,
    pub acquisition_id: Option<String>,
    pub previous_acquisition_id: Option<String>,
}

/// Tracks loop timing and acquisition id continuity, printing one status
/// line per iteration. Purely diagnostic: it never throttles the loop.
///
/// The loop body duration lags one iteration: what is recorded at the
/// bottom of iteration `n` is classified at the top of iteration `n + 1`.
pub struct PerformanceMonitor {
    iteration: Option<u64>,
    last_iteration_at: Instant,
    loop_started_at: Instant,
    /// Cumulative mean of the iteration interval, seconds
    running_avg_interval: f64,
    acquisition_id: Option<String>,
    previous_acquisition_id: Option<String>,
    skip_count: u64,
    loop_body_duration: Duration,
    budget: Duration,
    last_report: Option<MonitorReport>,
    out: Box<dyn Write + Send>,
}

impl PerformanceMonitor {
    /// Monitor printing to stdout
    pub fn new(budget: Duration) -> Self {
        Self::with_writer(budget, Box::new(std::io::stdout()))
    }

    pub fn with_writer(budget: Duration, out: Box<dyn Write + Send>) -> Self {
        Self::starting_at(Instant::now(), budget, out)
    }

    /// Monitor whose clock starts at `start`; use with the `*_at` methods
    /// to drive it from synthetic timestamps.
    pub fn starting_at(start: Instant, budget: Duration, out: Box<dyn Write + Send>) -> Self {
        Self {
            iteration: None,
            last_iteration_at: start,
            loop_started_at: start,
            running_avg_interval: 0.0,
            acquisition_id: None,
            previous_acquisition_id: None,
            skip_count: 0,
            loop_body_duration: Duration::ZERO,
            budget,
            last_report: None,
            out,
        }
    }

    /// Call at the top of every loop iteration.
    pub fn iteration(&mut self) {
        self.iteration_at(Instant::now());
        // the body is timed from after the status line went out
        self.loop_started_at = Instant::now();
    }

    pub fn iteration_at(&mut self, now: Instant) {
        let n = self.iteration.map_or(0, |n| n + 1);
        self.iteration = Some(n);

        let dt = now.saturating_duration_since(self.last_iteration_at).as_secs_f64();
        self.last_iteration_at = now;

        if n > 0 {
            self.running_avg_interval = (self.running_avg_interval * (n - 1) as f64 + dt) / n as f64;

            let report = self.build_report(n);
            // status output is best effort; a closed stdout must not stop ingest
            let _ = writeln!(self.out, "{}", report);
            self.last_report = Some(report);
        }

        self.loop_started_at = now;
    }

    fn build_report(&self, n: u64) -> MonitorReport {
        let budget_percent = self.loop_body_duration.as_secs_f64() / self.budget.as_secs_f64() * 100.0;
        let classification = if budget_percent < 100.0 {
            LoopClassification::Ok
        } else {
            LoopClassification::TooLong
        };

        MonitorReport {
            avg_frequency_hz: self.avg_frequency_hz(),
            skip_count: self.skip_count,
            skip_percent: self.skip_count as f64 / n as f64 * 100.0,
            iteration: n,
            acquisition_id: self.acquisition_id.clone().unwrap_or_else(|| "-".to_string()),
            budget_percent,
            classification,
        }
    }

    /// Record the id of the frame handled in this iteration.
    ///
    /// The first id ever seen gets a synthetic predecessor of `id - 1`, so
    /// it never counts as a skip, whatever its value. Any other step than
    /// +1 is a skip.
    pub fn update_acquisition_id(&mut self, id: &str) {
        let first = self.acquisition_id.is_none() || self.iteration.map_or(true, |n| n == 0);

        self.previous_acquisition_id = self.acquisition_id.replace(id.to_string());

        let current = match id.trim().parse::<i64>() {
            Ok(current) => current,
            Err(_) if first => {
                warn!(acquisition_id = id, "first acquisition id is not a decimal integer");
                return;
            }
            Err(_) => {
                warn!(acquisition_id = id, "acquisition id is not a decimal integer, counting a skip");
                self.skip_count += 1;
                return;
            }
        };

        if first {
            self.previous_acquisition_id = Some(current.wrapping_sub(1).to_string());
            return;
        }

        let previous = self
            .previous_acquisition_id
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok());
        if previous.map_or(true, |p| current.wrapping_sub(p) != 1) {
            self.skip_count += 1;
        }
    }

    /// Call at the bottom of every loop iteration.
    pub fn record_loop_duration(&mut self) {
        self.record_loop_duration_at(Instant::now());
    }

    pub fn record_loop_duration_at(&mut self, now: Instant) {
        self.loop_body_duration = now.saturating_duration_since(self.loop_started_at);
    }

    pub fn iteration_index(&self) -> Option<u64> {
        self.iteration
    }

    pub fn skip_count(&self) -> u64 {
        self.skip_count
    }

    /// Seconds
    pub fn running_avg_interval(&self) -> f64 {
        self.running_avg_interval
    }

    pub fn avg_frequency_hz(&self) -> f64 {
        if self.running_avg_interval > 0.0 {
            1.0 / self.running_avg_interval
        } else {
            f64::INFINITY
        }
    }

    pub fn loop_body_duration(&self) -> Duration {
        self.loop_body_duration
    }

    pub fn acquisition_id(&self) -> Option<&str> {
        self.acquisition_id.as_deref()
    }

    pub fn previous_acquisition_id(&self) -> Option<&str> {
        self.previous_acquisition_id.as_deref()
    }

    pub fn last_report(&self) -> Option<&MonitorReport> {
        self.last_report.as_ref()
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            iteration: self.iteration,
            skip_count: self.skip_count,
            running_avg_interval: self.running_avg_interval,
            avg_frequency_hz: self.avg_frequency_hz(),
            loop_body_duration: self.loop_body_duration,
            acquisition_id: self.acquisition_id.clone(),
            previous_acquisition_id: self.previous_acquisition_id.clone(),
        }
    }
}

impl fmt::Debug for PerformanceMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("snapshot", &self.snapshot())
            .field("budget", &self.budget)
            .finish()
    }
}
