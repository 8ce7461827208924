pub mod metrics;
pub mod monitor;

pub use metrics::{HandoffMetrics, HandoffSnapshot};
pub use monitor::{LoopClassification, MonitorReport, MonitorSnapshot, PerformanceMonitor};
