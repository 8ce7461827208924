pub mod context;
pub mod handoff;
pub mod sink;

pub use context::{ConsumerContext, ContextHandle, Task};
pub use handoff::LatestValueHandoff;
pub use sink::{LatestPlot, PlotSink, SummarySink};
