pub mod ingest;
pub mod pipeline;
pub mod state;

pub use ingest::{IngestHandle, IngestLoop, IngestReport};
pub use pipeline::ReductionPipeline;
pub use state::{IngestState, StopReason};
