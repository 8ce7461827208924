pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod logging;
pub mod observability;
pub mod resilience;
pub mod source;
pub mod stages;
pub mod visualization;

pub use config::IngestConfig;
pub use error::PipelineError;
