pub mod detector;
pub mod replay;

pub use detector::{SimulatedConfig, SimulatedDetectorSource};
pub use replay::ReplaySource;
