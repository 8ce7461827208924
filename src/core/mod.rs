pub mod frame;
pub mod record;
pub mod stage;

pub use frame::{ChannelData, ChannelSpec, Property, RawFrame};
pub use record::{FrameInProgress, PlotData, ReducedRecord};
pub use stage::Stage;
