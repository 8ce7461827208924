pub mod acquisition;
pub mod extract;
pub mod slice;

pub use acquisition::AttachAcquisitionId;
pub use extract::ExtractWaveform;
pub use slice::SliceWaveform;
