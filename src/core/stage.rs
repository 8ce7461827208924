use super::FrameInProgress;
use crate::error::Result;

/// One per-frame transform in the reduction pipeline.
///
/// Stages are pure: they see exactly one frame at a time and hold no
/// state across frames. An `Err` ends the frame (and, under the default
/// policy, the stream).
pub trait Stage: Send {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn process(&self, frame: FrameInProgress) -> Result<FrameInProgress>;
}
