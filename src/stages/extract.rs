use crate::core::{ChannelSpec, FrameInProgress, Property, Stage};
use crate::error::{PipelineError, Result};

/// Moves the raw time-of-flight samples out of the frame.
pub struct ExtractWaveform {
    spec: ChannelSpec,
}

impl ExtractWaveform {
    pub fn new(spec: ChannelSpec) -> Self {
        Self { spec }
    }
}

impl Stage for ExtractWaveform {
    fn name(&self) -> &str {
        "extract_waveform"
    }

    fn process(&self, mut frame: FrameInProgress) -> Result<FrameInProgress> {
        match frame.raw.take(&self.spec) {
            Some(Property::Samples(samples)) => {
                frame.waveform = Some(samples);
                Ok(frame)
            }
            // a scalar where an array belongs is as bad as no field at all
            Some(Property::Value(_)) | None => Err(PipelineError::MalformedFrame {
                channel: self.spec.channel.clone(),
                field: self.spec.field.clone(),
            }),
        }
    }
}
