use crate::core::{ChannelSpec, FrameInProgress, Property, Stage};
use crate::error::{PipelineError, Result};
use serde_json::Value;

/// Reads the acquisition id from its declared channel and field.
///
/// Ids must be decimal integers, whether they arrive as JSON numbers or
/// strings; anything else fails here instead of inside the monitor.
pub struct AttachAcquisitionId {
    spec: ChannelSpec,
}

impl AttachAcquisitionId {
    pub fn new(spec: ChannelSpec) -> Self {
        Self { spec }
    }

    fn missing(&self) -> PipelineError {
        PipelineError::MissingIdentifier {
            channel: self.spec.channel.clone(),
            field: self.spec.field.clone(),
        }
    }
}

/// Canonical decimal form of an id, or `None` if it is not an integer.
pub fn normalize_id(raw: &str) -> Option<String> {
    raw.trim().parse::<i64>().ok().map(|id| id.to_string())
}

fn id_from_property(property: &Property) -> std::result::Result<String, String> {
    match property {
        Property::Value(Value::Number(n)) => match n.as_i64() {
            Some(id) => Ok(id.to_string()),
            None => Err(n.to_string()),
        },
        Property::Value(Value::String(s)) => normalize_id(s).ok_or_else(|| s.clone()),
        // single-element arrays show up when the id is published per pulse
        Property::Samples(values) if values.len() == 1 && values[0].fract() == 0.0 => {
            Ok((values[0] as i64).to_string())
        }
        Property::Samples(values) => Err(format!("array of {} samples", values.len())),
        Property::Value(other) => Err(other.to_string()),
    }
}

impl Stage for AttachAcquisitionId {
    fn name(&self) -> &str {
        "attach_acquisition_id"
    }

    fn process(&self, mut frame: FrameInProgress) -> Result<FrameInProgress> {
        let property = frame.raw.get(&self.spec).ok_or_else(|| self.missing())?;
        if matches!(property, Property::Value(Value::Null)) {
            return Err(self.missing());
        }

        let id = id_from_property(property).map_err(PipelineError::InvalidIdentifier)?;
        frame.acquisition_id = Some(id);
        Ok(frame)
    }
}
