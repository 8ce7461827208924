use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A single property published by a detector channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Property {
    /// Numeric sample array (waveforms, traces)
    Samples(Vec<f64>),
    /// Anything else: counters, identifiers, strings
    Value(Value),
}

/// Properties of one channel keyed by dotted field name
pub type ChannelData = HashMap<String, Property>;

/// One frame as delivered by a source, before any reduction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    /// Receive timestamp in microseconds since epoch
    #[serde(default)]
    pub timestamp: u64,

    /// Data keyed by detector channel id
    pub channels: HashMap<String, ChannelData>,
}

impl RawFrame {
    pub fn new(timestamp: u64) -> Self {
        Self {
            timestamp,
            channels: HashMap::new(),
        }
    }

    pub fn insert(&mut self, spec: &ChannelSpec, property: Property) {
        self.channels
            .entry(spec.channel.clone())
            .or_default()
            .insert(spec.field.clone(), property);
    }

    pub fn get(&self, spec: &ChannelSpec) -> Option<&Property> {
        self.channels.get(&spec.channel)?.get(&spec.field)
    }

    pub fn take(&mut self, spec: &ChannelSpec) -> Option<Property> {
        self.channels.get_mut(&spec.channel)?.remove(&spec.field)
    }
}

/// Addresses a property inside a frame: detector channel plus field name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub channel: String,
    pub field: String,
}

impl ChannelSpec {
    pub fn new(channel: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            field: field.into(),
        }
    }
}

impl std::fmt::Display for ChannelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.channel, self.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_property_decoding() {
        let json = r#"{
            "timestamp": 7,
            "channels": {
                "DIGI:network": {
                    "samples": [1.0, -2.5, 3],
                    "trainId": 1234
                }
            }
        }"#;

        let frame: RawFrame = serde_json::from_str(json).unwrap();
        let samples = frame.get(&ChannelSpec::new("DIGI:network", "samples"));
        assert_eq!(samples, Some(&Property::Samples(vec![1.0, -2.5, 3.0])));

        let id = frame.get(&ChannelSpec::new("DIGI:network", "trainId"));
        assert_eq!(id, Some(&Property::Value(serde_json::json!(1234))));
    }

    #[test]
    fn test_take_removes_property() {
        let spec = ChannelSpec::new("a", "b");
        let mut frame = RawFrame::new(0);
        frame.insert(&spec, Property::Samples(vec![0.0; 4]));

        assert!(frame.take(&spec).is_some());
        assert!(frame.get(&spec).is_none());
    }
}
