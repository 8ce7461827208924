use crate::config::{default_acquisition_id_spec, default_waveform_spec};
use crate::core::{ChannelSpec, Property, RawFrame};
use crate::error::{PipelineError, Result};
use crate::source::FrameSource;
use async_trait::async_trait;
use serde_json::json;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::sleep;

/// Settings for the simulated digitizer
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedConfig {
    pub waveform: ChannelSpec,
    pub acquisition_id: ChannelSpec,
    /// Samples per raw waveform
    pub samples: usize,
    /// Frames to emit before a clean end of stream; `None` runs forever
    pub frames: Option<u64>,
    pub first_id: u64,
    /// Drop one id after every N frames, as if the source lost a train
    pub gap_every: Option<u64>,
    pub interval_ms: u64,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            waveform: default_waveform_spec(),
            acquisition_id: default_acquisition_id_spec(),
            samples: 1_000_000,
            frames: None,
            first_id: 1,
            gap_every: None,
            interval_ms: 0,
        }
    }
}

impl SimulatedConfig {
    /// Apply `key=value` options from the query part of a `mock://` address,
    /// e.g. `mock://test?frames=5&samples=1000&gap_every=3`.
    pub fn with_address_options(mut self, address: &str) -> Result<Self> {
        let Some((_, query)) = address.split_once('?') else {
            return Ok(self);
        };

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let parsed: u64 = value.parse().map_err(|_| PipelineError::SourceUnavailable {
                endpoint: address.to_string(),
                reason: format!("option {} needs an unsigned integer, got '{}'", key, value),
            })?;

            match key {
                "frames" => self.frames = Some(parsed),
                "samples" => self.samples = parsed as usize,
                "first_id" => self.first_id = parsed,
                "gap_every" => self.gap_every = Some(parsed).filter(|g| *g > 0),
                "interval_ms" => self.interval_ms = parsed,
                _ => {
                    return Err(PipelineError::SourceUnavailable {
                        endpoint: address.to_string(),
                        reason: format!("unknown option '{}'", key),
                    })
                }
            }
        }
        Ok(self)
    }
}

/// Synthetic time-of-flight digitizer.
///
/// Emits a fixed trace (flat baseline with a few negative ion peaks) and
/// an increasing train id on the configured channels.
pub struct SimulatedDetectorSource {
    endpoint: String,
    config: SimulatedConfig,
    template: Vec<f64>,
    connected: bool,
    emitted: u64,
    next_id: u64,
}

impl SimulatedDetectorSource {
    pub fn new(endpoint: impl Into<String>, config: SimulatedConfig) -> Self {
        let next_id = config.first_id;
        Self {
            endpoint: endpoint.into(),
            config,
            template: Vec::new(),
            connected: false,
            emitted: 0,
            next_id,
        }
    }

    pub fn frames_emitted(&self) -> u64 {
        self.emitted
    }
}

/// (position as fraction of trace, width in samples per 1M, amplitude)
const PEAKS: [(f64, f64, f64); 4] = [
    (0.15, 2_000.0, -420.0),
    (0.22, 900.0, -250.0),
    (0.31, 4_000.0, -120.0),
    (0.45, 1_500.0, -300.0),
];

fn tof_trace(samples: usize) -> Vec<f64> {
    let scale = samples as f64 / 1_000_000.0;
    (0..samples)
        .map(|i| {
            let x = i as f64;
            let peaks: f64 = PEAKS
                .iter()
                .map(|&(pos, width, amplitude)| {
                    let center = pos * samples as f64;
                    let sigma = (width * scale).max(1.0);
                    amplitude * (-0.5 * ((x - center) / sigma).powi(2)).exp()
                })
                .sum();
            peaks + 4.0 * (x * 0.05).sin()
        })
        .collect()
}

fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

#[async_trait]
impl FrameSource for SimulatedDetectorSource {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn connect(&mut self) -> Result<()> {
        if self.template.len() != self.config.samples {
            self.template = tof_trace(self.config.samples);
        }
        self.connected = true;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        if !self.connected {
            return Err(PipelineError::SourceUnavailable {
                endpoint: self.endpoint.clone(),
                reason: "not connected".to_string(),
            });
        }
        if self.config.frames.is_some_and(|limit| self.emitted >= limit) {
            return Ok(None);
        }
        if self.config.interval_ms > 0 {
            sleep(Duration::from_millis(self.config.interval_ms)).await;
        }

        let mut frame = RawFrame::new(now_micros());
        frame.insert(&self.config.waveform, Property::Samples(self.template.clone()));
        frame.insert(&self.config.acquisition_id, Property::Value(json!(self.next_id)));

        self.emitted += 1;
        self.next_id += 1;
        if let Some(gap) = self.config.gap_every {
            if self.emitted % gap == 0 {
                self.next_id += 1;
            }
        }

        Ok(Some(frame))
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(frames: u64) -> SimulatedConfig {
        SimulatedConfig {
            samples: 1_000,
            frames: Some(frames),
            ..SimulatedConfig::default()
        }
    }

    fn id_of(frame: &RawFrame) -> u64 {
        match frame.get(&default_acquisition_id_spec()) {
            Some(Property::Value(v)) => v.as_u64().unwrap(),
            other => panic!("unexpected id property {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_emits_limited_frames() {
        let mut source = SimulatedDetectorSource::new("mock://test", small(3));
        source.connect().await.unwrap();

        let mut ids = Vec::new();
        while let Some(frame) = source.next_frame().await.unwrap() {
            match frame.get(&default_waveform_spec()) {
                Some(Property::Samples(s)) => assert_eq!(s.len(), 1_000),
                other => panic!("unexpected waveform property {:?}", other),
            }
            ids.push(id_of(&frame));
        }

        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(source.frames_emitted(), 3);
    }

    #[tokio::test]
    async fn test_gap_every_skips_ids() {
        let config = SimulatedConfig {
            gap_every: Some(2),
            first_id: 100,
            ..small(4)
        };
        let mut source = SimulatedDetectorSource::new("mock://gaps", config);
        source.connect().await.unwrap();

        let mut ids = Vec::new();
        while let Some(frame) = source.next_frame().await.unwrap() {
            ids.push(id_of(&frame));
        }
        assert_eq!(ids, vec![100, 101, 103, 104]);
    }

    #[tokio::test]
    async fn test_requires_connect() {
        let mut source = SimulatedDetectorSource::new("mock://test", small(1));
        assert!(source.next_frame().await.is_err());
    }

    #[test]
    fn test_address_options() {
        let config = SimulatedConfig::default()
            .with_address_options("mock://test?frames=5&samples=2000&gap_every=0&interval_ms=10")
            .unwrap();
        assert_eq!(config.frames, Some(5));
        assert_eq!(config.samples, 2000);
        assert_eq!(config.gap_every, None);
        assert_eq!(config.interval_ms, 10);

        assert!(SimulatedConfig::default()
            .with_address_options("mock://test?rate=fast")
            .is_err());
        assert!(SimulatedConfig::default()
            .with_address_options("mock://test?bogus=1")
            .is_err());
    }

    #[test]
    fn test_trace_has_negative_peaks() {
        let trace = tof_trace(10_000);
        let min = trace.iter().cloned().fold(f64::INFINITY, f64::min);
        assert!(min < -400.0);
        assert!(trace.iter().all(|v| *v < 10.0));
    }
}
