use crate::core::ChannelSpec;
use crate::resilience::FramePolicy;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SOURCE: &str = "tcp://127.0.0.1:8011";
pub const DIGITIZER_CHANNEL: &str = "SQS_DIGITIZER_UTC1/ADC/1:network";

pub fn default_waveform_spec() -> ChannelSpec {
    ChannelSpec::new(DIGITIZER_CHANNEL, "digitizers.channel_1_A.raw.samples")
}

pub fn default_acquisition_id_spec() -> ChannelSpec {
    ChannelSpec::new(DIGITIZER_CHANNEL, "digitizers.trainId")
}

/// Everything the ingest loop needs to know, loadable from JSON.
///
/// Missing fields fall back to the defaults, so `{}` is a valid file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Source address, `tcp://host:port` or `mock://name?options`
    pub source: String,
    /// First waveform index kept
    pub start_index: usize,
    /// Number of samples kept per frame
    pub count: usize,
    pub waveform: ChannelSpec,
    pub acquisition_id: ChannelSpec,
    /// Loop body budget the monitor classifies against
    pub loop_budget_ms: u64,
    pub frame_policy: FramePolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            start_index: 130_000,
            count: 400_000,
            waveform: default_waveform_spec(),
            acquisition_id: default_acquisition_id_spec(),
            loop_budget_ms: 100,
            frame_policy: FramePolicy::Abort,
        }
    }
}

impl IngestConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: IngestConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            bail!("count must be greater than zero");
        }
        if self.start_index.checked_add(self.count).is_none() {
            bail!("start_index + count overflows");
        }
        if self.loop_budget_ms == 0 {
            bail!("loop_budget_ms must be greater than zero");
        }
        if self.source.trim().is_empty() {
            bail!("source address is empty");
        }
        Ok(())
    }

    /// One past the last waveform index kept
    pub fn end_index(&self) -> usize {
        self.start_index + self.count
    }

    pub fn loop_budget(&self) -> Duration {
        Duration::from_millis(self.loop_budget_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.end_index(), 530_000);
        assert_eq!(config.loop_budget(), Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"source": "mock://bench", "count": 1000, "frame_policy": "skip_frame"}}"#
        )
        .unwrap();

        let config = IngestConfig::load(file.path()).unwrap();
        assert_eq!(config.source, "mock://bench");
        assert_eq!(config.count, 1000);
        assert_eq!(config.start_index, 130_000);
        assert_eq!(config.frame_policy, FramePolicy::SkipFrame);
        assert_eq!(config.acquisition_id, default_acquisition_id_spec());
    }

    #[test]
    fn test_validate_rejects_bad_window() {
        let config = IngestConfig {
            count: 0,
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());

        let config = IngestConfig {
            start_index: usize::MAX,
            count: 1,
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = IngestConfig::load("/nonexistent/tofstream.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
