use crate::config::IngestConfig;
use crate::core::{FrameInProgress, RawFrame, ReducedRecord, Stage};
use crate::error::{PipelineError, Result};
use crate::source::{FrameSource, SourceRegistry};
use crate::stages::{AttachAcquisitionId, ExtractWaveform, SliceWaveform};
use tracing::{debug, info};

/// Turns a source's raw frames into reduced records.
///
/// Stages run in a fixed order on one frame at a time. The pipeline is
/// fused: once the source ends or fails at the transport level,
/// `next_record` keeps returning `None`. Reconnecting means building a new
/// pipeline.
pub struct ReductionPipeline {
    source: Box<dyn FrameSource>,
    stages: Vec<Box<dyn Stage>>,
    count: usize,
    finished: bool,
}

impl ReductionPipeline {
    /// The standard stage chain: extract, slice, attach id.
    pub fn standard_stages(config: &IngestConfig) -> Result<Vec<Box<dyn Stage>>> {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(ExtractWaveform::new(config.waveform.clone())),
            Box::new(SliceWaveform::new(config.start_index, config.count)?),
            Box::new(AttachAcquisitionId::new(config.acquisition_id.clone())),
        ];
        Ok(stages)
    }

    /// Validate `config`, resolve `config.source` and connect to it.
    pub async fn connect(registry: &SourceRegistry, config: &IngestConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        let stages = Self::standard_stages(config)?;
        let source = registry.create(&config.source)?;
        Self::open(source, stages, config.count).await
    }

    /// Connect an already built source.
    pub async fn open(
        mut source: Box<dyn FrameSource>,
        stages: Vec<Box<dyn Stage>>,
        count: usize,
    ) -> Result<Self> {
        source.connect().await?;
        info!(endpoint = source.endpoint(), stages = stages.len(), "pipeline connected");

        Ok(Self {
            source,
            stages,
            count,
            finished: false,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.source.endpoint()
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage over one raw frame.
    pub fn reduce(&self, raw: RawFrame) -> Result<ReducedRecord> {
        let mut frame = FrameInProgress::new(raw);
        for stage in &self.stages {
            frame = stage.process(frame)?;
        }
        frame.finish(self.count)
    }

    /// Next reduced record, or `None` once the stream has ended.
    ///
    /// A per-frame error, including a frame the source read whole but could
    /// not decode, is returned without ending the stream. Transport errors
    /// end it.
    pub async fn next_record(&mut self) -> Option<Result<ReducedRecord>> {
        if self.finished {
            return None;
        }

        match self.source.next_frame().await {
            Ok(Some(raw)) => Some(self.reduce(raw)),
            Ok(None) => {
                debug!(endpoint = self.source.endpoint(), "end of stream");
                self.finished = true;
                None
            }
            Err(e) => {
                if !e.is_per_frame() {
                    self.finished = true;
                }
                Some(Err(e))
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub async fn close(&mut self) -> Result<()> {
        self.finished = true;
        self.source.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Property;
    use crate::source::mock::ReplaySource;
    use serde_json::json;

    fn config() -> IngestConfig {
        IngestConfig {
            source: "mock://unit".to_string(),
            start_index: 2,
            count: 3,
            ..IngestConfig::default()
        }
    }

    fn frame(samples: usize, id: Option<u64>) -> RawFrame {
        let config = config();
        let mut raw = RawFrame::new(0);
        raw.insert(&config.waveform, Property::Samples((0..samples).map(|i| i as f64).collect()));
        if let Some(id) = id {
            raw.insert(&config.acquisition_id, Property::Value(json!(id)));
        }
        raw
    }

    async fn pipeline(frames: Vec<RawFrame>) -> ReductionPipeline {
        let config = config();
        ReductionPipeline::open(
            Box::new(ReplaySource::new("mock://unit", frames)),
            ReductionPipeline::standard_stages(&config).unwrap(),
            config.count,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_stage_order() {
        let pipeline = pipeline(Vec::new()).await;
        assert_eq!(
            pipeline.stage_names(),
            vec!["extract_waveform", "slice_waveform", "attach_acquisition_id"]
        );
    }

    #[tokio::test]
    async fn test_reduces_frames_then_ends() {
        let mut pipeline = pipeline(vec![frame(8, Some(1)), frame(8, Some(2))]).await;

        let first = pipeline.next_record().await.unwrap().unwrap();
        assert_eq!(&*first.x_axis, &[2, 3, 4]);
        assert_eq!(&*first.waveform, &[2.0, 3.0, 4.0]);
        assert_eq!(first.acquisition_id, "1");

        let second = pipeline.next_record().await.unwrap().unwrap();
        assert_eq!(second.acquisition_id, "2");

        assert!(pipeline.next_record().await.is_none());
        assert!(pipeline.is_finished());
        assert!(pipeline.next_record().await.is_none());
    }

    #[tokio::test]
    async fn test_per_frame_error_does_not_end_stream() {
        let mut pipeline = pipeline(vec![frame(4, Some(1)), frame(8, None), frame(8, Some(3))]).await;

        assert!(matches!(
            pipeline.next_record().await,
            Some(Err(PipelineError::IndexOutOfRange { len: 4, .. }))
        ));
        assert!(matches!(
            pipeline.next_record().await,
            Some(Err(PipelineError::MissingIdentifier { .. }))
        ));
        assert!(matches!(pipeline.next_record().await, Some(Ok(_))));
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_window() {
        let config = IngestConfig { count: 0, ..config() };
        let result = ReductionPipeline::connect(&SourceRegistry::with_defaults(), &config).await;
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_unreachable_source() {
        let config = config();
        let result = ReductionPipeline::open(
            Box::new(ReplaySource::unreachable("tcp://10.253.0.142:6666")),
            ReductionPipeline::standard_stages(&config).unwrap(),
            config.count,
        )
        .await;
        assert!(matches!(result, Err(PipelineError::SourceUnavailable { .. })));
    }
}
