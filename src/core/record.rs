use super::RawFrame;
use crate::error::{PipelineError, Result};
use std::sync::Arc;

/// A frame while it moves through the reduction stages.
///
/// Starts as the raw frame only; each stage moves data out of `raw` into
/// the typed slots.
#[derive(Debug, Clone)]
pub struct FrameInProgress {
    pub raw: RawFrame,
    pub waveform: Option<Vec<f64>>,
    pub x_axis: Option<Arc<[usize]>>,
    pub acquisition_id: Option<String>,
}

impl FrameInProgress {
    pub fn new(raw: RawFrame) -> Self {
        Self {
            raw,
            waveform: None,
            x_axis: None,
            acquisition_id: None,
        }
    }

    /// Finalize into a record of exactly `expected` samples.
    pub fn finish(self, expected: usize) -> Result<ReducedRecord> {
        let waveform = self.waveform.ok_or(PipelineError::Incomplete("waveform"))?;
        let x_axis = self.x_axis.ok_or(PipelineError::Incomplete("x axis"))?;
        let acquisition_id = self
            .acquisition_id
            .ok_or(PipelineError::Incomplete("acquisition id"))?;

        let record = ReducedRecord {
            timestamp: self.raw.timestamp,
            x_axis,
            waveform: waveform.into(),
            acquisition_id,
        };
        record.validate(expected)?;
        Ok(record)
    }
}

/// Output of the reduction pipeline: one sliced waveform with its axis and id
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedRecord {
    pub timestamp: u64,
    pub x_axis: Arc<[usize]>,
    pub waveform: Arc<[f64]>,
    pub acquisition_id: String,
}

impl ReducedRecord {
    pub fn len(&self) -> usize {
        self.waveform.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waveform.is_empty()
    }

    /// Check `len(x_axis) == len(waveform) == expected`.
    pub fn validate(&self, expected: usize) -> Result<()> {
        if self.x_axis.len() != expected || self.waveform.len() != expected {
            return Err(PipelineError::ShapeMismatch {
                x_len: self.x_axis.len(),
                y_len: self.waveform.len(),
                expected,
            });
        }
        Ok(())
    }

    pub fn plot_data(&self) -> PlotData {
        PlotData {
            x_axis: Arc::clone(&self.x_axis),
            waveform: Arc::clone(&self.waveform),
        }
    }
}

/// The `(x_axis, waveform)` pair handed to the rendering side
#[derive(Debug, Clone, PartialEq)]
pub struct PlotData {
    pub x_axis: Arc<[usize]>,
    pub waveform: Arc<[f64]>,
}

impl PlotData {
    pub fn len(&self) -> usize {
        self.waveform.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waveform.is_empty()
    }
}
