use crate::core::{FrameInProgress, Stage};
use crate::error::{PipelineError, Result};
use std::sync::Arc;

/// Cuts the waveform to `[start, start + count)` and attaches the matching
/// x axis.
///
/// The axis is built once and shared by every record. A waveform shorter
/// than the window is an error; it is never padded or truncated.
pub struct SliceWaveform {
    start: usize,
    end: usize,
    x_axis: Arc<[usize]>,
}

impl SliceWaveform {
    pub fn new(start: usize, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(PipelineError::InvalidConfig("slice count must be greater than zero".into()));
        }
        let end = start.checked_add(count).ok_or_else(|| {
            PipelineError::InvalidConfig(format!("slice [{}, +{}) overflows the index range", start, count))
        })?;

        Ok(Self {
            start,
            end,
            x_axis: (start..end).collect(),
        })
    }

    pub fn x_axis(&self) -> &Arc<[usize]> {
        &self.x_axis
    }
}

impl Stage for SliceWaveform {
    fn name(&self) -> &str {
        "slice_waveform"
    }

    fn process(&self, mut frame: FrameInProgress) -> Result<FrameInProgress> {
        let mut samples = frame.waveform.take().ok_or(PipelineError::Incomplete("waveform"))?;

        if samples.len() < self.end {
            return Err(PipelineError::IndexOutOfRange {
                start: self.start,
                end: self.end,
                len: samples.len(),
            });
        }

        samples.truncate(self.end);
        samples.drain(..self.start);

        frame.waveform = Some(samples);
        frame.x_axis = Some(Arc::clone(&self.x_axis));
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RawFrame;

    fn with_waveform(samples: Vec<f64>) -> FrameInProgress {
        let mut frame = FrameInProgress::new(RawFrame::new(0));
        frame.waveform = Some(samples);
        frame
    }

    #[test]
    fn test_slices_window() {
        let samples: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let out = SliceWaveform::new(3, 4).unwrap().process(with_waveform(samples)).unwrap();

        assert_eq!(out.waveform, Some(vec![3.0, 4.0, 5.0, 6.0]));
        assert_eq!(out.x_axis.as_deref(), Some(&[3, 4, 5, 6][..]));
    }

    #[test]
    fn test_exact_fit_is_accepted() {
        let out = SliceWaveform::new(2, 3).unwrap().process(with_waveform(vec![0.0; 5])).unwrap();
        assert_eq!(out.waveform.map(|w| w.len()), Some(3));
    }

    #[test]
    fn test_short_waveform_is_out_of_range() {
        let err = SliceWaveform::new(2, 3)
            .unwrap()
            .process(with_waveform(vec![0.0; 4]))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::IndexOutOfRange { start: 2, end: 5, len: 4 }
        ));
    }

    #[test]
    fn test_axis_is_shared_between_frames() {
        let stage = SliceWaveform::new(0, 2).unwrap();
        let a = stage.process(with_waveform(vec![1.0, 2.0])).unwrap();
        let b = stage.process(with_waveform(vec![3.0, 4.0])).unwrap();
        assert!(Arc::ptr_eq(a.x_axis.as_ref().unwrap(), b.x_axis.as_ref().unwrap()));
    }

    #[test]
    fn test_rejects_empty_or_overflowing_window() {
        assert!(matches!(SliceWaveform::new(5, 0), Err(PipelineError::InvalidConfig(_))));
        assert!(matches!(
            SliceWaveform::new(usize::MAX, 1),
            Err(PipelineError::InvalidConfig(_))
        ));
    }
}
