use crate::core::RawFrame;
use crate::error::{PipelineError, Result};
use crate::source::FrameSource;
use async_trait::async_trait;
use std::collections::VecDeque;

/// Plays back a fixed list of frames, then ends the stream.
pub struct ReplaySource {
    endpoint: String,
    frames: VecDeque<RawFrame>,
    reachable: bool,
    connected: bool,
}

impl ReplaySource {
    pub fn new(endpoint: impl Into<String>, frames: impl IntoIterator<Item = RawFrame>) -> Self {
        Self {
            endpoint: endpoint.into(),
            frames: frames.into_iter().collect(),
            reachable: true,
            connected: false,
        }
    }

    /// A source whose `connect` always fails
    pub fn unreachable(endpoint: impl Into<String>) -> Self {
        Self {
            reachable: false,
            ..Self::new(endpoint, Vec::new())
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

#[async_trait]
impl FrameSource for ReplaySource {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn connect(&mut self) -> Result<()> {
        if !self.reachable {
            return Err(PipelineError::SourceUnavailable {
                endpoint: self.endpoint.clone(),
                reason: "connection refused".to_string(),
            });
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
        Ok(self.frames.pop_front())
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }
}
