use super::codec::read_frame;
use super::traits::{split_address, FrameSource};
use crate::core::RawFrame;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Length-prefixed JSON frames over a TCP connection (`tcp://host:port`)
pub struct TcpSource {
    endpoint: String,
    host: String,
    stream: Option<BufReader<TcpStream>>,
}

impl TcpSource {
    pub fn new(address: &str) -> Result<Self> {
        let host = match split_address(address) {
            Some(("tcp", host)) if !host.is_empty() => host.to_string(),
            _ => return Err(PipelineError::UnsupportedScheme(address.to_string())),
        };

        Ok(Self {
            endpoint: address.to_string(),
            host,
            stream: None,
        })
    }

    fn unavailable(&self, reason: impl Into<String>) -> PipelineError {
        PipelineError::SourceUnavailable {
            endpoint: self.endpoint.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl FrameSource for TcpSource {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn connect(&mut self) -> Result<()> {
        let stream = TcpStream::connect(&self.host)
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;
        stream.set_nodelay(true)?;

        info!(endpoint = %self.endpoint, "connected to frame source");
        self.stream = Some(BufReader::new(stream));
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(PipelineError::SourceUnavailable {
                endpoint: self.endpoint.clone(),
                reason: "not connected".to_string(),
            });
        };

        let frame = read_frame(stream).await?;
        if frame.is_none() {
            debug!(endpoint = %self.endpoint, "peer closed the stream");
            self.stream = None;
        }
        Ok(frame)
    }

    async fn close(&mut self) -> Result<()> {
        self.stream = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_foreign_scheme() {
        assert!(TcpSource::new("mock://x").is_err());
        assert!(TcpSource::new("tcp://").is_err());
        assert_eq!(TcpSource::new("tcp://127.0.0.1:8011").unwrap().endpoint(), "tcp://127.0.0.1:8011");
    }

    #[tokio::test]
    async fn test_next_frame_before_connect() {
        let mut source = TcpSource::new("tcp://127.0.0.1:8011").unwrap();
        assert!(matches!(
            source.next_frame().await,
            Err(PipelineError::SourceUnavailable { .. })
        ));
    }
}
