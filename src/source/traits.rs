use crate::core::RawFrame;
use crate::error::Result;
use async_trait::async_trait;

/// A streaming endpoint that yields raw detector frames.
///
/// Frames are pulled one at a time; the stream is not restartable. A
/// source that has ended (or failed) must be reconnected through a fresh
/// instance from the registry.
#[async_trait]
pub trait FrameSource: Send {
    /// Address this source was created for, e.g. `tcp://127.0.0.1:8011`
    fn endpoint(&self) -> &str;

    /// Open the stream. Fails with `SourceUnavailable` if the endpoint
    /// cannot be reached.
    async fn connect(&mut self) -> Result<()>;

    /// Block until the next frame arrives. `Ok(None)` is a clean end of
    /// stream.
    async fn next_frame(&mut self) -> Result<Option<RawFrame>>;

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Split `scheme://rest` into its parts.
pub fn split_address(address: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = address.split_once("://")?;
    if scheme.is_empty() {
        return None;
    }
    Some((scheme, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_address() {
        assert_eq!(split_address("tcp://10.0.0.1:6666"), Some(("tcp", "10.0.0.1:6666")));
        assert_eq!(split_address("mock://test"), Some(("mock", "test")));
        assert_eq!(split_address("127.0.0.1:6666"), None);
        assert_eq!(split_address("://x"), None);
    }
}
