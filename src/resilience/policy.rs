use serde::{Deserialize, Serialize};

/// What the ingest loop does when a single frame fails to reduce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FramePolicy {
    /// Stop the loop in the faulted state
    #[default]
    Abort,

    /// Log the frame, count it, and keep going. The dropped frame never
    /// reaches the monitor, so it shows up as an acquisition id skip.
    SkipFrame,
}

impl FramePolicy {
    pub fn name(&self) -> &str {
        match self {
            Self::Abort => "abort",
            Self::SkipFrame => "skip_frame",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_serde_names() {
        let policy: FramePolicy = serde_json::from_str("\"skip_frame\"").unwrap();
        assert_eq!(policy, FramePolicy::SkipFrame);
        assert_eq!(serde_json::to_string(&FramePolicy::Abort).unwrap(), "\"abort\"");
        assert_eq!(FramePolicy::default(), FramePolicy::Abort);
    }
}
