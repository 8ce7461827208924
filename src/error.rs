use thiserror::Error;

/// Errors raised while connecting to a source or reducing its frames.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source {endpoint} unavailable: {reason}")]
    SourceUnavailable { endpoint: String, reason: String },

    #[error("unsupported source address '{0}' (known schemes: tcp, mock)")]
    UnsupportedScheme(String),

    #[error("malformed frame: field {field} missing on channel {channel}")]
    MalformedFrame { channel: String, field: String },

    #[error("waveform has {len} samples, slice needs [{start}, {end})")]
    IndexOutOfRange { start: usize, end: usize, len: usize },

    #[error("frame has no acquisition id at {channel}/{field}")]
    MissingIdentifier { channel: String, field: String },

    #[error("acquisition id '{0}' is not a decimal integer")]
    InvalidIdentifier(String),

    #[error("record shape mismatch: x_axis {x_len}, waveform {y_len}, expected {expected}")]
    ShapeMismatch {
        x_len: usize,
        y_len: usize,
        expected: usize,
    },

    #[error("invalid ingest config: {0}")]
    InvalidConfig(String),

    #[error("reduction incomplete: no {0} attached")]
    Incomplete(&'static str),

    #[error("source i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl PipelineError {
    /// True for structural problems confined to a single frame.
    ///
    /// Connect and transport failures are never per-frame: the stream
    /// itself is gone once they happen.
    pub fn is_per_frame(&self) -> bool {
        matches!(
            self,
            Self::MalformedFrame { .. }
                | Self::IndexOutOfRange { .. }
                | Self::MissingIdentifier { .. }
                | Self::InvalidIdentifier(_)
                | Self::ShapeMismatch { .. }
                | Self::Incomplete(_)
                | Self::Decode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
