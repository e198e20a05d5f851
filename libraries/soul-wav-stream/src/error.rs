//! Error types for WAV stream decoding

use std::fmt;
use thiserror::Error;

/// Sink negotiation step that declined the stream format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkSetting {
    /// `set_rate` returned false
    SampleRate(u32),
    /// `set_bits_per_sample` returned false
    BitsPerSample(u16),
    /// `set_channels` returned false
    Channels(u16),
    /// The sink's own `begin` returned false
    Begin,
}

impl fmt::Display for SinkSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SampleRate(hz) => write!(f, "sample rate {} Hz", hz),
            Self::BitsPerSample(bits) => write!(f, "{} bits per sample", bits),
            Self::Channels(n) => write!(f, "{} channel(s)", n),
            Self::Begin => f.write_str("sink begin"),
        }
    }
}

/// WAV stream errors
#[derive(Debug, Error)]
pub enum StreamError {
    /// Magic, format field or chunk layout is not canonical PCM WAVE
    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    /// Source ended before a header field or chunk skip was satisfied
    #[error("Truncated stream: expected {expected} bytes, got {got}")]
    TruncatedStream { expected: usize, got: usize },

    /// Sink refused the negotiated format
    #[error("Sink rejected {0}")]
    SinkRejected(SinkSetting),

    /// Source handle is not open
    #[error("Source is not open")]
    SourceNotOpen,

    /// Source cannot skip forward
    #[error("Source does not support seeking")]
    SeekUnsupported,

    /// Source failed to open its locator
    #[error("Failed to open source: {0}")]
    Open(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    /// Create a malformed container error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedContainer(msg.into())
    }
}

/// Result type for stream operations
pub type Result<T> = std::result::Result<T, StreamError>;
