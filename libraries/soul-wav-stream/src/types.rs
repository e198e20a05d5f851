//! Core types for WAV stream decoding

use std::time::Duration;

/// PCM sample width supported by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    /// 8-bit unsigned samples (0-255, silence at 128)
    Eight,

    /// 16-bit signed little-endian samples
    Sixteen,
}

impl BitDepth {
    /// Map a `bitsPerSample` header value, `None` if unsupported
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(Self::Eight),
            16 => Some(Self::Sixteen),
            _ => None,
        }
    }

    pub fn bits(self) -> u16 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
        }
    }

    /// Bytes per sample per channel
    pub fn bytes(self) -> usize {
        match self {
            Self::Eight => 1,
            Self::Sixteen => 2,
        }
    }
}

/// Channel layout supported by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    /// Map a `numChannels` header value, `None` if unsupported
    pub fn from_count(channels: u16) -> Option<Self> {
        match channels {
            1 => Some(Self::Mono),
            2 => Some(Self::Stereo),
            _ => None,
        }
    }

    pub fn count(self) -> u16 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

/// Validated format of a PCM WAVE stream
///
/// Produced once by the chunk reader and never modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    /// Sample rate in Hz (always > 0)
    pub sample_rate: u32,

    /// Sample width
    pub bits_per_sample: BitDepth,

    /// Mono or stereo
    pub channels: ChannelLayout,

    /// PCM payload length declared by the `data` chunk header
    ///
    /// Live streams often write a placeholder here, so it is a hint only.
    pub data_len: u32,

    /// Source position where PCM data begins
    pub data_offset: u32,
}

impl StreamFormat {
    /// Bytes making up one frame across all channels
    pub fn bytes_per_frame(&self) -> usize {
        self.bits_per_sample.bytes() * self.channels.count() as usize
    }

    /// Frame count implied by the declared data length
    pub fn declared_frames(&self) -> u64 {
        u64::from(self.data_len) / self.bytes_per_frame() as u64
    }

    /// Playback time of `frames` frames at this sample rate
    pub fn frames_to_duration(&self, frames: u64) -> Duration {
        let secs = frames / u64::from(self.sample_rate);
        let rem = frames % u64::from(self.sample_rate);
        Duration::from_secs(secs)
            + Duration::from_nanos(rem * 1_000_000_000 / u64::from(self.sample_rate))
    }
}

/// One instant of audio across both output channels
///
/// 8-bit streams carry unsigned values (0-255), 16-bit streams carry signed
/// values. `right` is 0 for mono streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleFrame {
    pub left: i32,
    pub right: i32,
}

impl SampleFrame {
    pub fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }
}

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Never started
    Idle,

    /// Reading the container header
    Parsing,

    /// Decoding and delivering frames
    Running,

    /// Finished or stopped; resources released
    Stopped,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Source returned no more data on a frame boundary
    EndOfStream,

    /// Source ended mid-frame; the partial frame was dropped
    TruncatedFrame {
        /// Bytes of the incomplete frame that had been read
        bytes: usize,
    },

    /// Declared data chunk length fully consumed
    DataComplete,

    /// `stop()` was called
    Stopped,
}

/// Outcome of a single `advance` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Engine is not running; nothing happened
    Inactive,

    /// Sink declined a frame; it will be offered again next call
    Backpressure { delivered: usize },

    /// Per-tick frame budget reached; more data may be pending
    Yielded { delivered: usize },

    /// Decoding ended and the engine stopped
    Finished { delivered: usize, reason: StopReason },
}

impl Step {
    /// Frames accepted by the sink during this call
    pub fn delivered(&self) -> usize {
        match *self {
            Self::Inactive => 0,
            Self::Backpressure { delivered }
            | Self::Yielded { delivered }
            | Self::Finished { delivered, .. } => delivered,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }
}
