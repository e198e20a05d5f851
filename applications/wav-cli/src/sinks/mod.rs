//! Sample sinks used by the command-line host

mod meter;
mod pacing;
mod wav_file;

pub use meter::{MeterSink, Peaks};
pub use pacing::PacedSink;
pub use wav_file::WavFileSink;

use soul_wav_stream::{SampleFrame, SampleSink};

/// Final destination of decoded frames
pub enum Output {
    /// Write a WAV file
    File(WavFileSink),
    /// Accept and drop every frame
    Discard,
}

impl SampleSink for Output {
    fn set_rate(&mut self, hz: u32) -> bool {
        match self {
            Self::File(sink) => sink.set_rate(hz),
            Self::Discard => true,
        }
    }

    fn set_bits_per_sample(&mut self, bits: u16) -> bool {
        match self {
            Self::File(sink) => sink.set_bits_per_sample(bits),
            Self::Discard => true,
        }
    }

    fn set_channels(&mut self, channels: u16) -> bool {
        match self {
            Self::File(sink) => sink.set_channels(channels),
            Self::Discard => true,
        }
    }

    fn begin(&mut self) -> bool {
        match self {
            Self::File(sink) => sink.begin(),
            Self::Discard => true,
        }
    }

    fn consume_frame(&mut self, frame: SampleFrame) -> bool {
        match self {
            Self::File(sink) => sink.consume_frame(frame),
            Self::Discard => true,
        }
    }
}
