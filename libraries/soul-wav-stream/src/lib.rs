//! Soul Player - Streaming WAV Decoding
//!
//! Incremental PCM WAV decoding from a forward-only byte source into a
//! frame-at-a-time sample sink.
//!
//! This crate provides:
//! - RIFF/WAVE header parsing without buffering the file
//! - Buffered 8-bit unsigned / 16-bit signed, mono / stereo frame decoding
//! - A cooperative `StreamEngine` that paces output to the sink (backpressure)
//! - Byte sources for memory, local files and HTTP streams
//!
//! # Architecture
//!
//! `soul-wav-stream` has no audio device dependency. The host implements
//! `SampleSink` for its output (I2S DAC, desktop device, file writer) and
//! calls `StreamEngine::advance` from its own loop:
//!
//! ```rust,no_run
//! use soul_wav_stream::{EngineConfig, FileSource, SampleFrame, SampleSink, Step, StreamEngine};
//!
//! struct Dac;
//!
//! impl SampleSink for Dac {
//!     fn set_rate(&mut self, hz: u32) -> bool { hz <= 48_000 }
//!     fn set_bits_per_sample(&mut self, _bits: u16) -> bool { true }
//!     fn set_channels(&mut self, _channels: u16) -> bool { true }
//!     fn begin(&mut self) -> bool { true }
//!     fn consume_frame(&mut self, _frame: SampleFrame) -> bool {
//!         // Return false while the DMA queue is full
//!         true
//!     }
//! }
//!
//! # fn main() -> soul_wav_stream::Result<()> {
//! let mut dac = Dac;
//! let mut engine = StreamEngine::new(EngineConfig::default());
//! engine.begin(FileSource::open_path("/music/track.wav")?, &mut dac)?;
//!
//! loop {
//!     match engine.advance() {
//!         Step::Finished { .. } | Step::Inactive => break,
//!         // Sink is full: do other work, then come back
//!         Step::Backpressure { .. } | Step::Yielded { .. } => std::thread::yield_now(),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod chunk;
pub mod config;
mod decoder;
mod engine;
mod error;
pub mod sink;
pub mod source;
pub mod types;

// Public exports
pub use chunk::ChunkReader;
pub use config::{EngineConfig, HttpSourceConfig, StreamConfig};
pub use decoder::{BufferedFrameDecoder, Exhausted, ReadBuffer};
pub use engine::StreamEngine;
pub use error::{Result, SinkSetting, StreamError};
pub use sink::SampleSink;
#[cfg(feature = "http")]
pub use source::HttpStreamSource;
pub use source::{ByteSource, FileSource, MemorySource};
pub use types::{
    BitDepth, ChannelLayout, EngineState, SampleFrame, Step, StopReason, StreamFormat,
};
