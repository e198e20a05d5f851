//! Stream engine: header negotiation and the cooperative decode loop
//!
//! The engine owns the byte source and read buffer while running and borrows
//! the sink. The host calls `advance` repeatedly; each call delivers as many
//! frames as the sink accepts and returns without blocking.

use crate::chunk::ChunkReader;
use crate::config::EngineConfig;
use crate::decoder::{BufferedFrameDecoder, Exhausted};
use crate::error::{Result, SinkSetting, StreamError};
use crate::sink::SampleSink;
use crate::source::ByteSource;
use crate::types::{EngineState, SampleFrame, Step, StopReason, StreamFormat};
use std::time::Duration;
use tracing::{debug, info, warn};

type Decoder = BufferedFrameDecoder<Box<dyn ByteSource>>;

/// Incremental WAV decoder feeding a sample sink
///
/// # Example
///
/// ```rust
/// use soul_wav_stream::{EngineConfig, MemorySource, SampleFrame, StreamEngine};
///
/// let mut wav = b"RIFF\x26\x00\x00\x00WAVEfmt \x10\x00\x00\x00".to_vec();
/// wav.extend_from_slice(&[1, 0, 1, 0, 0x40, 0x1F, 0, 0, 0x40, 0x1F, 0, 0, 1, 0, 8, 0]);
/// wav.extend_from_slice(b"data\x02\x00\x00\x00\x10\x20");
///
/// let mut frames: Vec<SampleFrame> = Vec::new();
/// let mut engine = StreamEngine::new(EngineConfig::default());
/// engine.begin(MemorySource::new(wav), &mut frames).unwrap();
/// while engine.is_running() {
///     engine.advance();
/// }
///
/// assert_eq!(frames, vec![SampleFrame::new(0x10, 0), SampleFrame::new(0x20, 0)]);
/// ```
pub struct StreamEngine<'s> {
    config: EngineConfig,
    state: EngineState,

    /// Source and read buffer (Some only while running)
    decoder: Option<Decoder>,

    /// Borrowed output (Some only while running)
    sink: Option<&'s mut dyn SampleSink>,

    format: Option<StreamFormat>,

    /// Frame the sink declined last time
    pending: Option<SampleFrame>,

    delivered: u64,
    stop_reason: Option<StopReason>,
}

impl<'s> StreamEngine<'s> {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: EngineState::Idle,
            decoder: None,
            sink: None,
            format: None,
            pending: None,
            delivered: 0,
            stop_reason: None,
        }
    }

    /// Parse the container on `source` and negotiate the format with `sink`
    ///
    /// On success the engine is running and owns `source`. On failure the
    /// source is closed and the engine is stopped with nothing allocated.
    /// Calling `begin` on a running engine stops the current stream first.
    ///
    /// # Errors
    /// * `SourceNotOpen` - `source` is not open
    /// * `MalformedContainer` / `TruncatedStream` - header is invalid
    /// * `SinkRejected` - the sink refused the format or failed to begin
    /// * `Config` - the engine configuration is invalid
    pub fn begin<S>(&mut self, source: S, sink: &'s mut dyn SampleSink) -> Result<StreamFormat>
    where
        S: ByteSource + 'static,
    {
        if matches!(self.state, EngineState::Parsing | EngineState::Running) {
            debug!("begin() on active engine, stopping current stream");
            self.stop();
        }
        self.reset_run();

        let mut source: Box<dyn ByteSource> = Box::new(source);
        if !source.is_open() {
            self.state = EngineState::Stopped;
            return Err(StreamError::SourceNotOpen);
        }

        self.state = EngineState::Parsing;
        let negotiated = self
            .config
            .validate()
            .and_then(|()| Self::negotiate(source.as_mut(), &mut *sink));

        let format = match negotiated {
            Ok(format) => format,
            Err(e) => {
                debug!(error = %e, "Stream setup failed");
                if let Err(close_err) = source.close() {
                    warn!(error = %close_err, "Failed to close source");
                }
                self.state = EngineState::Stopped;
                return Err(e);
            }
        };

        let mut decoder = BufferedFrameDecoder::new(source, format, self.config.buffer_capacity);
        if self.config.bound_to_data_chunk {
            decoder = decoder.bounded_to_data_chunk();
        }

        info!(
            sample_rate = format.sample_rate,
            bits = format.bits_per_sample.bits(),
            channels = format.channels.count(),
            buffer = self.config.buffer_capacity,
            "WAV stream started"
        );

        self.decoder = Some(decoder);
        self.sink = Some(sink);
        self.format = Some(format);
        self.state = EngineState::Running;
        Ok(format)
    }

    fn negotiate(source: &mut dyn ByteSource, sink: &mut dyn SampleSink) -> Result<StreamFormat> {
        let format = ChunkReader::new(source).parse()?;

        let bits = format.bits_per_sample.bits();
        let channels = format.channels.count();
        if !sink.set_rate(format.sample_rate) {
            return Err(StreamError::SinkRejected(SinkSetting::SampleRate(
                format.sample_rate,
            )));
        }
        if !sink.set_bits_per_sample(bits) {
            return Err(StreamError::SinkRejected(SinkSetting::BitsPerSample(bits)));
        }
        if !sink.set_channels(channels) {
            return Err(StreamError::SinkRejected(SinkSetting::Channels(channels)));
        }
        if !sink.begin() {
            return Err(StreamError::SinkRejected(SinkSetting::Begin));
        }
        Ok(format)
    }

    /// Deliver frames until the sink stalls or the stream ends
    ///
    /// A frame the sink declines is kept and offered first on the next call;
    /// no new bytes are read until it is accepted.
    pub fn advance(&mut self) -> Step {
        if self.state != EngineState::Running {
            return Step::Inactive;
        }
        let (Some(decoder), Some(sink)) = (self.decoder.as_mut(), self.sink.as_mut()) else {
            return Step::Inactive;
        };

        let mut delivered = 0;
        if let Some(frame) = self.pending {
            if !sink.consume_frame(frame) {
                return Step::Backpressure { delivered };
            }
            self.pending = None;
            delivered += 1;
        }

        loop {
            if self
                .config
                .frames_per_tick
                .is_some_and(|budget| delivered >= budget)
            {
                self.delivered += delivered as u64;
                return Step::Yielded { delivered };
            }

            match decoder.next_frame() {
                Ok(frame) => {
                    if !sink.consume_frame(frame) {
                        self.pending = Some(frame);
                        self.delivered += delivered as u64;
                        return Step::Backpressure { delivered };
                    }
                    delivered += 1;
                }
                Err(Exhausted(reason)) => {
                    self.delivered += delivered as u64;
                    self.finish(reason);
                    return Step::Finished { delivered, reason };
                }
            }
        }
    }

    /// Stop decoding and release the buffer and source
    ///
    /// Safe to call in any state and any number of times.
    pub fn stop(&mut self) {
        if self.state == EngineState::Stopped {
            return;
        }
        if self.state == EngineState::Running {
            debug!(frames = self.delivered, "WAV stream stopped");
            self.stop_reason = Some(StopReason::Stopped);
        }
        self.release();
        self.state = EngineState::Stopped;
    }

    fn finish(&mut self, reason: StopReason) {
        match reason {
            StopReason::TruncatedFrame { bytes } => {
                info!(frames = self.delivered, bytes, "WAV stream ended mid-frame")
            }
            _ => info!(frames = self.delivered, ?reason, "WAV stream finished"),
        }
        self.stop_reason = Some(reason);
        self.release();
        self.state = EngineState::Stopped;
    }

    fn release(&mut self) {
        if let Some(decoder) = self.decoder.take() {
            let (_source, closed) = decoder.into_source();
            if let Err(e) = closed {
                warn!(error = %e, "Failed to close source");
            }
        }
        self.sink = None;
        self.pending = None;
    }

    fn reset_run(&mut self) {
        self.format = None;
        self.pending = None;
        self.delivered = 0;
        self.stop_reason = None;
    }

    pub fn is_running(&self) -> bool {
        self.state == EngineState::Running
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Format of the current or last stream
    pub fn format(&self) -> Option<&StreamFormat> {
        self.format.as_ref()
    }

    /// Frames accepted by the sink in the current or last stream
    pub fn frames_delivered(&self) -> u64 {
        self.delivered
    }

    /// Playback time of the delivered frames
    pub fn elapsed(&self) -> Duration {
        self.format
            .map(|f| f.frames_to_duration(self.delivered))
            .unwrap_or(Duration::ZERO)
    }

    /// Why the last stream ended
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Whether a declined frame is waiting for the sink
    pub fn has_pending_frame(&self) -> bool {
        self.pending.is_some()
    }

    /// Bytes read from the source so far (None when not running)
    pub fn source_position(&self) -> Option<u32> {
        self.decoder.as_ref().map(|d| d.source().position())
    }
}

impl Default for StreamEngine<'_> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
