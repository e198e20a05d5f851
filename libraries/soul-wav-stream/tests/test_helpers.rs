//! Test helpers for WAV stream integration tests
//!
//! Byte-level WAV builders (so malformed layouts can be produced) and a sink
//! that records negotiation calls and frames.

#![allow(dead_code)]

use soul_wav_stream::{ByteSource, MemorySource, Result, SampleFrame, SampleSink};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Builds RIFF/WAVE byte streams chunk by chunk
#[derive(Debug, Clone, Default)]
pub struct WavBuilder {
    chunks: Vec<u8>,
}

impl WavBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a canonical 16-byte PCM `fmt ` chunk
    pub fn fmt(mut self, channels: u16, sample_rate: u32, bits: u16) -> Self {
        let block_align = channels * bits / 8;
        let mut body = Vec::with_capacity(16);
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&channels.to_le_bytes());
        body.extend_from_slice(&sample_rate.to_le_bytes());
        body.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
        body.extend_from_slice(&block_align.to_le_bytes());
        body.extend_from_slice(&bits.to_le_bytes());
        self.chunk(b"fmt ", &body)
    }

    /// Append any chunk with a correct size field
    pub fn chunk(mut self, id: &[u8; 4], body: &[u8]) -> Self {
        self.chunks.extend_from_slice(id);
        self.chunks
            .extend_from_slice(&(body.len() as u32).to_le_bytes());
        self.chunks.extend_from_slice(body);
        self
    }

    pub fn data(self, pcm: &[u8]) -> Self {
        self.chunk(b"data", pcm)
    }

    /// Append raw bytes without a chunk header
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.chunks.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12 + self.chunks.len());
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(4 + self.chunks.len() as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(&self.chunks);
        out
    }
}

/// Canonical single-data-chunk stream
pub fn simple_wav(channels: u16, sample_rate: u32, bits: u16, pcm: &[u8]) -> Vec<u8> {
    WavBuilder::new()
        .fmt(channels, sample_rate, bits)
        .data(pcm)
        .build()
}

/// Little-endian bytes of 16-bit samples
pub fn pcm16(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Negotiation call observed by `RecordingSink`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkCall {
    Rate(u32),
    Bits(u16),
    Channels(u16),
    Begin,
}

/// Sink that records everything and can refuse on demand
#[derive(Debug)]
pub struct RecordingSink {
    pub calls: Vec<SinkCall>,
    pub frames: Vec<SampleFrame>,

    /// Every frame offer, accepted or not
    pub offers: Vec<SampleFrame>,

    /// Frames to accept before refusing (None = unlimited)
    pub budget: Option<usize>,

    pub max_rate: u32,
    pub accept_bits: Vec<u16>,
    pub accept_channels: Vec<u16>,
    pub begin_ok: bool,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            frames: Vec::new(),
            offers: Vec::new(),
            budget: None,
            max_rate: u32::MAX,
            accept_bits: vec![8, 16],
            accept_channels: vec![1, 2],
            begin_ok: true,
        }
    }
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `n` frames, then refuse until `grant` is called
    pub fn with_budget(n: usize) -> Self {
        Self {
            budget: Some(n),
            ..Self::default()
        }
    }

    pub fn grant(&mut self, n: usize) {
        self.budget = Some(self.budget.unwrap_or(0) + n);
    }
}

impl SampleSink for RecordingSink {
    fn set_rate(&mut self, hz: u32) -> bool {
        self.calls.push(SinkCall::Rate(hz));
        hz <= self.max_rate
    }

    fn set_bits_per_sample(&mut self, bits: u16) -> bool {
        self.calls.push(SinkCall::Bits(bits));
        self.accept_bits.contains(&bits)
    }

    fn set_channels(&mut self, channels: u16) -> bool {
        self.calls.push(SinkCall::Channels(channels));
        self.accept_channels.contains(&channels)
    }

    fn begin(&mut self) -> bool {
        self.calls.push(SinkCall::Begin);
        self.begin_ok
    }

    fn consume_frame(&mut self, frame: SampleFrame) -> bool {
        self.offers.push(frame);
        match self.budget.as_mut() {
            Some(0) => false,
            Some(left) => {
                *left -= 1;
                self.frames.push(frame);
                true
            }
            None => {
                self.frames.push(frame);
                true
            }
        }
    }
}

/// `MemorySource` that counts `close` calls in a shared counter
pub struct CloseCountingSource {
    inner: MemorySource,
    closes: Arc<AtomicUsize>,
}

impl CloseCountingSource {
    /// Returns the source and a handle to its close counter
    pub fn new(data: Vec<u8>) -> (Self, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        let source = Self {
            inner: MemorySource::new(data),
            closes: Arc::clone(&closes),
        };
        (source, closes)
    }
}

impl ByteSource for CloseCountingSource {
    fn open(&mut self, locator: &str) -> Result<()> {
        self.inner.open(locator)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner.read(buf)
    }

    fn seek_forward(&mut self, count: u32) -> Result<()> {
        self.inner.seek_forward(count)
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close()
    }

    fn position(&self) -> u32 {
        self.inner.position()
    }
}
