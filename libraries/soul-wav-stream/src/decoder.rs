//! Buffered PCM frame decoding
//!
//! Pulls bytes through a small fixed-size read-ahead buffer and assembles one
//! frame at a time. The buffer is refilled only when fully drained, with a
//! single source read of up to its capacity.

use crate::error::Result;
use crate::source::ByteSource;
use crate::types::{BitDepth, ChannelLayout, SampleFrame, StopReason, StreamFormat};
use tracing::{trace, warn};

/// Fixed-capacity read-ahead region
///
/// Invariant: `read_pos <= write_len <= capacity`.
#[derive(Debug)]
pub struct ReadBuffer {
    data: Box<[u8]>,
    read_pos: usize,
    write_len: usize,
}

impl ReadBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity.max(1)].into_boxed_slice(),
            read_pos: 0,
            write_len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Unread bytes currently held
    pub fn available(&self) -> usize {
        self.write_len - self.read_pos
    }

    pub fn is_drained(&self) -> bool {
        self.read_pos == self.write_len
    }

    /// Replace the contents with one source read of up to `limit` bytes
    ///
    /// Returns the bytes read; 0 means the source is exhausted.
    pub fn refill<S: ByteSource + ?Sized>(&mut self, source: &mut S, limit: usize) -> Result<usize> {
        let want = limit.min(self.data.len());
        self.read_pos = 0;
        self.write_len = 0;
        let n = source.read(&mut self.data[..want])?;
        self.write_len = n.min(want);
        Ok(self.write_len)
    }

    pub fn pop(&mut self) -> Option<u8> {
        if self.is_drained() {
            return None;
        }
        let byte = self.data[self.read_pos];
        self.read_pos += 1;
        Some(byte)
    }
}

/// Decoding ended; carries the reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhausted(pub StopReason);

/// Frame decoder over the data region of a WAV stream
///
/// Owns the source and the read-ahead buffer for the duration of a run.
pub struct BufferedFrameDecoder<S: ByteSource> {
    source: S,
    buffer: ReadBuffer,
    format: StreamFormat,

    /// Data bytes left when bounded to the declared chunk length
    remaining: Option<u64>,

    /// Why bytes stopped flowing, once they have
    source_end: Option<StopReason>,

    /// Latched terminal reason returned by every later call
    finished: Option<StopReason>,

    frames: u64,
    bytes: u64,
}

impl<S: ByteSource> BufferedFrameDecoder<S> {
    /// Create a decoder positioned at the first PCM byte of `source`
    pub fn new(source: S, format: StreamFormat, capacity: usize) -> Self {
        Self {
            source,
            buffer: ReadBuffer::new(capacity),
            format,
            remaining: None,
            source_end: None,
            finished: None,
            frames: 0,
            bytes: 0,
        }
    }

    /// Stop after the `data_len` bytes declared by the data chunk
    pub fn bounded_to_data_chunk(mut self) -> Self {
        self.remaining = Some(u64::from(self.format.data_len));
        self
    }

    pub fn format(&self) -> &StreamFormat {
        &self.format
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn frames_decoded(&self) -> u64 {
        self.frames
    }

    /// PCM bytes consumed from the buffer
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes
    }

    /// Close the source and hand it back
    pub fn into_source(mut self) -> (S, Result<()>) {
        let closed = self.source.close();
        (self.source, closed)
    }

    /// Decode the next frame
    ///
    /// A frame is returned whole or not at all. Once exhausted, every later
    /// call returns the same reason without touching the source.
    pub fn next_frame(&mut self) -> std::result::Result<SampleFrame, Exhausted> {
        if let Some(reason) = self.finished {
            return Err(Exhausted(reason));
        }

        let mut taken = 0;
        let left = self.next_sample(&mut taken)?;
        let right = match self.format.channels {
            ChannelLayout::Mono => 0,
            ChannelLayout::Stereo => self.next_sample(&mut taken)?,
        };

        self.frames += 1;
        Ok(SampleFrame::new(left, right))
    }

    fn next_sample(&mut self, taken: &mut usize) -> std::result::Result<i32, Exhausted> {
        match self.format.bits_per_sample {
            BitDepth::Eight => Ok(i32::from(self.take(taken)?)),
            BitDepth::Sixteen => {
                let lo = self.take(taken)?;
                let hi = self.take(taken)?;
                Ok(i32::from(i16::from_le_bytes([lo, hi])))
            }
        }
    }

    /// One byte of the current frame; latches the terminal reason on failure
    fn take(&mut self, taken: &mut usize) -> std::result::Result<u8, Exhausted> {
        if let Some(byte) = self.next_byte() {
            *taken += 1;
            return Ok(byte);
        }

        let reason = if *taken > 0 {
            StopReason::TruncatedFrame { bytes: *taken }
        } else {
            self.source_end.unwrap_or(StopReason::EndOfStream)
        };
        self.finished = Some(reason);
        Err(Exhausted(reason))
    }

    /// Next data byte, refilling the buffer when drained
    pub fn next_byte(&mut self) -> Option<u8> {
        if self.source_end.is_some() {
            return None;
        }
        if self.remaining == Some(0) {
            self.source_end = Some(StopReason::DataComplete);
            return None;
        }

        if self.buffer.is_drained() {
            let limit = match self.remaining {
                Some(left) => usize::try_from(left).unwrap_or(usize::MAX),
                None => usize::MAX,
            };
            match self.buffer.refill(&mut self.source, limit) {
                Ok(0) => {
                    trace!(bytes = self.bytes, "Source exhausted");
                    self.source_end = Some(StopReason::EndOfStream);
                    return None;
                }
                Ok(n) => trace!(n, "Refilled read buffer"),
                Err(e) => {
                    warn!(error = %e, "Source read failed, ending stream");
                    self.source_end = Some(StopReason::EndOfStream);
                    return None;
                }
            }
        }

        let byte = self.buffer.pop()?;
        self.bytes += 1;
        if let Some(left) = self.remaining.as_mut() {
            *left -= 1;
        }
        Some(byte)
    }
}
