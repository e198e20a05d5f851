//! RIFF/WAVE container parsing
//!
//! Walks the RIFF header and sub-chunks strictly forward until the `fmt ` and
//! `data` chunks are found. The source is left positioned at the first PCM
//! byte.

use crate::error::{Result, StreamError};
use crate::source::ByteSource;
use crate::types::{BitDepth, ChannelLayout, StreamFormat};
use tracing::debug;

const RIFF: [u8; 4] = *b"RIFF";
const WAVE: [u8; 4] = *b"WAVE";
const FMT: [u8; 4] = *b"fmt ";
const DATA: [u8; 4] = *b"data";

/// `fmt ` chunk size for plain PCM (no extension block)
const PCM_FMT_SIZE: u32 = 16;
const WAVE_FORMAT_PCM: u16 = 1;

/// Scratch size for discarding chunks on non-seekable sources
const DISCARD_CHUNK: usize = 64;

/// Header reader over a byte source
pub struct ChunkReader<'a, S: ByteSource + ?Sized> {
    source: &'a mut S,
}

impl<'a, S: ByteSource + ?Sized> ChunkReader<'a, S> {
    pub fn new(source: &'a mut S) -> Self {
        Self { source }
    }

    /// Validate the container and return the stream format
    ///
    /// # Errors
    /// * `MalformedContainer` - bad magic, non-PCM format, unsupported
    ///   channels/bit depth, zero sample rate, duplicate `fmt ` or `data`
    ///   before `fmt `
    /// * `TruncatedStream` - source ended inside the header
    pub fn parse(mut self) -> Result<StreamFormat> {
        let magic = self.read_tag()?;
        if magic != RIFF {
            return Err(StreamError::malformed(format!(
                "expected RIFF magic, found {}",
                tag_name(&magic)
            )));
        }
        // RIFF size is unreliable on streams
        self.read_u32()?;
        let form = self.read_tag()?;
        if form != WAVE {
            return Err(StreamError::malformed(format!(
                "expected WAVE form, found {}",
                tag_name(&form)
            )));
        }

        let mut fmt: Option<(u32, BitDepth, ChannelLayout)> = None;

        loop {
            let id = self.read_tag()?;
            let size = self.read_u32()?;

            match id {
                FMT => {
                    if fmt.is_some() {
                        return Err(StreamError::malformed("duplicate fmt chunk"));
                    }
                    fmt = Some(self.read_fmt(size)?);
                }
                DATA => {
                    let Some((sample_rate, bits_per_sample, channels)) = fmt else {
                        return Err(StreamError::malformed("data chunk before fmt chunk"));
                    };
                    if !self.source.is_open() {
                        return Err(StreamError::SourceNotOpen);
                    }

                    let format = StreamFormat {
                        sample_rate,
                        bits_per_sample,
                        channels,
                        data_len: size,
                        data_offset: self.source.position(),
                    };
                    debug!(
                        sample_rate,
                        bits = bits_per_sample.bits(),
                        channels = channels.count(),
                        data_len = size,
                        data_offset = format.data_offset,
                        "Located data chunk"
                    );
                    return Ok(format);
                }
                other => {
                    debug!(id = %tag_name(&other), size, "Skipping chunk");
                    self.skip(size)?;
                }
            }
        }
    }

    fn read_fmt(&mut self, size: u32) -> Result<(u32, BitDepth, ChannelLayout)> {
        if size != PCM_FMT_SIZE {
            return Err(StreamError::malformed(format!(
                "fmt chunk size {}, expected {}",
                size, PCM_FMT_SIZE
            )));
        }

        let audio_format = self.read_u16()?;
        if audio_format != WAVE_FORMAT_PCM {
            return Err(StreamError::malformed(format!(
                "audio format {} is not PCM",
                audio_format
            )));
        }

        let channel_count = self.read_u16()?;
        let channels = ChannelLayout::from_count(channel_count).ok_or_else(|| {
            StreamError::malformed(format!("unsupported channel count {}", channel_count))
        })?;

        let sample_rate = self.read_u32()?;
        if sample_rate == 0 {
            return Err(StreamError::malformed("sample rate is zero"));
        }

        // Byte rate and block align are derivable; ignored
        self.read_u32()?;
        self.read_u16()?;

        let bits = self.read_u16()?;
        let bits_per_sample = BitDepth::from_bits(bits).ok_or_else(|| {
            StreamError::malformed(format!("unsupported bits per sample {}", bits))
        })?;

        Ok((sample_rate, bits_per_sample, channels))
    }

    /// Fill `buf` completely, looping over short reads
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut got = 0;
        while got < buf.len() {
            let n = self.source.read(&mut buf[got..])?;
            if n == 0 {
                return Err(StreamError::TruncatedStream {
                    expected: buf.len(),
                    got,
                });
            }
            got += n;
        }
        Ok(())
    }

    fn read_tag(&mut self) -> Result<[u8; 4]> {
        let mut tag = [0u8; 4];
        self.read_exact(&mut tag)?;
        Ok(tag)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        self.read_exact(&mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_u16(&mut self) -> Result<u16> {
        let mut bytes = [0u8; 2];
        self.read_exact(&mut bytes)?;
        Ok(u16::from_le_bytes(bytes))
    }

    /// Skip `count` bytes, discarding them if the source cannot seek
    fn skip(&mut self, count: u32) -> Result<()> {
        match self.source.seek_forward(count) {
            Err(StreamError::SeekUnsupported) => self.discard(count),
            other => other,
        }
    }

    fn discard(&mut self, count: u32) -> Result<()> {
        let total = count as usize;
        let mut scratch = [0u8; DISCARD_CHUNK];
        let mut left = total;
        while left > 0 {
            let want = left.min(DISCARD_CHUNK);
            let n = self.source.read(&mut scratch[..want])?;
            if n == 0 {
                return Err(StreamError::TruncatedStream {
                    expected: total,
                    got: total - left,
                });
            }
            left -= n;
        }
        Ok(())
    }
}

/// Printable form of a chunk id
fn tag_name(id: &[u8; 4]) -> String {
    id.escape_ascii().to_string()
}
