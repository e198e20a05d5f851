//! In-memory byte source

use super::ByteSource;
use crate::error::{Result, StreamError};

/// Byte source over an owned buffer
///
/// Can cap the bytes returned per read and disable seeking, which makes it
/// behave like a slow, non-seekable network transport.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<u8>,
    pos: usize,
    open: bool,
    read_limit: Option<usize>,
    seekable: bool,
    reads: usize,
}

impl MemorySource {
    /// Create an open source over `data`
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            open: true,
            read_limit: None,
            seekable: true,
            reads: 0,
        }
    }

    /// Return at most `limit` bytes per `read` call
    pub fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = Some(limit.max(1));
        self
    }

    /// Make `seek_forward` fail with `SeekUnsupported`
    pub fn non_seekable(mut self) -> Self {
        self.seekable = false;
        self
    }

    /// Number of `read` calls served so far
    pub fn read_calls(&self) -> usize {
        self.reads
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl ByteSource for MemorySource {
    fn open(&mut self, _locator: &str) -> Result<()> {
        self.pos = 0;
        self.open = true;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.open {
            return Ok(0);
        }
        self.reads += 1;

        let mut n = buf.len().min(self.remaining());
        if let Some(limit) = self.read_limit {
            n = n.min(limit);
        }
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn seek_forward(&mut self, count: u32) -> Result<()> {
        if !self.seekable {
            return Err(StreamError::SeekUnsupported);
        }
        if !self.open {
            return Err(StreamError::SourceNotOpen);
        }
        self.pos = (self.pos + count as usize).min(self.data.len());
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn position(&self) -> u32 {
        self.pos as u32
    }

    fn size(&self) -> Option<u32> {
        u32::try_from(self.data.len()).ok()
    }
}
