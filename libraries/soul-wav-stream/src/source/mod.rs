//! Byte source trait and implementations
//!
//! A `ByteSource` is a forward-only byte provider. The decoder never seeks
//! backward and never assumes a read returns the full amount requested.

mod file;
#[cfg(feature = "http")]
mod http;
mod memory;

pub use file::FileSource;
#[cfg(feature = "http")]
pub use http::HttpStreamSource;
pub use memory::MemorySource;

use crate::error::Result;

/// Sequential, forward-only byte provider
///
/// Implementors wrap a transport (file handle, HTTP body, in-memory buffer).
pub trait ByteSource: Send {
    /// Open the resource named by `locator` (path, URL, ...)
    fn open(&mut self, locator: &str) -> Result<()>;

    /// Read up to `buf.len()` bytes
    ///
    /// # Returns
    /// * `Ok(0)` - No more data, now or ever
    /// * `Ok(n)` - `n` bytes were written to the start of `buf`
    ///
    /// May wait for a live transport to deliver data, but must return promptly
    /// once any data is available and must return 0 once disconnected.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Skip `count` bytes forward
    ///
    /// Returns `StreamError::SeekUnsupported` if the transport cannot skip;
    /// callers then fall back to reading and discarding.
    fn seek_forward(&mut self, count: u32) -> Result<()>;

    fn is_open(&self) -> bool;

    /// Release the underlying transport
    fn close(&mut self) -> Result<()>;

    /// Bytes consumed so far
    fn position(&self) -> u32;

    /// Total size if the transport knows it
    fn size(&self) -> Option<u32> {
        None
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn open(&mut self, locator: &str) -> Result<()> {
        (**self).open(locator)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn seek_forward(&mut self, count: u32) -> Result<()> {
        (**self).seek_forward(count)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn position(&self) -> u32 {
        (**self).position()
    }

    fn size(&self) -> Option<u32> {
        (**self).size()
    }
}
