//! Local file byte source

use super::ByteSource;
use crate::error::{Result, StreamError};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Byte source reading a local file
#[derive(Debug, Default)]
pub struct FileSource {
    file: Option<File>,
    pos: u32,
    size: Option<u32>,
}

impl FileSource {
    /// Create a closed source; call `open` with a path
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path` directly
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut source = Self::new();
        source.open_file(path.as_ref())?;
        Ok(source)
    }

    fn open_file(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path)
            .map_err(|e| StreamError::Open(format!("{}: {}", path.display(), e)))?;
        let len = file.metadata()?.len();

        debug!(path = %path.display(), bytes = len, "Opened file source");

        self.size = u32::try_from(len).ok();
        self.file = Some(file);
        self.pos = 0;
        Ok(())
    }
}

impl ByteSource for FileSource {
    fn open(&mut self, locator: &str) -> Result<()> {
        self.open_file(Path::new(locator))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let Some(file) = self.file.as_mut() else {
            return Ok(0);
        };
        let n = file.read(buf)?;
        self.pos = self.pos.saturating_add(n as u32);
        Ok(n)
    }

    fn seek_forward(&mut self, count: u32) -> Result<()> {
        let file = self.file.as_mut().ok_or(StreamError::SourceNotOpen)?;
        file.seek(SeekFrom::Current(i64::from(count)))?;
        self.pos = self.pos.saturating_add(count);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn close(&mut self) -> Result<()> {
        self.file = None;
        Ok(())
    }

    fn position(&self) -> u32 {
        self.pos
    }

    fn size(&self) -> Option<u32> {
        self.size
    }
}
