//! Writes decoded frames back out as a PCM WAV file

use hound::{SampleFormat, WavSpec, WavWriter};
use soul_wav_stream::{SampleFrame, SampleSink};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Sink that re-encodes frames with hound
///
/// The file is created in `begin`, once the format is known. Call `finalize`
/// after the stream ends to patch the header sizes.
pub struct WavFileSink {
    path: PathBuf,
    sample_rate: u32,
    bits: u16,
    channels: u16,
    writer: Option<WavWriter<BufWriter<File>>>,
    write_error: Option<hound::Error>,
}

impl WavFileSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sample_rate: 0,
            bits: 0,
            channels: 0,
            writer: None,
            write_error: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close the file, reporting the first write error if any
    pub fn finalize(mut self) -> Result<(), hound::Error> {
        if let Some(e) = self.write_error.take() {
            return Err(e);
        }
        match self.writer.take() {
            Some(writer) => writer.finalize(),
            None => Ok(()),
        }
    }

    fn write(&mut self, frame: SampleFrame) -> Result<(), hound::Error> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let mut samples = [frame.left, frame.right].into_iter().take(usize::from(self.channels));
        if self.bits == 8 {
            // hound takes signed 8-bit samples and stores them offset by 128
            samples.try_for_each(|s| writer.write_sample((s - 128) as i8))
        } else {
            samples.try_for_each(|s| writer.write_sample(s as i16))
        }
    }
}

impl SampleSink for WavFileSink {
    fn set_rate(&mut self, hz: u32) -> bool {
        self.sample_rate = hz;
        true
    }

    fn set_bits_per_sample(&mut self, bits: u16) -> bool {
        self.bits = bits;
        matches!(bits, 8 | 16)
    }

    fn set_channels(&mut self, channels: u16) -> bool {
        self.channels = channels;
        matches!(channels, 1 | 2)
    }

    fn begin(&mut self) -> bool {
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits,
            sample_format: SampleFormat::Int,
        };
        match WavWriter::create(&self.path, spec) {
            Ok(writer) => {
                debug!(path = %self.path.display(), "Writing WAV output");
                self.writer = Some(writer);
                self.write_error = None;
                true
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to create output file");
                false
            }
        }
    }

    fn consume_frame(&mut self, frame: SampleFrame) -> bool {
        if self.write_error.is_none() {
            if let Err(e) = self.write(frame) {
                error!(error = %e, "Failed to write output frame");
                self.write_error = Some(e);
            }
        }
        // A failed file must not stall the stream; the error surfaces in finalize
        true
    }
}
