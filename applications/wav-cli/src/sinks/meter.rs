//! Frame counting and peak metering

use soul_wav_stream::{SampleFrame, SampleSink};

/// Peak amplitude per channel, relative to the format's full scale
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Peaks {
    pub left: f32,
    pub right: f32,
}

/// Forwards frames to `inner` and meters the ones it accepts
pub struct MeterSink<S> {
    inner: S,
    bits: u16,
    stereo: bool,
    frames: u64,
    peak_left: i32,
    peak_right: i32,
}

impl<S: SampleSink> MeterSink<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            bits: 16,
            stereo: true,
            frames: 0,
            peak_left: 0,
            peak_right: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn peaks(&self) -> Peaks {
        let full_scale = if self.bits == 8 { 128.0 } else { 32768.0 };
        Peaks {
            left: self.peak_left as f32 / full_scale,
            right: self.peak_right as f32 / full_scale,
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Distance from silence (8-bit samples are centred on 128)
    fn amplitude(&self, sample: i32) -> i32 {
        if self.bits == 8 {
            (sample - 128).abs()
        } else {
            sample.abs()
        }
    }
}

impl<S: SampleSink> SampleSink for MeterSink<S> {
    fn set_rate(&mut self, hz: u32) -> bool {
        self.inner.set_rate(hz)
    }

    fn set_bits_per_sample(&mut self, bits: u16) -> bool {
        self.bits = bits;
        self.inner.set_bits_per_sample(bits)
    }

    fn set_channels(&mut self, channels: u16) -> bool {
        self.stereo = channels == 2;
        self.inner.set_channels(channels)
    }

    fn begin(&mut self) -> bool {
        self.frames = 0;
        self.peak_left = 0;
        self.peak_right = 0;
        self.inner.begin()
    }

    fn consume_frame(&mut self, frame: SampleFrame) -> bool {
        if !self.inner.consume_frame(frame) {
            return false;
        }
        self.frames += 1;
        self.peak_left = self.peak_left.max(self.amplitude(frame.left));
        if self.stereo {
            self.peak_right = self.peak_right.max(self.amplitude(frame.right));
        }
        true
    }
}
