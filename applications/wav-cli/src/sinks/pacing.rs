//! Wall-clock pacing to emulate a real-time output device

use soul_wav_stream::{SampleFrame, SampleSink};
use std::time::{Duration, Instant};

/// Declines frames that would run ahead of the stream's sample rate
///
/// Behaves like a device with a fixed-size output buffer: up to `lead` of
/// audio is accepted immediately, after which frames are taken only as fast
/// as they would be played.
pub struct PacedSink<S> {
    inner: S,
    rate: u32,
    lead: Duration,
    started: Option<Instant>,
    accepted: u64,
}

impl<S: SampleSink> PacedSink<S> {
    pub fn new(inner: S, lead: Duration) -> Self {
        Self {
            inner,
            rate: 0,
            lead,
            started: None,
            accepted: 0,
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Frames the device could have taken by now
    fn allowance(&self, now: Instant) -> u64 {
        let played = self
            .started
            .map(|start| now.duration_since(start))
            .unwrap_or(Duration::ZERO);
        ((played + self.lead).as_secs_f64() * f64::from(self.rate)) as u64
    }
}

impl<S: SampleSink> SampleSink for PacedSink<S> {
    fn set_rate(&mut self, hz: u32) -> bool {
        self.rate = hz;
        self.inner.set_rate(hz)
    }

    fn set_bits_per_sample(&mut self, bits: u16) -> bool {
        self.inner.set_bits_per_sample(bits)
    }

    fn set_channels(&mut self, channels: u16) -> bool {
        self.inner.set_channels(channels)
    }

    fn begin(&mut self) -> bool {
        self.started = None;
        self.accepted = 0;
        self.inner.begin()
    }

    fn consume_frame(&mut self, frame: SampleFrame) -> bool {
        let now = Instant::now();
        self.started.get_or_insert(now);
        if self.accepted >= self.allowance(now) {
            return false;
        }
        if !self.inner.consume_frame(frame) {
            return false;
        }
        self.accepted += 1;
        true
    }
}
