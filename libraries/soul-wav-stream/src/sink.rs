//! Sample sink trait
//!
//! Abstracts the audio output (I2S DAC, desktop device, file writer, ...).

use crate::types::SampleFrame;

/// Receiver of decoded frames
///
/// Negotiation methods are called once per stream, in order, before the first
/// frame: `set_rate`, `set_bits_per_sample`, `set_channels`, `begin`. Any of
/// them may return false to refuse the stream.
pub trait SampleSink {
    fn set_rate(&mut self, hz: u32) -> bool;

    fn set_bits_per_sample(&mut self, bits: u16) -> bool;

    fn set_channels(&mut self, channels: u16) -> bool;

    /// Final negotiation step; allocate output resources here
    fn begin(&mut self) -> bool;

    /// Offer one frame
    ///
    /// # Returns
    /// * `true` - Frame accepted
    /// * `false` - Sink is full; the same frame is offered again later
    ///
    /// Must not block.
    fn consume_frame(&mut self, frame: SampleFrame) -> bool;
}

/// Accepts any format and keeps every frame
impl SampleSink for Vec<SampleFrame> {
    fn set_rate(&mut self, _hz: u32) -> bool {
        true
    }

    fn set_bits_per_sample(&mut self, _bits: u16) -> bool {
        true
    }

    fn set_channels(&mut self, _channels: u16) -> bool {
        true
    }

    fn begin(&mut self) -> bool {
        true
    }

    fn consume_frame(&mut self, frame: SampleFrame) -> bool {
        self.push(frame);
        true
    }
}
