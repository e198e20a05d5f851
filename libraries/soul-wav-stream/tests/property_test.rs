//! Property-based tests for the stream engine
//!
//! Uses proptest to check that delivery is exact and ordered regardless of
//! read sizes, buffer capacity and sink acceptance patterns.

mod test_helpers;

use proptest::prelude::*;
use soul_wav_stream::{
    EngineConfig, MemorySource, SampleFrame, SampleSink, StopReason, StreamEngine,
};
use test_helpers::*;

// ===== Helpers =====

/// Frames a correct decoder must produce for whole-frame `pcm`
fn reference_frames(channels: u16, bits: u16, pcm: &[u8]) -> Vec<SampleFrame> {
    let sample = |b: &[u8]| -> i32 {
        if bits == 8 {
            i32::from(b[0])
        } else {
            i32::from(i16::from_le_bytes([b[0], b[1]]))
        }
    };
    let width = usize::from(bits / 8);
    let frame = width * usize::from(channels);

    pcm.chunks_exact(frame)
        .map(|f| {
            let left = sample(&f[..width]);
            let right = if channels == 2 { sample(&f[width..]) } else { 0 };
            SampleFrame::new(left, right)
        })
        .collect()
}

fn arbitrary_layout() -> impl Strategy<Value = (u16, u16)> {
    (prop_oneof![Just(1u16), Just(2u16)], prop_oneof![Just(8u16), Just(16u16)])
}

/// Accepts or declines according to a repeating pattern
struct PatternSink {
    pattern: Vec<bool>,
    offer: usize,
    frames: Vec<SampleFrame>,
}

impl SampleSink for PatternSink {
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
        let accept = self.pattern[self.offer % self.pattern.len()];
        self.offer += 1;
        if accept {
            self.frames.push(frame);
        }
        accept
    }
}

// ===== Property Tests =====

proptest! {
    /// Property: Read sizes and buffer capacity never change the decoded frames
    #[test]
    fn delivery_independent_of_read_sizes(
        (channels, bits) in arbitrary_layout(),
        frame_count in 0usize..300,
        seed in any::<u8>(),
        read_limit in 1usize..64,
        capacity in 1usize..200,
    ) {
        let frame_bytes = usize::from(channels) * usize::from(bits / 8);
        let pcm: Vec<u8> = (0..frame_count * frame_bytes)
            .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
            .collect();
        let wav = simple_wav(channels, 44100, bits, &pcm);

        let mut sink = RecordingSink::new();
        {
            let mut engine = StreamEngine::new(EngineConfig::default().with_buffer_capacity(capacity));
            engine
                .begin(MemorySource::new(wav).with_read_limit(read_limit), &mut sink)
                .unwrap();
            while engine.is_running() {
                engine.advance();
            }
            prop_assert_eq!(engine.stop_reason(), Some(StopReason::EndOfStream));
            prop_assert_eq!(engine.frames_delivered(), frame_count as u64);
        }

        prop_assert_eq!(sink.frames, reference_frames(channels, bits, &pcm));
    }

    /// Property: Every frame reaches the sink exactly once, in order, whatever it declines
    #[test]
    fn declined_frames_are_never_lost_or_duplicated(
        (channels, bits) in arbitrary_layout(),
        pcm in prop::collection::vec(any::<u8>(), 0..400),
        mut pattern in prop::collection::vec(any::<bool>(), 1..12),
        capacity in 1usize..64,
    ) {
        // At least one acceptance per cycle so the stream can finish
        pattern[0] = true;

        let mut sink = PatternSink { pattern, offer: 0, frames: Vec::new() };
        {
            let mut engine = StreamEngine::new(EngineConfig::default().with_buffer_capacity(capacity));
            engine
                .begin(MemorySource::new(simple_wav(channels, 8000, bits, &pcm)), &mut sink)
                .unwrap();

            let mut ticks = 0;
            while engine.is_running() {
                ticks += 1;
                prop_assert!(ticks <= 20 * (pcm.len() + 1), "engine made no progress");
                engine.advance();
            }
        }

        prop_assert_eq!(sink.frames, reference_frames(channels, bits, &pcm));
    }

    /// Property: A per-tick budget bounds every step and still delivers everything
    #[test]
    fn frame_budget_bounds_each_tick(
        budget in 1usize..16,
        pcm in prop::collection::vec(any::<u8>(), 0..200),
    ) {
        let config = EngineConfig { frames_per_tick: Some(budget), ..EngineConfig::default() };
        let mut sink = RecordingSink::new();
        {
            let mut engine = StreamEngine::new(config);
            engine
                .begin(MemorySource::new(simple_wav(1, 8000, 8, &pcm)), &mut sink)
                .unwrap();
            while engine.is_running() {
                let step = engine.advance();
                prop_assert!(step.delivered() <= budget);
            }
        }
        prop_assert_eq!(sink.frames.len(), pcm.len());
    }

    /// Property: Arbitrary bytes after the RIFF magic never panic
    #[test]
    fn arbitrary_input_never_panics(
        body in prop::collection::vec(any::<u8>(), 0..256),
        seekable in any::<bool>(),
    ) {
        let mut wav = b"RIFF\xff\xff\xff\xffWAVE".to_vec();
        wav.extend_from_slice(&body);

        let mut source = MemorySource::new(wav);
        if !seekable {
            source = source.non_seekable();
        }

        let mut sink = RecordingSink::new();
        let mut engine = StreamEngine::default();
        if engine.begin(source, &mut sink).is_ok() {
            while engine.is_running() {
                engine.advance();
            }
        }
        prop_assert!(!engine.is_running());
    }
}
