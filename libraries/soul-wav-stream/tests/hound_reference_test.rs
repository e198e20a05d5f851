//! Cross-checks decoded frames against files written and read by hound

mod test_helpers;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use soul_wav_stream::{
    ByteSource, EngineConfig, FileSource, MemorySource, SampleFrame, StopReason, StreamEngine,
};
use std::io::Cursor;
use test_helpers::*;

fn spec(channels: u16, sample_rate: u32, bits: u16) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: bits,
        sample_format: SampleFormat::Int,
    }
}

/// Write interleaved 16-bit samples with hound
fn hound_wav_16(spec: WavSpec, samples: &[i16]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn hound_wav_8(spec: WavSpec, samples: &[i8]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn decode_all<S: ByteSource + 'static>(source: S, config: EngineConfig) -> Vec<SampleFrame> {
    let mut sink = RecordingSink::new();
    {
        let mut engine = StreamEngine::new(config);
        engine.begin(source, &mut sink).unwrap();
        while engine.is_running() {
            engine.advance();
        }
        assert_eq!(engine.stop_reason(), Some(StopReason::EndOfStream));
    }
    sink.frames
}

fn sine(len: usize, amplitude: f32) -> Vec<i16> {
    (0..len)
        .map(|i| {
            let t = i as f32 / 64.0;
            (amplitude * (t * 2.0 * std::f32::consts::PI).sin()) as i16
        })
        .collect()
}

#[test]
fn test_stereo_16bit_matches_hound_writer() {
    let samples = sine(2048, f32::from(i16::MAX));
    let wav = hound_wav_16(spec(2, 44100, 16), &samples);

    let frames = decode_all(MemorySource::new(wav), EngineConfig::default());

    assert_eq!(frames.len(), samples.len() / 2);
    for (frame, pair) in frames.iter().zip(samples.chunks(2)) {
        assert_eq!(frame.left, i32::from(pair[0]));
        assert_eq!(frame.right, i32::from(pair[1]));
    }
}

#[test]
fn test_mono_16bit_matches_hound_reader() {
    let samples = sine(1000, 12_000.0);
    let wav = hound_wav_16(spec(1, 22050, 16), &samples);

    let reference: Vec<i32> = WavReader::new(Cursor::new(wav.clone()))
        .unwrap()
        .samples::<i16>()
        .map(|s| i32::from(s.unwrap()))
        .collect();

    let frames = decode_all(
        MemorySource::new(wav).with_read_limit(13),
        EngineConfig::default().with_buffer_capacity(5),
    );

    let lefts: Vec<i32> = frames.iter().map(|f| f.left).collect();
    assert_eq!(lefts, reference);
    assert!(frames.iter().all(|f| f.right == 0));
}

#[test]
fn test_8bit_samples_are_unsigned_bytes() {
    let samples: Vec<i8> = (-128..=127).collect();
    let wav = hound_wav_8(spec(1, 8000, 8), &samples);

    let frames = decode_all(MemorySource::new(wav), EngineConfig::default());

    // hound stores signed 8-bit samples offset by 128
    let expected: Vec<SampleFrame> = samples
        .iter()
        .map(|&s| SampleFrame::new(i32::from(s) + 128, 0))
        .collect();
    assert_eq!(frames, expected);
}

#[test]
fn test_format_matches_hound_spec() {
    let wav = hound_wav_16(spec(2, 48000, 16), &[0; 64]);
    let reader_spec = WavReader::new(Cursor::new(wav.clone())).unwrap().spec();

    let mut sink = RecordingSink::new();
    let mut engine = StreamEngine::default();
    let format = engine.begin(MemorySource::new(wav), &mut sink).unwrap();

    assert_eq!(format.sample_rate, reader_spec.sample_rate);
    assert_eq!(format.bits_per_sample.bits(), reader_spec.bits_per_sample);
    assert_eq!(format.channels.count(), reader_spec.channels);
    assert_eq!(format.declared_frames(), 32);
}

#[test]
fn test_file_source_decodes_hound_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");

    let samples = sine(4096, 20_000.0);
    {
        let mut writer = WavWriter::create(&path, spec(2, 44100, 16)).unwrap();
        for &s in &samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    let source = FileSource::open_path(&path).unwrap();
    assert_eq!(
        source.size(),
        Some(std::fs::metadata(&path).unwrap().len() as u32)
    );

    let frames = decode_all(source, EngineConfig::default().with_buffer_capacity(512));
    assert_eq!(frames.len(), 2048);
    assert_eq!(frames[100], SampleFrame::new(i32::from(samples[200]), i32::from(samples[201])));
}

#[test]
fn test_file_source_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = FileSource::open_path(dir.path().join("missing.wav"));
    assert!(result.is_err());
}
