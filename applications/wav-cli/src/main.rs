//! soul-wav - decode a WAV file or HTTP stream through the streaming engine

mod sinks;

use anyhow::Context;
use clap::Parser;
use sinks::{MeterSink, Output, PacedSink, WavFileSink};
use soul_wav_stream::{
    ByteSource, FileSource, HttpStreamSource, SampleSink, Step, StopReason, StreamConfig,
    StreamEngine, StreamFormat,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Audio buffered ahead of the wall clock in `--realtime` mode
const REALTIME_LEAD: Duration = Duration::from_millis(250);

/// Sleep between ticks while the sink is full
const BACKPRESSURE_SLEEP: Duration = Duration::from_millis(2);

#[derive(Parser)]
#[command(name = "soul-wav")]
#[command(about = "Decode a PCM WAV file or HTTP stream", long_about = None)]
struct Cli {
    /// WAV file path or http(s) URL
    input: String,

    /// Write the decoded frames to this WAV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, env = "SOUL_WAV_CONFIG")]
    config: Option<PathBuf>,

    /// Read buffer size in bytes (overrides the configuration)
    #[arg(short, long)]
    buffer_size: Option<usize>,

    /// Deliver frames no faster than the stream's sample rate
    #[arg(long)]
    realtime: bool,
}

/// Outcome of one decode run
struct Summary {
    format: StreamFormat,
    reason: Option<StopReason>,
    wall_time: Duration,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soul_wav_stream=info,soul_wav=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = StreamConfig::load(cli.config.as_deref())?;
    if let Some(size) = cli.buffer_size {
        config.engine.buffer_capacity = size;
    }
    config.validate()?;

    let source = open_source(&cli.input, &config)?;

    let output = match &cli.output {
        Some(path) => Output::File(WavFileSink::new(path)),
        None => Output::Discard,
    };
    let meter = MeterSink::new(output);

    let meter = if cli.realtime {
        let mut sink = PacedSink::new(meter, REALTIME_LEAD);
        let summary = run(source, &config, &mut sink)?;
        let meter = sink.into_inner();
        print_summary(&summary, &meter);
        meter
    } else {
        let mut sink = meter;
        let summary = run(source, &config, &mut sink)?;
        print_summary(&summary, &sink);
        sink
    };

    if let Output::File(file) = meter.into_inner() {
        let path = file.path().to_path_buf();
        file.finalize()
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn open_source(input: &str, config: &StreamConfig) -> anyhow::Result<Box<dyn ByteSource>> {
    if input.starts_with("http://") || input.starts_with("https://") {
        let source = HttpStreamSource::connect(input, config.http.clone())
            .with_context(|| format!("Failed to open stream {}", input))?;
        Ok(Box::new(source))
    } else {
        let source = FileSource::open_path(input)
            .with_context(|| format!("Failed to open file {}", input))?;
        Ok(Box::new(source))
    }
}

/// Host loop: tick the engine until it stops, backing off while the sink is full
fn run(
    source: Box<dyn ByteSource>,
    config: &StreamConfig,
    sink: &mut dyn SampleSink,
) -> anyhow::Result<Summary> {
    let started = Instant::now();
    let mut engine = StreamEngine::new(config.engine.clone());
    let format = engine.begin(source, sink).context("Failed to start stream")?;

    while engine.is_running() {
        if let Step::Backpressure { .. } = engine.advance() {
            std::thread::sleep(BACKPRESSURE_SLEEP);
        }
    }

    Ok(Summary {
        format,
        reason: engine.stop_reason(),
        wall_time: started.elapsed(),
    })
}

fn print_summary<S: SampleSink>(summary: &Summary, meter: &MeterSink<S>) {
    let format = &summary.format;
    let frames = meter.frames();
    let peaks = meter.peaks();

    println!(
        "Format:   {} Hz, {}-bit, {} channel(s)",
        format.sample_rate,
        format.bits_per_sample.bits(),
        format.channels.count()
    );
    println!(
        "Frames:   {} ({:.2}s of audio, decoded in {:.2}s)",
        frames,
        format.frames_to_duration(frames).as_secs_f64(),
        summary.wall_time.as_secs_f64()
    );
    println!("Peaks:    L {:.3}  R {:.3}", peaks.left, peaks.right);
    match summary.reason {
        Some(StopReason::TruncatedFrame { bytes }) => {
            println!("Ended:    truncated final frame ({} byte(s) dropped)", bytes);
        }
        Some(reason) => println!("Ended:    {:?}", reason),
        None => println!("Ended:    unknown"),
    }
}
