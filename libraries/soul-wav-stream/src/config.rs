//! Engine and source configuration
//!
//! Values come from defaults, an optional TOML file and `SOUL_WAV_`-prefixed
//! environment variables (nested keys separated by `__`, e.g.
//! `SOUL_WAV_ENGINE__BUFFER_CAPACITY=512`).

use crate::error::{Result, StreamError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for `StreamEngine`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Read-ahead buffer size in bytes (default: 128)
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Stop after the declared `data` chunk length (default: false)
    ///
    /// Live streams often declare a bogus length, so consumption is
    /// unbounded unless this is set.
    #[serde(default)]
    pub bound_to_data_chunk: bool,

    /// Maximum frames delivered per `advance` call (default: unbounded)
    #[serde(default)]
    pub frames_per_tick: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            bound_to_data_chunk: false,
            frames_per_tick: None,
        }
    }
}

impl EngineConfig {
    /// Use a read-ahead buffer of `capacity` bytes
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(StreamError::Config(
                "buffer_capacity must be at least 1 byte".to_string(),
            ));
        }
        if self.frames_per_tick == Some(0) {
            return Err(StreamError::Config(
                "frames_per_tick must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for `HttpStreamSource`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HttpSourceConfig {
    /// Body chunks buffered between download thread and decoder (default: 32)
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Sleep between polls while waiting for data (default: 1 ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// TCP connect timeout (default: none)
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,

    /// Time `open` waits for the response status line (default: 10 s)
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            poll_interval_ms: default_poll_interval_ms(),
            connect_timeout_ms: None,
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}

impl HttpSourceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(StreamError::Config(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.response_timeout_ms == 0 {
            return Err(StreamError::Config(
                "response_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration file layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StreamConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub http: HttpSourceConfig,
}

impl StreamConfig {
    /// Load configuration from an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(StreamError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            settings = settings.add_source(config::File::from(path));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("SOUL_WAV")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings
            .build()
            .map_err(|e| StreamError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| StreamError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        self.http.validate()
    }
}

// Default values
fn default_buffer_capacity() -> usize {
    128
}

fn default_channel_capacity() -> usize {
    32
}

fn default_poll_interval_ms() -> u64 {
    1
}

fn default_response_timeout_ms() -> u64 {
    10_000
}
